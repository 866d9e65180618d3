//! Formica Core -- shared building blocks for the colony upgrade engine.
//!
//! Every other `formica-*` crate depends on this one for:
//!
//! - [`id`] -- string-backed identifiers for technologies and colonies.
//! - [`fixed`] -- Q32.32 fixed-point math used for every bonus, multiplier,
//!   speed and rate, so that effect aggregation is deterministic.
//! - [`clock`] -- millisecond wall clock abstraction driving the effect
//!   cache TTL, with a manual clock for tests and replays.

pub mod clock;
pub mod fixed;
pub mod id;
