//! Upgrade lifecycle for a Formica colony.
//!
//! [`UpgradeEngine`] is the façade UI collaborators call into. It owns one
//! colony's active upgrade set, keeps the cumulative effect record cached for
//! a fixed TTL, and notifies listeners with a [`VisualUpdate`] whenever an
//! upgrade is added or removed.
//!
//! ```text
//! purchase / add_upgrade ──► active set ──► invalidate ──► recompute
//!                                                      └─► VisualUpdate
//! ```
//!
//! The engine is single-threaded by construction: listeners are boxed
//! `FnMut` closures, so it is neither `Send` nor `Sync`.

pub mod config;
pub mod engine;
pub mod event;
pub mod serialize;

pub use config::EngineConfig;
pub use engine::{EngineError, UpgradeEngine};
pub use event::{
    SubscriberPriority, SubscriptionId, VisualFilter, VisualListener, VisualUpdate,
    VisualUpdateBus, VisualUpdateKind,
};
pub use serialize::{SnapshotError, UpgradeState};
