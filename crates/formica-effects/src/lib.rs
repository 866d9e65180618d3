//! Effect aggregation for the Formica colony upgrade engine.
//!
//! Folds the effects of every active technology into one
//! [`CumulativeEffects`] record and applies that record to game attributes.
//!
//! # Combination rules
//!
//! For each `(key, value)` in a node's effects:
//!
//! - A number under a known bonus key (see [`AdditiveField`]) is summed.
//! - Otherwise a number under a key containing `"multiplier"` is multiplied
//!   into [`CumulativeEffects::multipliers`], starting from 1.
//! - Otherwise `true` under a key starting with `unlock_` or `enable_` adds
//!   the key itself as a special ability.
//! - Otherwise a list adds each element as a special ability.
//! - Anything else is ignored.
//!
//! # Usage
//!
//! ```ignore
//! let mut cache = EffectCache::new(EffectCache::DEFAULT_TTL_MS);
//! let effects = cache.get_or_recompute(clock.now_millis(), || aggregate(active.values()));
//! let ant = apply_ant_modifiers(effects, &base_ant, &ModifierConfig::default());
//! ```
//!
//! The cosmetic side of a node (`visual_changes`) is composed separately by
//! [`visual::compose_visuals`] and never reaches the gameplay record.

pub mod aggregate;
pub mod modifiers;
pub mod record;
pub mod visual;

pub use aggregate::{CachedEffects, EffectCache, aggregate};
pub use modifiers::{
    AntAttributes, CombatStats, ModifierConfig, ResourceKind, apply_ant_modifiers,
    apply_combat_modifiers, apply_construction_modifiers, apply_resource_modifiers,
};
pub use record::{AdditiveField, CumulativeEffects};
pub use visual::{VisualDeltas, compose_visuals};
