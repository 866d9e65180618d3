//! Folding active technologies into a [`CumulativeEffects`] record, and the
//! time-limited cache that sits in front of it.

use crate::record::{AdditiveField, CumulativeEffects};
use formica_core::clock::Millis;
use formica_core::fixed::Fixed64;
use formica_tech_tree::{EffectValue, TechnologyNode};
use tracing::trace;

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Combine the effects of `nodes`. Order does not matter: sums, products and
/// sets are all order-independent.
pub fn aggregate<'a>(nodes: impl IntoIterator<Item = &'a TechnologyNode>) -> CumulativeEffects {
    let mut effects = CumulativeEffects::new();
    for node in nodes {
        for (key, value) in &node.effects {
            apply_effect(&mut effects, key, value);
        }
    }
    effects
}

fn apply_effect(effects: &mut CumulativeEffects, key: &str, value: &EffectValue) {
    match value {
        EffectValue::Number(n) => {
            if let Some(field) = AdditiveField::from_key(key) {
                let slot = effects.bonus_mut(field);
                *slot = slot.saturating_add(*n);
            } else if key.contains("multiplier") {
                let slot = effects
                    .multipliers
                    .entry(key.to_string())
                    .or_insert(Fixed64::ONE);
                *slot = slot.saturating_mul(*n);
            } else {
                trace!(key, "ignoring numeric effect with unrecognised key");
            }
        }
        EffectValue::Flag(true) if key.starts_with("unlock_") || key.starts_with("enable_") => {
            effects.special_abilities.insert(key.to_string());
        }
        EffectValue::List(names) => {
            effects.special_abilities.extend(names.iter().cloned());
        }
        _ => trace!(key, "ignoring effect value of unsupported shape"),
    }
}

// ---------------------------------------------------------------------------
// EffectCache
// ---------------------------------------------------------------------------

/// A computed record and the time it was computed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEffects {
    pub effects: CumulativeEffects,
    pub computed_at: Millis,
}

/// Holds the last computed record for a fixed time-to-live.
///
/// A read within the TTL of the last computation returns the stored record.
/// A read after it recomputes. [`invalidate`](Self::invalidate) drops the
/// record immediately, whatever the timer says.
#[derive(Debug, Clone)]
pub struct EffectCache {
    entry: Option<CachedEffects>,
    ttl_ms: Millis,
}

impl EffectCache {
    pub const DEFAULT_TTL_MS: Millis = 30_000;

    pub fn new(ttl_ms: Millis) -> Self {
        Self { entry: None, ttl_ms }
    }

    pub fn ttl_ms(&self) -> Millis {
        self.ttl_ms
    }

    /// Whether a stored record exists and is younger than the TTL at `now`.
    pub fn is_fresh(&self, now: Millis) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|c| now.saturating_sub(c.computed_at) < self.ttl_ms)
    }

    /// The stored record, if still fresh at `now`.
    pub fn get(&self, now: Millis) -> Option<&CumulativeEffects> {
        if self.is_fresh(now) {
            self.entry.as_ref().map(|c| &c.effects)
        } else {
            None
        }
    }

    /// Store a freshly computed record.
    pub fn store(&mut self, effects: CumulativeEffects, now: Millis) -> &CumulativeEffects {
        &self
            .entry
            .insert(CachedEffects {
                effects,
                computed_at: now,
            })
            .effects
    }

    /// The stored record if fresh, otherwise the result of `compute`, which
    /// is stored before being returned.
    pub fn get_or_recompute(
        &mut self,
        now: Millis,
        compute: impl FnOnce() -> CumulativeEffects,
    ) -> &CumulativeEffects {
        if !self.is_fresh(now) {
            trace!(now, "effect cache stale, recomputing");
            self.entry = None;
        }
        &self
            .entry
            .get_or_insert_with(|| CachedEffects {
                effects: compute(),
                computed_at: now,
            })
            .effects
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// When the stored record was computed, fresh or not.
    pub fn computed_at(&self) -> Option<Millis> {
        self.entry.as_ref().map(|c| c.computed_at)
    }
}

impl Default for EffectCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL_MS)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
