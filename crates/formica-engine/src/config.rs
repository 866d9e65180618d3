use formica_core::clock::Millis;
use formica_effects::{EffectCache, ModifierConfig};
use serde::{Deserialize, Serialize};

/// Engine tuning. Every field has a default, so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a computed effect record stays valid, in milliseconds.
    pub cache_ttl_ms: Millis,
    pub modifiers: ModifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: EffectCache::DEFAULT_TTL_MS,
            modifiers: ModifierConfig::default(),
        }
    }
}
