//! Applying a [`CumulativeEffects`] record to game attributes.
//!
//! Every helper is a pure function of the record and its input. Integral
//! attributes (capacities, health, strength, durations) are floored after
//! scaling; speeds, rates and escape chance stay fractional.

use crate::record::{AdditiveField, CumulativeEffects};
use formica_core::fixed::{
    Fixed64, divide_count_by_percent, scale_by_percent, scale_count_by_percent,
};
use serde::{Deserialize, Serialize};

/// Multiplier key applied on top of every resource rate.
pub const EFFICIENCY_MULTIPLIER: &str = "efficiency_multiplier";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Caps and floors for the attribute helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    /// Movement speed never exceeds this many times its base value.
    pub max_speed_multiplier: u32,
    /// Escape chance (percent) never exceeds this.
    pub escape_chance_cap: u32,
    /// Shortest construction duration, in game time units.
    pub min_construction_duration: u64,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            max_speed_multiplier: 10,
            escape_chance_cap: 95,
            min_construction_duration: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Ant attributes
// ---------------------------------------------------------------------------

/// Per-ant stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntAttributes {
    pub carrying_capacity: u32,
    pub movement_speed: Fixed64,
    pub max_health: u32,
    pub health: u32,
    pub combat_strength: u32,
}

/// Scale an ant's stats by the record's bonuses. Speed is capped relative to
/// its base; current health is clamped to the new maximum.
pub fn apply_ant_modifiers(
    effects: &CumulativeEffects,
    base: &AntAttributes,
    config: &ModifierConfig,
) -> AntAttributes {
    let speed_cap = base
        .movement_speed
        .saturating_mul(Fixed64::saturating_from_num(config.max_speed_multiplier));
    let movement_speed =
        scale_by_percent(base.movement_speed, effects.movement_speed_bonus).min(speed_cap);

    let max_health = scale_u32(base.max_health, effects.health_bonus);

    AntAttributes {
        carrying_capacity: scale_u32(base.carrying_capacity, effects.carrying_capacity_bonus),
        movement_speed,
        max_health,
        health: base.health.min(max_health),
        combat_strength: scale_u32(base.combat_strength, effects.combat_strength_bonus),
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A collectable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Wood,
    Water,
    Materials,
    Stone,
}

impl ResourceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "food" => Some(ResourceKind::Food),
            "wood" => Some(ResourceKind::Wood),
            "water" => Some(ResourceKind::Water),
            "materials" => Some(ResourceKind::Materials),
            "stone" => Some(ResourceKind::Stone),
            _ => None,
        }
    }

    /// The efficiency bonus that speeds up collecting this resource.
    pub fn bonus_field(self) -> AdditiveField {
        match self {
            ResourceKind::Food | ResourceKind::Wood => AdditiveField::ForagingEfficiency,
            ResourceKind::Water => AdditiveField::WaterCollectionEfficiency,
            ResourceKind::Materials | ResourceKind::Stone => AdditiveField::MiningEfficiency,
        }
    }
}

/// Scale a collection rate by the resource's efficiency bonus, then by the
/// `efficiency_multiplier` if any technology set one.
pub fn apply_resource_modifiers(
    effects: &CumulativeEffects,
    kind: ResourceKind,
    rate: Fixed64,
) -> Fixed64 {
    let rate = scale_by_percent(rate, effects.bonus(kind.bonus_field()));
    match effects.multipliers.get(EFFICIENCY_MULTIPLIER) {
        Some(m) => rate.saturating_mul(*m),
        None => rate,
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// `floor(base / (1 + building_speed_bonus / 100))`, never below the
/// configured minimum. A bonus of -100% or lower leaves the base unchanged.
pub fn apply_construction_modifiers(
    effects: &CumulativeEffects,
    base_duration: u64,
    config: &ModifierConfig,
) -> u64 {
    let duration = divide_count_by_percent(base_duration, effects.building_speed_bonus)
        .unwrap_or(base_duration);
    duration.max(config.min_construction_duration)
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Stats used when ants fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack_damage: u32,
    pub defense: u32,
    /// Percent chance to flee a fight.
    pub escape_chance: Fixed64,
}

/// Scale attack and defense; add the escape bonus, capped.
pub fn apply_combat_modifiers(
    effects: &CumulativeEffects,
    base: &CombatStats,
    config: &ModifierConfig,
) -> CombatStats {
    let cap = Fixed64::saturating_from_num(config.escape_chance_cap);
    CombatStats {
        attack_damage: scale_u32(base.attack_damage, effects.attack_damage_bonus),
        defense: scale_u32(base.defense, effects.defense_bonus),
        escape_chance: base
            .escape_chance
            .saturating_add(effects.escape_chance_bonus)
            .min(cap),
    }
}

fn scale_u32(value: u32, percent: Fixed64) -> u32 {
    u32::try_from(scale_count_by_percent(u64::from(value), percent)).unwrap_or(u32::MAX)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use formica_tech_tree::test_utils::*;

    fn worker() -> AntAttributes {
        AntAttributes {
            carrying_capacity: 10,
            movement_speed: Fixed64::ONE,
            max_health: 100,
            health: 100,
            combat_strength: 8,
        }
    }

    fn close(a: Fixed64, b: f64) -> bool {
        (a - fixed(b)).abs() < fixed(0.0001)
    }

    // -----------------------------------------------------------------------
    // Ants
    // -----------------------------------------------------------------------

    #[test]
    fn two_speed_bonuses_give_forty_percent() {
        let a = tech("A", 1, &[]).with_effect("movement_speed_bonus", fixed(20.0));
        let b = tech("B", 1, &[]).with_effect("movement_speed_bonus", fixed(20.0));
        let effects = aggregate([&a, &b]);

        let ant = apply_ant_modifiers(&effects, &worker(), &ModifierConfig::default());
        assert!(close(ant.movement_speed, 1.4));
    }

    #[test]
    fn speed_capped_at_ten_times_base() {
        let effects = CumulativeEffects {
            movement_speed_bonus: fixed(5_000.0),
            ..CumulativeEffects::default()
        };
        let ant = apply_ant_modifiers(&effects, &worker(), &ModifierConfig::default());
        assert_eq!(ant.movement_speed, fixed(10.0));
    }

    #[test]
    fn integral_stats_are_floored() {
        let effects = CumulativeEffects {
            carrying_capacity_bonus: fixed(25.0),
            combat_strength_bonus: fixed(30.0),
            ..CumulativeEffects::default()
        };
        let ant = apply_ant_modifiers(&effects, &worker(), &ModifierConfig::default());
        // 10 * 1.25 = 12.5 -> 12, 8 * 1.3 = 10.4 -> 10
        assert_eq!(ant.carrying_capacity, 12);
        assert_eq!(ant.combat_strength, 10);
    }

    #[test]
    fn current_health_clamped_to_new_max() {
        let effects = CumulativeEffects {
            health_bonus: fixed(-50.0),
            ..CumulativeEffects::default()
        };
        let ant = apply_ant_modifiers(&effects, &worker(), &ModifierConfig::default());
        assert_eq!(ant.max_health, 50);
        assert_eq!(ant.health, 50);

        let boosted = CumulativeEffects {
            health_bonus: fixed(20.0),
            ..CumulativeEffects::default()
        };
        let wounded = AntAttributes {
            health: 40,
            ..worker()
        };
        let ant = apply_ant_modifiers(&boosted, &wounded, &ModifierConfig::default());
        assert_eq!(ant.max_health, 120);
        assert_eq!(ant.health, 40);
    }

    #[test]
    fn large_integral_stats_scale_exactly() {
        let effects = CumulativeEffects {
            carrying_capacity_bonus: fixed(50.0),
            ..CumulativeEffects::default()
        };
        let hauler = AntAttributes {
            carrying_capacity: 3_000_000_000,
            ..worker()
        };
        let ant = apply_ant_modifiers(&effects, &hauler, &ModifierConfig::default());
        assert_eq!(ant.carrying_capacity, u32::MAX);

        let colony_store = AntAttributes {
            carrying_capacity: 40_000_000,
            ..worker()
        };
        let ant = apply_ant_modifiers(&effects, &colony_store, &ModifierConfig::default());
        assert_eq!(ant.carrying_capacity, 60_000_000);
    }

    #[test]
    fn neutral_record_leaves_ant_unchanged() {
        let ant = apply_ant_modifiers(
            &CumulativeEffects::new(),
            &worker(),
            &ModifierConfig::default(),
        );
        assert_eq!(ant, worker());
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    #[test]
    fn resource_kinds_map_to_their_bonus() {
        let effects = CumulativeEffects {
            foraging_efficiency: fixed(50.0),
            water_collection_efficiency: fixed(100.0),
            mining_efficiency: fixed(-50.0),
            ..CumulativeEffects::default()
        };
        let rate = fixed(2.0);
        assert_eq!(apply_resource_modifiers(&effects, ResourceKind::Food, rate), fixed(3.0));
        assert_eq!(apply_resource_modifiers(&effects, ResourceKind::Wood, rate), fixed(3.0));
        assert_eq!(apply_resource_modifiers(&effects, ResourceKind::Water, rate), fixed(4.0));
        assert_eq!(apply_resource_modifiers(&effects, ResourceKind::Stone, rate), fixed(1.0));
        assert_eq!(
            apply_resource_modifiers(&effects, ResourceKind::Materials, rate),
            fixed(1.0)
        );
    }

    #[test]
    fn efficiency_multiplier_applies_after_bonus() {
        let a = tech("A", 1, &[]).with_effect("efficiency_multiplier", fixed(1.2));
        let b = tech("B", 1, &[]).with_effect("efficiency_multiplier", fixed(1.2));
        let effects = aggregate([&a, &b]);

        let rate = apply_resource_modifiers(&effects, ResourceKind::Food, fixed(10.0));
        assert!(close(rate, 14.4));
    }

    #[test]
    fn large_rates_are_not_clamped() {
        let rate = fixed(25_000_000.0);
        assert_eq!(
            apply_resource_modifiers(&CumulativeEffects::new(), ResourceKind::Food, rate),
            rate
        );
        let effects = CumulativeEffects {
            foraging_efficiency: fixed(20.0),
            ..CumulativeEffects::default()
        };
        assert_eq!(
            apply_resource_modifiers(&effects, ResourceKind::Wood, rate),
            fixed(30_000_000.0)
        );
    }

    #[test]
    fn resource_names_parse() {
        assert_eq!(ResourceKind::from_name("water"), Some(ResourceKind::Water));
        assert_eq!(ResourceKind::from_name("honeydew"), None);
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn construction_divides_and_floors() {
        let effects = CumulativeEffects {
            building_speed_bonus: fixed(50.0),
            ..CumulativeEffects::default()
        };
        let config = ModifierConfig::default();
        // 100 / 1.5 = 66.67 -> 66
        assert_eq!(apply_construction_modifiers(&effects, 100, &config), 66);
        assert_eq!(apply_construction_modifiers(&CumulativeEffects::new(), 100, &config), 100);
    }

    #[test]
    fn long_durations_keep_their_precision() {
        let config = ModifierConfig::default();
        let neutral = CumulativeEffects::new();
        assert_eq!(apply_construction_modifiers(&neutral, 30_000_000, &config), 30_000_000);

        let effects = CumulativeEffects {
            building_speed_bonus: fixed(50.0),
            ..CumulativeEffects::default()
        };
        assert_eq!(
            apply_construction_modifiers(&effects, 9_000_000_000, &config),
            6_000_000_000
        );
    }

    #[test]
    fn construction_never_below_minimum() {
        let effects = CumulativeEffects {
            building_speed_bonus: fixed(10_000.0),
            ..CumulativeEffects::default()
        };
        let config = ModifierConfig::default();
        assert_eq!(apply_construction_modifiers(&effects, 5, &config), 1);
        assert_eq!(apply_construction_modifiers(&CumulativeEffects::new(), 0, &config), 1);
    }

    #[test]
    fn construction_ignores_non_positive_divisor() {
        let effects = CumulativeEffects {
            building_speed_bonus: fixed(-100.0),
            ..CumulativeEffects::default()
        };
        let config = ModifierConfig::default();
        assert_eq!(apply_construction_modifiers(&effects, 40, &config), 40);
    }

    // -----------------------------------------------------------------------
    // Combat
    // -----------------------------------------------------------------------

    #[test]
    fn combat_scales_and_caps_escape() {
        let effects = CumulativeEffects {
            attack_damage_bonus: fixed(50.0),
            defense_bonus: fixed(25.0),
            escape_chance_bonus: fixed(90.0),
            ..CumulativeEffects::default()
        };
        let base = CombatStats {
            attack_damage: 15,
            defense: 10,
            escape_chance: fixed(10.0),
        };
        let stats = apply_combat_modifiers(&effects, &base, &ModifierConfig::default());
        assert_eq!(stats.attack_damage, 22);
        assert_eq!(stats.defense, 12);
        assert_eq!(stats.escape_chance, fixed(95.0));
    }

    #[test]
    fn escape_chance_is_additive_below_cap() {
        let effects = CumulativeEffects {
            escape_chance_bonus: fixed(5.0),
            ..CumulativeEffects::default()
        };
        let base = CombatStats {
            attack_damage: 1,
            defense: 1,
            escape_chance: fixed(20.0),
        };
        let stats = apply_combat_modifiers(&effects, &base, &ModifierConfig::default());
        assert_eq!(stats.escape_chance, fixed(25.0));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ModifierConfig = serde_json::from_str(r#"{"escape_chance_cap": 80}"#).unwrap();
        assert_eq!(config.escape_chance_cap, 80);
        assert_eq!(config.max_speed_multiplier, 10);
        assert_eq!(config.min_construction_duration, 1);
    }
}
