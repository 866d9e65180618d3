use formica_core::fixed::{Fixed64, percent_to_multiplier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Additive fields
// ---------------------------------------------------------------------------

/// A named bonus that technologies add to. The effect key is the field name
/// on [`CumulativeEffects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdditiveField {
    CarryingCapacity,
    MovementSpeed,
    CombatStrength,
    Health,
    ForagingEfficiency,
    MiningEfficiency,
    WaterCollectionEfficiency,
    BuildingSpeed,
    ResearchSpeed,
    BirthRate,
    ColonyMorale,
    AttackDamage,
    Defense,
    EscapeChance,
    HeatResistance,
    ColdResistance,
    FloodResistance,
    DiseaseResistance,
}

impl AdditiveField {
    pub const ALL: [AdditiveField; 18] = [
        AdditiveField::CarryingCapacity,
        AdditiveField::MovementSpeed,
        AdditiveField::CombatStrength,
        AdditiveField::Health,
        AdditiveField::ForagingEfficiency,
        AdditiveField::MiningEfficiency,
        AdditiveField::WaterCollectionEfficiency,
        AdditiveField::BuildingSpeed,
        AdditiveField::ResearchSpeed,
        AdditiveField::BirthRate,
        AdditiveField::ColonyMorale,
        AdditiveField::AttackDamage,
        AdditiveField::Defense,
        AdditiveField::EscapeChance,
        AdditiveField::HeatResistance,
        AdditiveField::ColdResistance,
        AdditiveField::FloodResistance,
        AdditiveField::DiseaseResistance,
    ];

    /// The effect key technologies use for this field.
    pub fn key(self) -> &'static str {
        match self {
            AdditiveField::CarryingCapacity => "carrying_capacity_bonus",
            AdditiveField::MovementSpeed => "movement_speed_bonus",
            AdditiveField::CombatStrength => "combat_strength_bonus",
            AdditiveField::Health => "health_bonus",
            AdditiveField::ForagingEfficiency => "foraging_efficiency",
            AdditiveField::MiningEfficiency => "mining_efficiency",
            AdditiveField::WaterCollectionEfficiency => "water_collection_efficiency",
            AdditiveField::BuildingSpeed => "building_speed_bonus",
            AdditiveField::ResearchSpeed => "research_speed_bonus",
            AdditiveField::BirthRate => "birth_rate_bonus",
            AdditiveField::ColonyMorale => "colony_morale",
            AdditiveField::AttackDamage => "attack_damage_bonus",
            AdditiveField::Defense => "defense_bonus",
            AdditiveField::EscapeChance => "escape_chance_bonus",
            AdditiveField::HeatResistance => "heat_resistance",
            AdditiveField::ColdResistance => "cold_resistance",
            AdditiveField::FloodResistance => "flood_resistance",
            AdditiveField::DiseaseResistance => "disease_resistance",
        }
    }

    /// Look up a field by effect key. Exact, case-sensitive match.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

// ---------------------------------------------------------------------------
// CumulativeEffects
// ---------------------------------------------------------------------------

/// The combined effect of every active technology.
///
/// Derived data: always rebuildable from the active set, never persisted on
/// its own. Bonus fields are percentages (`20` means +20%).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CumulativeEffects {
    pub carrying_capacity_bonus: Fixed64,
    pub movement_speed_bonus: Fixed64,
    pub combat_strength_bonus: Fixed64,
    pub health_bonus: Fixed64,
    pub foraging_efficiency: Fixed64,
    pub mining_efficiency: Fixed64,
    pub water_collection_efficiency: Fixed64,
    pub building_speed_bonus: Fixed64,
    pub research_speed_bonus: Fixed64,
    pub birth_rate_bonus: Fixed64,
    pub colony_morale: Fixed64,
    pub attack_damage_bonus: Fixed64,
    pub defense_bonus: Fixed64,
    pub escape_chance_bonus: Fixed64,
    pub heat_resistance: Fixed64,
    pub cold_resistance: Fixed64,
    pub flood_resistance: Fixed64,
    pub disease_resistance: Fixed64,

    /// Multiplicative factors by effect key. Absent keys mean 1.
    pub multipliers: BTreeMap<String, Fixed64>,

    /// Ability names granted by flags and ability lists.
    pub special_abilities: BTreeSet<String>,
}

impl CumulativeEffects {
    /// An empty record: every bonus 0, no multipliers, no abilities.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bonus(&self, field: AdditiveField) -> Fixed64 {
        match field {
            AdditiveField::CarryingCapacity => self.carrying_capacity_bonus,
            AdditiveField::MovementSpeed => self.movement_speed_bonus,
            AdditiveField::CombatStrength => self.combat_strength_bonus,
            AdditiveField::Health => self.health_bonus,
            AdditiveField::ForagingEfficiency => self.foraging_efficiency,
            AdditiveField::MiningEfficiency => self.mining_efficiency,
            AdditiveField::WaterCollectionEfficiency => self.water_collection_efficiency,
            AdditiveField::BuildingSpeed => self.building_speed_bonus,
            AdditiveField::ResearchSpeed => self.research_speed_bonus,
            AdditiveField::BirthRate => self.birth_rate_bonus,
            AdditiveField::ColonyMorale => self.colony_morale,
            AdditiveField::AttackDamage => self.attack_damage_bonus,
            AdditiveField::Defense => self.defense_bonus,
            AdditiveField::EscapeChance => self.escape_chance_bonus,
            AdditiveField::HeatResistance => self.heat_resistance,
            AdditiveField::ColdResistance => self.cold_resistance,
            AdditiveField::FloodResistance => self.flood_resistance,
            AdditiveField::DiseaseResistance => self.disease_resistance,
        }
    }

    pub(crate) fn bonus_mut(&mut self, field: AdditiveField) -> &mut Fixed64 {
        match field {
            AdditiveField::CarryingCapacity => &mut self.carrying_capacity_bonus,
            AdditiveField::MovementSpeed => &mut self.movement_speed_bonus,
            AdditiveField::CombatStrength => &mut self.combat_strength_bonus,
            AdditiveField::Health => &mut self.health_bonus,
            AdditiveField::ForagingEfficiency => &mut self.foraging_efficiency,
            AdditiveField::MiningEfficiency => &mut self.mining_efficiency,
            AdditiveField::WaterCollectionEfficiency => &mut self.water_collection_efficiency,
            AdditiveField::BuildingSpeed => &mut self.building_speed_bonus,
            AdditiveField::ResearchSpeed => &mut self.research_speed_bonus,
            AdditiveField::BirthRate => &mut self.birth_rate_bonus,
            AdditiveField::ColonyMorale => &mut self.colony_morale,
            AdditiveField::AttackDamage => &mut self.attack_damage_bonus,
            AdditiveField::Defense => &mut self.defense_bonus,
            AdditiveField::EscapeChance => &mut self.escape_chance_bonus,
            AdditiveField::HeatResistance => &mut self.heat_resistance,
            AdditiveField::ColdResistance => &mut self.cold_resistance,
            AdditiveField::FloodResistance => &mut self.flood_resistance,
            AdditiveField::DiseaseResistance => &mut self.disease_resistance,
        }
    }

    /// The combined factor under `key`, or 1 when no technology touched it.
    pub fn multiplier(&self, key: &str) -> Fixed64 {
        self.multipliers.get(key).copied().unwrap_or(Fixed64::ONE)
    }

    pub fn has_special_ability(&self, name: &str) -> bool {
        self.special_abilities.contains(name)
    }

    /// `1 + research_speed_bonus / 100`.
    pub fn research_speed_modifier(&self) -> Fixed64 {
        percent_to_multiplier(self.research_speed_bonus)
    }

    /// `1 + colony_morale / 100`.
    pub fn colony_happiness_modifier(&self) -> Fixed64 {
        percent_to_multiplier(self.colony_morale)
    }
}
