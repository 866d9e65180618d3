//! Tech tree definitions for the Formica colony upgrade engine.
//!
//! Holds the read-only technology catalog and the two pure evaluators that
//! run over it:
//!
//! - [`tiers`] resolves the prerequisite graph into display tiers and lays
//!   each tier out into evenly spaced slots.
//! - [`eligibility`] classifies a technology as unlocked, available,
//!   unaffordable or locked for a given unlocked set and points balance.
//!
//! # Overview
//!
//! A [`TechnologyNode`] carries its prerequisites, a point cost, a map of
//! gameplay [`EffectValue`]s and a map of cosmetic [`VisualValue`]s. Nodes are
//! registered into a [`TechCatalog`], which rejects duplicate ids but
//! deliberately tolerates malformed graphs: unknown prerequisite ids and
//! prerequisite cycles are resolved gracefully by the evaluators instead of
//! failing registration.

pub mod eligibility;
pub mod tiers;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use eligibility::{
    UnlockStatus, UnlockedSet, classify, classify_all, missing_prerequisites,
};
pub use tiers::{
    LayoutConfig, NodePlacement, Orientation, TierBucket, TierMap, compute_tiers,
    group_by_tier, layout_tiers,
};

use formica_core::fixed::Fixed64;
use formica_core::id::TechId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Evolution branch a technology belongs to. Used for grouping in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechCategory {
    Physical,
    Specialized,
    Environmental,
    Combat,
    Efficiency,
    /// A branch this build has no name for. Kept verbatim.
    Other(String),
}

impl TechCategory {
    /// Parse a category name case-insensitively. Unknown names become
    /// [`TechCategory::Other`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "physical" => TechCategory::Physical,
            "specialized" => TechCategory::Specialized,
            "environmental" => TechCategory::Environmental,
            "combat" => TechCategory::Combat,
            "efficiency" => TechCategory::Efficiency,
            _ => TechCategory::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TechCategory::Physical => "physical",
            TechCategory::Specialized => "specialized",
            TechCategory::Environmental => "environmental",
            TechCategory::Combat => "combat",
            TechCategory::Efficiency => "efficiency",
            TechCategory::Other(name) => name,
        }
    }
}

// ---------------------------------------------------------------------------
// Effect and visual values
// ---------------------------------------------------------------------------

/// The value stored under a gameplay effect key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectValue {
    /// An additive bonus (percent) or a multiplicative factor, depending on
    /// the key.
    Number(Fixed64),
    /// An ability flag. Only `true` under an `unlock_`/`enable_` key counts.
    Flag(bool),
    /// A list of ability names granted outright.
    List(Vec<String>),
    /// Any other shape. Carried so the catalog round-trips, never aggregated.
    Text(String),
}

/// The value stored under a cosmetic key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualValue {
    Number(Fixed64),
    Flag(bool),
    Text(String),
}

impl From<Fixed64> for EffectValue {
    fn from(v: Fixed64) -> Self {
        EffectValue::Number(v)
    }
}

impl From<bool> for EffectValue {
    fn from(v: bool) -> Self {
        EffectValue::Flag(v)
    }
}

impl From<Vec<String>> for EffectValue {
    fn from(v: Vec<String>) -> Self {
        EffectValue::List(v)
    }
}

impl From<Fixed64> for VisualValue {
    fn from(v: Fixed64) -> Self {
        VisualValue::Number(v)
    }
}

impl From<bool> for VisualValue {
    fn from(v: bool) -> Self {
        VisualValue::Flag(v)
    }
}

impl From<&str> for VisualValue {
    fn from(v: &str) -> Self {
        VisualValue::Text(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// Technology definition
// ---------------------------------------------------------------------------

/// A technology the colony can evolve. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyNode {
    /// Unique identifier.
    pub id: TechId,

    /// Display name.
    pub name: String,

    /// Flavour text shown in the tooltip.
    pub description: String,

    pub category: TechCategory,

    /// Technologies that must be unlocked before this one can be bought.
    pub prerequisites: Vec<TechId>,

    /// Evolution points required.
    pub cost: u32,

    /// Gameplay effects, keyed by effect name (e.g. `movement_speed_bonus`).
    pub effects: BTreeMap<String, EffectValue>,

    /// Cosmetic changes for the renderer (e.g. `mandible_size`).
    pub visual_changes: BTreeMap<String, VisualValue>,
}

impl TechnologyNode {
    /// Create a node with no prerequisites, effects or visuals. The name
    /// defaults to the id.
    pub fn new(id: impl Into<TechId>, category: TechCategory, cost: u32) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            description: String::new(),
            category,
            prerequisites: Vec::new(),
            cost,
            effects: BTreeMap::new(),
            visual_changes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_prerequisites<I, T>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TechId>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_effect(mut self, key: impl Into<String>, value: impl Into<EffectValue>) -> Self {
        self.effects.insert(key.into(), value.into());
        self
    }

    pub fn with_visual(mut self, key: impl Into<String>, value: impl Into<VisualValue>) -> Self {
        self.visual_changes.insert(key.into(), value.into());
        self
    }

    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisites.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum TechTreeError {
    #[error("duplicate technology id: {0}")]
    DuplicateId(TechId),
}

// ---------------------------------------------------------------------------
// TechCatalog
// ---------------------------------------------------------------------------

/// The full set of technology definitions for a game. Read-only after
/// loading; iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct TechCatalog {
    nodes: Vec<TechnologyNode>,
    index: HashMap<TechId, usize>,
}

impl TechCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from nodes in order. Fails on the first duplicate id.
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = TechnologyNode>,
    ) -> Result<Self, TechTreeError> {
        let mut catalog = Self::new();
        for node in nodes {
            catalog.register(node)?;
        }
        Ok(catalog)
    }

    /// Register a technology. Prerequisites are not validated here: a
    /// reference to an unknown id is a data problem the evaluators tolerate.
    pub fn register(&mut self, node: TechnologyNode) -> Result<(), TechTreeError> {
        if self.index.contains_key(&node.id) {
            return Err(TechTreeError::DuplicateId(node.id));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn get(&self, id: &TechId) -> Option<&TechnologyNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &TechId) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in registration order.
    pub fn nodes(&self) -> &[TechnologyNode] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechnologyNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes belonging to one category, in registration order.
    pub fn by_category<'a>(
        &'a self,
        category: &'a TechCategory,
    ) -> impl Iterator<Item = &'a TechnologyNode> + 'a {
        self.nodes.iter().filter(move |n| &n.category == category)
    }

    /// Every `(node, prerequisite)` pair whose prerequisite is not in the
    /// catalog.
    pub fn unknown_prerequisites(&self) -> Vec<(&TechId, &TechId)> {
        self.nodes
            .iter()
            .flat_map(|n| n.prerequisites.iter().map(move |p| (&n.id, p)))
            .filter(|(_, p)| !self.contains(p))
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
