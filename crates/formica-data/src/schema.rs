//! Serde data file structs for technology definitions.
//!
//! These mirror the on-disk format and are converted into
//! [`TechnologyNode`](formica_tech_tree::TechnologyNode)s by the loader.
//! Values use plain `f64` so data files can write `20` or `1.2`.

use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::BTreeMap;

// ===========================================================================
// Technologies
// ===========================================================================

/// A technology definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct TechnologyData {
    pub id: String,
    /// Display name. Defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Category name, matched case-insensitively.
    pub category: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub cost: u32,
    #[serde(default)]
    pub effects: BTreeMap<String, EffectValueData>,
    #[serde(default)]
    pub visual_changes: BTreeMap<String, VisualValueData>,
}

/// An effect value. Anything that is not a bool, number, list of strings or
/// string lands in `Other` and is dropped at load.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EffectValueData {
    Flag(bool),
    Number(f64),
    List(Vec<String>),
    Text(String),
    Other(IgnoredAny),
}

/// A cosmetic value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VisualValueData {
    Flag(bool),
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

// ===========================================================================
// Tests
// ===========================================================================
