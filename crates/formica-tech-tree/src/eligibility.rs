//! Purchase eligibility for technologies.
//!
//! [`classify`] answers one question for the UI: what state should this node
//! be drawn in, and may its purchase button be pressed? The checks run in a
//! fixed order and the first match wins, so a node that is both missing a
//! prerequisite and too expensive reports [`UnlockStatus::Locked`].

use crate::{TechCatalog, TechnologyNode};
use formica_core::id::TechId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// Eligibility of a single technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockStatus {
    /// Already owned.
    Unlocked,
    /// Prerequisites met and affordable.
    Available,
    /// Prerequisites met, not enough points.
    Unaffordable,
    /// At least one prerequisite is not unlocked.
    Locked,
}

impl UnlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UnlockStatus::Unlocked => "unlocked",
            UnlockStatus::Available => "available",
            UnlockStatus::Unaffordable => "unaffordable",
            UnlockStatus::Locked => "locked",
        }
    }

    /// Whether a purchase button for this state should be enabled.
    pub fn can_purchase(self) -> bool {
        self == UnlockStatus::Available
    }
}

impl fmt::Display for UnlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Unlocked-set abstraction
// ---------------------------------------------------------------------------

/// Anything that can answer "is this technology unlocked?". Lets callers pass
/// whatever collection they already hold.
pub trait UnlockedSet {
    fn contains_tech(&self, id: &TechId) -> bool;
}

impl UnlockedSet for HashSet<TechId> {
    fn contains_tech(&self, id: &TechId) -> bool {
        self.contains(id)
    }
}

impl UnlockedSet for BTreeSet<TechId> {
    fn contains_tech(&self, id: &TechId) -> bool {
        self.contains(id)
    }
}

impl<V> UnlockedSet for HashMap<TechId, V> {
    fn contains_tech(&self, id: &TechId) -> bool {
        self.contains_key(id)
    }
}

impl<V> UnlockedSet for BTreeMap<TechId, V> {
    fn contains_tech(&self, id: &TechId) -> bool {
        self.contains_key(id)
    }
}

impl UnlockedSet for [TechId] {
    fn contains_tech(&self, id: &TechId) -> bool {
        self.contains(id)
    }
}

impl UnlockedSet for Vec<TechId> {
    fn contains_tech(&self, id: &TechId) -> bool {
        self.as_slice().contains_tech(id)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify `node`. Pure: the result depends only on the three inputs.
///
/// A prerequisite id unknown to the catalog can never be in `unlocked`, so a
/// node naming one stays [`UnlockStatus::Locked`].
pub fn classify<S>(node: &TechnologyNode, unlocked: &S, points_balance: u32) -> UnlockStatus
where
    S: UnlockedSet + ?Sized,
{
    if unlocked.contains_tech(&node.id) {
        return UnlockStatus::Unlocked;
    }
    if !node.prerequisites.iter().all(|p| unlocked.contains_tech(p)) {
        return UnlockStatus::Locked;
    }
    if points_balance < node.cost {
        return UnlockStatus::Unaffordable;
    }
    UnlockStatus::Available
}

/// Classify every catalog node, in catalog order.
pub fn classify_all<S>(
    catalog: &TechCatalog,
    unlocked: &S,
    points_balance: u32,
) -> Vec<(TechId, UnlockStatus)>
where
    S: UnlockedSet + ?Sized,
{
    catalog
        .iter()
        .map(|node| (node.id.clone(), classify(node, unlocked, points_balance)))
        .collect()
}

/// Prerequisites of `node` that are not yet unlocked, in declaration order.
pub fn missing_prerequisites<'a, S>(node: &'a TechnologyNode, unlocked: &S) -> Vec<&'a TechId>
where
    S: UnlockedSet + ?Sized,
{
    node.prerequisites
        .iter()
        .filter(|p| !unlocked.contains_tech(p))
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
