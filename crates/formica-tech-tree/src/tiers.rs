//! Tier resolution and layout for the technology graph.
//!
//! A node's tier is its depth in the prerequisite graph: 0 without
//! prerequisites, otherwise one more than its deepest prerequisite. Tiers are
//! only used to arrange nodes on screen, so malformed graphs degrade instead
//! of failing:
//!
//! - A prerequisite id that is not among the resolved nodes counts as a tier-0
//!   dependency. The node that names it lands at tier 1.
//! - When a walk re-enters a node already on its own path (a prerequisite
//!   cycle), that occurrence resolves to tier 0 and the walk stops there. The
//!   resulting layout is degenerate but finite.
//!
//! Resolution is a depth-first walk with a per-path visited set. The tier of
//! a node on a given walk depends only on which members of its strongly
//! connected component are already on the path, so results are memoised on
//! that pair. Acyclic nodes are resolved once. Inside a prerequisite cycle of
//! `k` nodes the work grows with the path subsets of the cycle, up to
//! `k * 2^k` states, instead of with every simple path through it.

use crate::TechnologyNode;
use formica_core::id::TechId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Tier per technology id.
pub type TierMap = HashMap<TechId, u32>;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Compute the tier of every node in `nodes`. When an id appears twice the
/// last definition wins.
pub fn compute_tiers(nodes: &[TechnologyNode]) -> TierMap {
    let index: HashMap<&TechId, usize> =
        nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();
    let edges: Vec<Vec<Option<usize>>> = nodes
        .iter()
        .map(|n| n.prerequisites.iter().map(|p| index.get(p).copied()).collect())
        .collect();

    let mut resolver = TierResolver {
        nodes,
        components: Components::of(&edges),
        edges,
        on_path: vec![false; nodes.len()],
        memo: HashMap::with_capacity(nodes.len()),
    };

    let mut tiers = TierMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.get(&node.id) == Some(&i) {
            tiers.insert(node.id.clone(), resolver.resolve(i));
        }
    }
    tiers
}

struct TierResolver<'a> {
    nodes: &'a [TechnologyNode],
    /// Prerequisite indices per node; `None` for ids outside `nodes`.
    edges: Vec<Vec<Option<usize>>>,
    components: Components,
    on_path: Vec<bool>,
    /// Keyed by node and the members of its component on the current path.
    memo: HashMap<(usize, Vec<usize>), u32>,
}

impl TierResolver<'_> {
    fn resolve(&mut self, v: usize) -> u32 {
        let nodes = self.nodes;
        if self.on_path[v] {
            debug!(tech = %nodes[v].id, "prerequisite cycle, occurrence resolved at tier 0");
            return 0;
        }

        let key = (v, self.path_in_component(v));
        if let Some(&tier) = self.memo.get(&key) {
            return tier;
        }

        let tier = if self.edges[v].is_empty() {
            0
        } else {
            self.on_path[v] = true;
            let mut deepest = 0;
            for i in 0..self.edges[v].len() {
                let prereq = self.edges[v][i];
                let tier = match prereq {
                    Some(w) => self.resolve(w),
                    None => {
                        debug!(
                            tech = %nodes[v].prerequisites[i],
                            "unknown prerequisite resolved at tier 0"
                        );
                        0
                    }
                };
                deepest = deepest.max(tier);
            }
            self.on_path[v] = false;
            deepest.saturating_add(1)
        };

        self.memo.insert(key, tier);
        tier
    }

    /// Members of `v`'s component currently on the path, ascending. Only
    /// these can be reached again from `v`.
    fn path_in_component(&self, v: usize) -> Vec<usize> {
        self.components.members[self.components.component[v]]
            .iter()
            .copied()
            .filter(|&m| self.on_path[m])
            .collect()
    }
}

/// Strongly connected components of the prerequisite graph (Tarjan).
struct Components {
    component: Vec<usize>,
    /// Node indices per component, ascending.
    members: Vec<Vec<usize>>,
}

impl Components {
    fn of(edges: &[Vec<Option<usize>>]) -> Self {
        let n = edges.len();
        let mut tarjan = Tarjan {
            edges,
            next_index: 0,
            index: vec![None; n],
            lowlink: vec![0; n],
            stack: Vec::new(),
            on_stack: vec![false; n],
            components: Components {
                component: vec![0; n],
                members: Vec::new(),
            },
        };
        for v in 0..n {
            if tarjan.index[v].is_none() {
                tarjan.visit(v);
            }
        }
        tarjan.components
    }
}

struct Tarjan<'e> {
    edges: &'e [Vec<Option<usize>>],
    next_index: usize,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    components: Components,
}

impl Tarjan<'_> {
    fn visit(&mut self, v: usize) {
        let edges = self.edges;
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        for &w in edges[v].iter().flatten() {
            match self.index[w] {
                None => {
                    self.visit(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(iw) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(iw);
                }
                Some(_) => {}
            }
        }

        if self.index[v] == Some(self.lowlink[v]) {
            let id = self.components.members.len();
            let mut members = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                self.components.component[w] = id;
                members.push(w);
                if w == v {
                    break;
                }
            }
            members.sort_unstable();
            self.components.members.push(members);
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// All nodes sharing one tier, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBucket {
    pub tier: u32,
    pub ids: Vec<TechId>,
}

/// Bucket `nodes` by tier. Buckets are sorted by ascending tier and only
/// non-empty tiers appear. Nodes missing from `tiers` go to tier 0.
pub fn group_by_tier(nodes: &[TechnologyNode], tiers: &TierMap) -> Vec<TierBucket> {
    let mut buckets: Vec<TierBucket> = Vec::new();
    for node in nodes {
        let tier = tiers.get(&node.id).copied().unwrap_or(0);
        match buckets.iter_mut().find(|b| b.tier == tier) {
            Some(bucket) => bucket.ids.push(node.id.clone()),
            None => buckets.push(TierBucket {
                tier,
                ids: vec![node.id.clone()],
            }),
        }
    }
    buckets.sort_by_key(|b| b.tier);
    buckets
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Which screen axis tiers advance along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Tiers are columns, advancing left to right.
    #[default]
    Horizontal,
    /// Tiers are rows, advancing top to bottom.
    Vertical,
}

/// Grid spacing for [`layout_tiers`], in renderer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Distance between consecutive tiers.
    pub tier_spacing: u32,
    /// Distance between consecutive slots within one tier.
    pub slot_spacing: u32,
    pub orientation: Orientation,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tier_spacing: 200,
            slot_spacing: 120,
            orientation: Orientation::Horizontal,
        }
    }
}

/// Where one node sits in the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePlacement {
    pub id: TechId,
    pub tier: u32,
    /// Index within the tier bucket.
    pub slot: u32,
    pub x: u32,
    pub y: u32,
}

/// Assign one evenly spaced slot per node within its tier. Shorter tiers are
/// centred against the longest one. Placements come out bucket by bucket, in
/// bucket order.
pub fn layout_tiers(buckets: &[TierBucket], config: &LayoutConfig) -> Vec<NodePlacement> {
    let widest = buckets.iter().map(|b| b.ids.len()).max().unwrap_or(0) as u32;

    let mut placements = Vec::with_capacity(buckets.iter().map(|b| b.ids.len()).sum());
    for bucket in buckets {
        let len = bucket.ids.len() as u32;
        let offset = (widest - len).saturating_mul(config.slot_spacing) / 2;
        let along_tier = bucket.tier.saturating_mul(config.tier_spacing);

        for (slot, id) in bucket.ids.iter().enumerate() {
            let slot = slot as u32;
            let across = offset.saturating_add(slot.saturating_mul(config.slot_spacing));
            let (x, y) = match config.orientation {
                Orientation::Horizontal => (along_tier, across),
                Orientation::Vertical => (across, along_tier),
            };
            placements.push(NodePlacement {
                id: id.clone(),
                tier: bucket.tier,
                slot,
                x,
                y,
            });
        }
    }
    placements
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn tier_of(tiers: &TierMap, id: &str) -> u32 {
        tiers[&TechId::from(id)]
    }

    // -----------------------------------------------------------------------
    // compute_tiers
    // -----------------------------------------------------------------------

    #[test]
    fn roots_are_tier_zero() {
        let nodes = vec![tech("A", 1, &[]), tech("B", 1, &[])];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tier_of(&tiers, "A"), 0);
        assert_eq!(tier_of(&tiers, "B"), 0);
    }

    #[test]
    fn tier_is_one_past_deepest_prerequisite() {
        // A -> B -> C, and D needs both A and C.
        let nodes = vec![
            tech("D", 1, &["A", "C"]),
            tech("A", 1, &[]),
            tech("B", 1, &["A"]),
            tech("C", 1, &["B"]),
        ];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tier_of(&tiers, "A"), 0);
        assert_eq!(tier_of(&tiers, "B"), 1);
        assert_eq!(tier_of(&tiers, "C"), 2);
        assert_eq!(tier_of(&tiers, "D"), 3);
    }

    #[test]
    fn two_node_cycle_terminates_with_finite_tiers() {
        let nodes = vec![tech("A", 1, &["B"]), tech("B", 1, &["A"])];
        let tiers = compute_tiers(&nodes);
        // Entering at A: A -> B -> (A again = 0), so B = 1, A = 2.
        assert_eq!(tier_of(&tiers, "A"), 2);
        // Entering at B mirrors it.
        assert_eq!(tier_of(&tiers, "B"), 2);
    }

    #[test]
    fn self_reference_degrades_to_tier_one() {
        let nodes = vec![tech("A", 1, &["A"])];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tier_of(&tiers, "A"), 1);
    }

    #[test]
    fn unknown_prerequisite_counts_as_tier_zero() {
        let nodes = vec![tech("A", 1, &["ghost"]), tech("B", 1, &["A"])];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tier_of(&tiers, "A"), 1);
        assert_eq!(tier_of(&tiers, "B"), 2);
        assert!(!tiers.contains_key(&TechId::from("ghost")));
    }

    #[test]
    fn node_downstream_of_cycle_still_resolves() {
        // A <-> B, C needs A.
        let nodes = vec![
            tech("A", 1, &["B"]),
            tech("B", 1, &["A"]),
            tech("C", 1, &["A"]),
        ];
        let tiers = compute_tiers(&nodes);
        // C -> A -> B -> (A again = 0): B = 1, A = 2, C = 3.
        assert_eq!(tier_of(&tiers, "C"), 3);
    }

    #[test]
    fn fully_connected_cycle_resolves_quickly() {
        // Every node needs every other node: 12! simple paths, but only the
        // path subsets of one component are explored.
        let ids: Vec<String> = (0..12).map(|i| format!("n{i}")).collect();
        let nodes: Vec<TechnologyNode> = ids
            .iter()
            .map(|id| {
                let others: Vec<&str> =
                    ids.iter().filter(|o| *o != id).map(String::as_str).collect();
                tech(id, 1, &others)
            })
            .collect();
        let tiers = compute_tiers(&nodes);
        // The deepest walk visits all twelve nodes; the last one sees only
        // path members and sits at tier 1.
        for id in &ids {
            assert_eq!(tier_of(&tiers, id), 12);
        }
    }

    #[test]
    fn cycle_members_depend_on_entry_point() {
        // A -> B -> C -> A, and D -> B. Entering at D, B's walk is the same
        // as entering the cycle at B.
        let nodes = vec![
            tech("A", 1, &["B"]),
            tech("B", 1, &["C"]),
            tech("C", 1, &["A"]),
            tech("D", 1, &["B"]),
        ];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tier_of(&tiers, "A"), 3);
        assert_eq!(tier_of(&tiers, "B"), 3);
        assert_eq!(tier_of(&tiers, "C"), 3);
        assert_eq!(tier_of(&tiers, "D"), 4);
    }

    #[test]
    fn duplicate_ids_use_the_last_definition() {
        let nodes = vec![tech("A", 1, &[]), tech("B", 1, &[]), tech("A", 1, &["B"])];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tiers.len(), 2);
        assert_eq!(tier_of(&tiers, "A"), 1);
    }

    #[test]
    fn shared_prerequisites_are_memoised_consistently() {
        // Diamond: A -> {B, C} -> D
        let nodes = vec![
            tech("A", 1, &[]),
            tech("B", 1, &["A"]),
            tech("C", 1, &["A"]),
            tech("D", 1, &["B", "C"]),
        ];
        let tiers = compute_tiers(&nodes);
        assert_eq!(tier_of(&tiers, "B"), tier_of(&tiers, "C"));
        assert_eq!(tier_of(&tiers, "D"), 2);
    }

    // -----------------------------------------------------------------------
    // group_by_tier / layout_tiers
    // -----------------------------------------------------------------------

    #[test]
    fn grouping_keeps_input_order_within_tier() {
        let catalog = sample_catalog();
        let tiers = compute_tiers(catalog.nodes());
        let buckets = group_by_tier(catalog.nodes(), &tiers);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].tier, 0);
        let tier0: Vec<&str> = buckets[0].ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(tier0, vec!["T1", "swift_legs", "thick_carapace"]);
        let tier1: Vec<&str> = buckets[1].ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(tier1, vec!["T2", "trail_pheromones"]);
        assert_eq!(buckets[2].ids, vec![TechId::from("forager_caste")]);
    }

    #[test]
    fn layout_spaces_slots_evenly_and_centres_short_tiers() {
        let buckets = vec![
            TierBucket {
                tier: 0,
                ids: vec![TechId::from("a"), TechId::from("b"), TechId::from("c")],
            },
            TierBucket {
                tier: 1,
                ids: vec![TechId::from("d")],
            },
        ];
        let config = LayoutConfig {
            tier_spacing: 100,
            slot_spacing: 50,
            orientation: Orientation::Horizontal,
        };
        let placements = layout_tiers(&buckets, &config);

        assert_eq!(placements.len(), 4);
        let ys: Vec<u32> = placements[..3].iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0, 50, 100]);
        assert!(placements[..3].iter().all(|p| p.x == 0));

        let d = &placements[3];
        assert_eq!((d.x, d.y, d.slot), (100, 50, 0));
    }

    #[test]
    fn vertical_layout_swaps_axes() {
        let buckets = vec![TierBucket {
            tier: 2,
            ids: vec![TechId::from("a"), TechId::from("b")],
        }];
        let config = LayoutConfig {
            orientation: Orientation::Vertical,
            ..LayoutConfig::default()
        };
        let placements = layout_tiers(&buckets, &config);
        assert_eq!((placements[0].x, placements[0].y), (0, 400));
        assert_eq!((placements[1].x, placements[1].y), (120, 400));
    }

    #[test]
    fn layout_of_nothing_is_empty() {
        assert!(layout_tiers(&[], &LayoutConfig::default()).is_empty());
    }
}
