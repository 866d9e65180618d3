//! Cosmetic deltas for rendering collaborators.
//!
//! Composition is display-only. Nothing here feeds back into
//! [`aggregate`](crate::aggregate::aggregate).

use formica_tech_tree::{TechnologyNode, VisualValue};
use std::collections::BTreeMap;

/// Composed cosmetic values by key.
pub type VisualDeltas = BTreeMap<String, VisualValue>;

/// Combine `visual_changes` across `nodes`, in iteration order.
///
/// Numbers multiply starting at 1. Flags OR starting at false. Text, and any
/// value whose type differs from what is already stored, is replaced by the
/// later node's value.
pub fn compose_visuals<'a>(nodes: impl IntoIterator<Item = &'a TechnologyNode>) -> VisualDeltas {
    let mut composed = VisualDeltas::new();
    for node in nodes {
        for (key, value) in &node.visual_changes {
            let combined = match (composed.remove(key), value) {
                (Some(VisualValue::Number(acc)), VisualValue::Number(n)) => {
                    VisualValue::Number(acc.saturating_mul(*n))
                }
                (Some(VisualValue::Flag(acc)), VisualValue::Flag(b)) => {
                    VisualValue::Flag(acc || *b)
                }
                // First contribution: 1 * n and false || b are the value itself.
                (_, other) => other.clone(),
            };
            composed.insert(key.clone(), combined);
        }
    }
    composed
}
