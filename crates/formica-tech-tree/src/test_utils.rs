//! Shared catalog builders for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::{TechCatalog, TechCategory, TechnologyNode};
use formica_core::fixed::{Fixed64, f64_to_fixed64};

pub fn fixed(v: f64) -> Fixed64 {
    f64_to_fixed64(v)
}

/// A physical-branch node with the given cost and prerequisites.
pub fn tech(id: &str, cost: u32, prerequisites: &[&str]) -> TechnologyNode {
    TechnologyNode::new(id, TechCategory::Physical, cost)
        .with_prerequisites(prerequisites.iter().copied())
}

/// The two-step carrying-capacity line plus a small colony tree:
///
/// ```text
/// T1 -> T2
/// swift_legs -> trail_pheromones -> forager_caste
/// thick_carapace
/// ```
pub fn sample_catalog() -> TechCatalog {
    let nodes = vec![
        tech("T1", 50, &[]).with_effect("carrying_capacity_bonus", fixed(25.0)),
        tech("T2", 75, &["T1"]).with_effect("carrying_capacity_bonus", fixed(25.0)),
        tech("swift_legs", 30, &[])
            .with_effect("movement_speed_bonus", fixed(20.0))
            .with_visual("leg_length", fixed(1.1)),
        TechnologyNode::new("trail_pheromones", TechCategory::Efficiency, 60)
            .with_prerequisites(["swift_legs"])
            .with_effect("foraging_efficiency", fixed(15.0))
            .with_effect("efficiency_multiplier", fixed(1.2))
            .with_effect("enable_pheromone_trails", true),
        TechnologyNode::new("forager_caste", TechCategory::Specialized, 120)
            .with_prerequisites(["trail_pheromones"])
            .with_effect("abilities", vec!["scout".to_string(), "harvest".to_string()]),
        TechnologyNode::new("thick_carapace", TechCategory::Combat, 80)
            .with_effect("defense_bonus", fixed(30.0))
            .with_effect("health_bonus", fixed(20.0))
            .with_visual("glow", true)
            .with_visual("shell_color", "obsidian"),
    ];
    match TechCatalog::from_nodes(nodes) {
        Ok(catalog) => catalog,
        Err(e) => panic!("sample catalog is invalid: {e}"),
    }
}
