//! Colony session walkthrough: load the catalog, lay out the tree, buy a few
//! upgrades, undo one, and save/restore the session.
//!
//! Run with: `RUST_LOG=debug cargo run -p formica-examples --example colony_session`

use std::path::Path;

use formica_core::fixed::{Fixed64, fixed64_to_f64};
use formica_core::id::TechId;
use formica_data::load_game_data;
use formica_effects::{AntAttributes, CombatStats, ResourceKind};
use formica_engine::{UpgradeEngine, UpgradeState, VisualUpdateKind};
use formica_tech_tree::LayoutConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let data = load_game_data(&dir)?;
    println!("Loaded {} technologies", data.catalog.len());

    let mut engine = UpgradeEngine::new(data.catalog, data.config);

    // --- Layout ---

    for p in engine.tier_layout(&LayoutConfig::default()) {
        println!("  tier {} slot {} at ({:>3}, {:>3}): {}", p.tier, p.slot, p.x, p.y, p.id);
    }

    // --- Session ---

    engine.initialize("colony-alpha", ["swift_legs"]);
    engine.on_visual_update(Box::new(|u| {
        let verb = match u.kind {
            VisualUpdateKind::Applied => "applied",
            VisualUpdateKind::Reverted => "reverted",
        };
        println!("  [visual] {} {verb}, {} composed keys", u.tech_id, u.composed.len());
    }));

    let mut points = 200;
    for name in ["sturdy_thorax", "reinforced_thorax", "trail_pheromones", "forager_caste"] {
        let id = TechId::from(name);
        let cost = engine.catalog().get(&id).map_or(0, |n| n.cost);
        let status = engine.purchase(&id, points)?;
        if status.can_purchase() {
            points -= cost;
        }
        println!("purchase {name}: {status} (points left: {points})");
    }

    // --- Effects ---

    let worker = AntAttributes {
        carrying_capacity: 10,
        movement_speed: Fixed64::ONE,
        max_health: 100,
        health: 100,
        combat_strength: 5,
    };
    let ant = engine.apply_ant_modifiers(&worker)?;
    println!(
        "worker: capacity {} speed {:.2} health {}/{}",
        ant.carrying_capacity,
        fixed64_to_f64(ant.movement_speed),
        ant.health,
        ant.max_health
    );

    let food = engine.apply_resource_modifiers(ResourceKind::Food, Fixed64::from_num(10))?;
    println!("food rate 10.0 -> {:.2}", fixed64_to_f64(food));
    println!("nest build 120 -> {}", engine.apply_construction_modifiers(120)?);
    let guard = engine.apply_combat_modifiers(&CombatStats {
        attack_damage: 12,
        defense: 8,
        escape_chance: Fixed64::from_num(10),
    })?;
    println!("guard: attack {} defense {}", guard.attack_damage, guard.defense);

    // --- Undo ---

    engine.remove_upgrade(&TechId::from("reinforced_thorax"))?;
    let ant = engine.apply_ant_modifiers(&worker)?;
    println!("after undo: capacity {}", ant.carrying_capacity);

    // --- Save / restore ---

    let bytes = engine.export_state()?.to_bytes()?;
    println!("saved session: {} bytes", bytes.len());

    let mut restored = UpgradeEngine::new(engine.catalog().clone(), *engine.config());
    restored.import_state(UpgradeState::from_bytes(&bytes)?);
    let active: Vec<&str> = restored.active_ids().map(TechId::as_str).collect();
    println!("restored {:?}: {active:?}", restored.colony_id().map(|c| c.as_str()));
    println!("scout ability: {}", restored.has_special_ability("scout")?);

    Ok(())
}
