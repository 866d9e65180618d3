//! End-to-end colony session: data files on disk through purchases, undo,
//! attribute helpers, visual notifications and a save/restore cycle.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use formica_core::clock::ManualClock;
use formica_core::fixed::Fixed64;
use formica_core::id::TechId;
use formica_data::load_game_data;
use formica_effects::{AntAttributes, CombatStats, ResourceKind};
use formica_engine::{UpgradeEngine, UpgradeState, VisualUpdate, VisualUpdateKind};
use formica_tech_tree::{LayoutConfig, UnlockStatus, VisualValue};

const TECHNOLOGIES: &str = r#"[
    {"id": "T1", "name": "Sturdy Thorax", "category": "physical", "cost": 50,
     "effects": {"carrying_capacity_bonus": 25}},
    {"id": "T2", "name": "Reinforced Thorax", "category": "physical", "cost": 75,
     "prerequisites": ["T1"],
     "effects": {"carrying_capacity_bonus": 25}},
    {"id": "swift_legs", "category": "physical", "cost": 30,
     "effects": {"movement_speed_bonus": 20},
     "visual_changes": {"leg_length": 1.5}},
    {"id": "long_stride", "category": "physical", "cost": 40,
     "prerequisites": ["swift_legs"],
     "effects": {"movement_speed_bonus": 20},
     "visual_changes": {"leg_length": 2.0}},
    {"id": "trail_pheromones", "category": "efficiency", "cost": 60,
     "prerequisites": ["swift_legs"],
     "effects": {"foraging_efficiency": 0, "efficiency_multiplier": 1.2,
                 "enable_pheromone_trails": true}},
    {"id": "shared_maps", "category": "efficiency", "cost": 60,
     "prerequisites": ["trail_pheromones"],
     "effects": {"efficiency_multiplier": 1.2, "abilities": ["scout", "scout"]}},
    {"id": "thick_carapace", "category": "combat", "cost": 80,
     "effects": {"defense_bonus": 30, "escape_chance_bonus": 100},
     "visual_changes": {"glow": true, "shell_color": "obsidian"}},
    {"id": "master_builders", "category": "specialized", "cost": 100,
     "effects": {"building_speed_bonus": 50, "research_speed_bonus": 10,
                 "colony_morale": 5}}
]"#;

fn game_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "formica_colony_test_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("technologies.json"), TECHNOLOGIES).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

fn id(s: &str) -> TechId {
    TechId::from(s)
}

fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

fn approx(a: Fixed64, b: f64) -> bool {
    (a - fixed(b)).abs() < fixed(0.0001)
}

fn new_engine(dir: &Path, clock: &ManualClock) -> UpgradeEngine<ManualClock> {
    let data = load_game_data(dir).unwrap();
    UpgradeEngine::with_clock(data.catalog, data.config, clock.clone())
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

#[test]
fn t1_then_t2_stacks_carrying_capacity() {
    let dir = game_dir("t1_t2");
    let clock = ManualClock::new(0);
    let mut engine = new_engine(&dir, &clock);
    engine.initialize("colony-1", Vec::<TechId>::new());

    assert_eq!(engine.status_of(&id("T1"), 60).unwrap(), UnlockStatus::Available);
    assert_eq!(engine.status_of(&id("T2"), 60).unwrap(), UnlockStatus::Locked);

    engine.purchase(&id("T1"), 60).unwrap();
    assert_eq!(engine.status_of(&id("T2"), 10).unwrap(), UnlockStatus::Unaffordable);

    engine.purchase(&id("T2"), 75).unwrap();
    let effects = engine.current_effects().unwrap();
    assert_eq!(effects.carrying_capacity_bonus, fixed(50.0));

    let ant = engine
        .apply_ant_modifiers(&AntAttributes {
            carrying_capacity: 10,
            movement_speed: Fixed64::ONE,
            max_health: 50,
            health: 50,
            combat_strength: 3,
        })
        .unwrap();
    assert_eq!(ant.carrying_capacity, 15);

    cleanup(&dir);
}

#[test]
fn speed_and_foraging_bonuses_compose() {
    let dir = game_dir("speed");
    let clock = ManualClock::new(0);
    let mut engine = new_engine(&dir, &clock);
    engine.initialize(
        "colony-2",
        ["swift_legs", "long_stride", "trail_pheromones", "shared_maps"],
    );

    let ant = engine
        .apply_ant_modifiers(&AntAttributes {
            carrying_capacity: 1,
            movement_speed: Fixed64::ONE,
            max_health: 1,
            health: 1,
            combat_strength: 1,
        })
        .unwrap();
    assert!(approx(ant.movement_speed, 1.4));

    let rate = engine
        .apply_resource_modifiers(ResourceKind::Food, fixed(10.0))
        .unwrap();
    assert!(approx(rate, 14.4));
    // Water has no bonus but still takes the efficiency multiplier.
    let water = engine
        .apply_resource_modifiers(ResourceKind::Water, fixed(10.0))
        .unwrap();
    assert!(approx(water, 14.4));

    assert!(engine.has_special_ability("scout").unwrap());
    assert!(engine.has_special_ability("enable_pheromone_trails").unwrap());
    assert_eq!(
        engine
            .current_effects()
            .unwrap()
            .special_abilities
            .iter()
            .filter(|a| a.as_str() == "scout")
            .count(),
        1
    );

    cleanup(&dir);
}

#[test]
fn combat_construction_and_colony_modifiers() {
    let dir = game_dir("combat");
    let clock = ManualClock::new(0);
    let mut engine = new_engine(&dir, &clock);
    engine.initialize("colony-3", ["thick_carapace", "master_builders"]);

    let stats = engine
        .apply_combat_modifiers(&CombatStats {
            attack_damage: 10,
            defense: 10,
            escape_chance: fixed(10.0),
        })
        .unwrap();
    assert_eq!(stats.attack_damage, 10);
    assert_eq!(stats.defense, 13);
    assert_eq!(stats.escape_chance, fixed(95.0));

    assert_eq!(engine.apply_construction_modifiers(90).unwrap(), 60);
    assert_eq!(engine.apply_construction_modifiers(1).unwrap(), 1);
    assert!(approx(engine.research_speed_modifier().unwrap(), 1.1));
    assert!(approx(engine.colony_happiness_modifier().unwrap(), 1.05));

    cleanup(&dir);
}

// ---------------------------------------------------------------------------
// Undo, cache and visuals
// ---------------------------------------------------------------------------

#[test]
fn undo_reverts_effects_and_visuals() {
    let dir = game_dir("undo");
    let clock = ManualClock::new(0);
    let mut engine = new_engine(&dir, &clock);
    engine.initialize("colony-4", ["swift_legs"]);

    let updates: Rc<RefCell<Vec<VisualUpdate>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = updates.clone();
    engine.on_visual_update(Box::new(move |u| sink.borrow_mut().push(u.clone())));

    clock.advance(1_000);
    engine.purchase(&id("long_stride"), 100).unwrap();
    assert!(approx(
        engine.current_effects().unwrap().movement_speed_bonus,
        40.0
    ));
    assert_eq!(
        engine.composed_visuals().get("leg_length"),
        Some(&VisualValue::Number(fixed(3.0)))
    );

    // Undo inside the TTL still takes effect immediately.
    clock.advance(1_000);
    assert!(engine.remove_upgrade(&id("long_stride")).unwrap());
    assert!(!engine.remove_upgrade(&id("long_stride")).unwrap());
    assert!(approx(
        engine.current_effects().unwrap().movement_speed_bonus,
        20.0
    ));

    let updates = updates.borrow();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].kind, VisualUpdateKind::Applied);
    assert_eq!(
        updates[0].composed.get("leg_length"),
        Some(&VisualValue::Number(fixed(3.0)))
    );
    assert_eq!(updates[1].kind, VisualUpdateKind::Reverted);
    assert_eq!(
        updates[1].composed.get("leg_length"),
        Some(&VisualValue::Number(fixed(1.5)))
    );

    cleanup(&dir);
}

// ---------------------------------------------------------------------------
// Save / restore
// ---------------------------------------------------------------------------

#[test]
fn save_and_restore_through_bytes() {
    let dir = game_dir("save");
    let clock = ManualClock::new(10_000);
    let mut engine = new_engine(&dir, &clock);
    engine.initialize("colony-5", ["T1", "swift_legs", "thick_carapace"]);
    let before = engine.current_effects().unwrap().clone();

    let bytes = engine.export_state().unwrap().to_bytes().unwrap();

    let later = ManualClock::new(99_000);
    let mut restored = new_engine(&dir, &later);
    restored.initialize("someone-else", ["master_builders"]);
    restored.import_state(UpgradeState::from_bytes(&bytes).unwrap());

    assert_eq!(restored.colony_id().map(|c| c.as_str()), Some("colony-5"));
    let ids: Vec<&str> = restored.active_ids().map(|i| i.as_str()).collect();
    assert_eq!(ids, vec!["T1", "swift_legs", "thick_carapace"]);
    assert_eq!(restored.current_effects().unwrap(), &before);
    assert_eq!(
        restored.export_state().unwrap().last_cache_timestamp,
        Some(99_000)
    );

    cleanup(&dir);
}

#[test]
fn layout_covers_catalog_by_tier() {
    let dir = game_dir("layout");
    let clock = ManualClock::new(0);
    let engine = new_engine(&dir, &clock);

    let placements = engine.tier_layout(&LayoutConfig::default());
    assert_eq!(placements.len(), 8);
    let tier_of = |name: &str| placements.iter().find(|p| p.id == id(name)).unwrap().tier;
    assert_eq!(tier_of("T1"), 0);
    assert_eq!(tier_of("T2"), 1);
    assert_eq!(tier_of("trail_pheromones"), 1);
    assert_eq!(tier_of("shared_maps"), 2);
    assert_eq!(tier_of("master_builders"), 0);

    cleanup(&dir);
}
