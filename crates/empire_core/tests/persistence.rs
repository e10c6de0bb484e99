//! Save games: round trips, files and version checks.

use empire_core::prelude::*;
use empire_test_utils::determinism::verify_save_roundtrip;
use empire_test_utils::fixtures::{developed_start, engine_with, fixed, tech};

fn mid_game() -> Engine {
    let start = developed_start()
        .with_units(UnitCounts::new().with(UnitKind::Spearman, 6))
        .with_technology(tech(TechCategory::Economy, "irrigation"));
    let mut engine = engine_with(start);
    engine.start_research(&tech(TechCategory::Economy, "granaries")).unwrap();
    engine.start_training(UnitKind::Archer, 2).unwrap();
    engine.start_construction(BuildingKind::Mine, Coord::new(9, 8)).unwrap();
    engine.tick(fixed(10));
    let army = engine.units().clone();
    engine.commit_attack(Coord::new(2, 2), &army).unwrap();
    engine
}

#[test]
fn save_round_trip_restores_everything() {
    let engine = mid_game();
    assert!(verify_save_roundtrip(&engine));

    let bytes = engine.save_game().to_bytes().unwrap();
    let restored = Engine::from_save(
        SaveGame::from_bytes(&bytes).unwrap(),
        Ruleset::standard(),
        EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(restored.turn(), engine.turn());
    assert_eq!(restored.ledger(), engine.ledger());
    assert_eq!(restored.buildings(), engine.buildings());
    assert_eq!(restored.units(), engine.units());
    assert_eq!(restored.map(), engine.map());
    assert_eq!(restored.reports().count(), 1);
    assert_eq!(
        restored.researched().collect::<Vec<_>>(),
        engine.researched().collect::<Vec<_>>()
    );
    for kind in QueueKind::ALL {
        assert_eq!(restored.queue(kind), engine.queue(kind));
    }
}

#[test]
fn load_rederives_capacity_and_bonuses() {
    let start = developed_start()
        .with_resources(Cost::new(1800, 1800))
        .with_technology(tech(TechCategory::Economy, "irrigation"))
        .with_technology(tech(TechCategory::Economy, "granaries"));
    let engine = engine_with(start);
    assert_eq!(engine.ledger().capacity(), fixed(2000));

    let bytes = engine.save_game().to_bytes().unwrap();
    let save = SaveGame::from_bytes(&bytes).unwrap();
    // capacity is not part of the snapshot
    assert_eq!(save.ledger.capacity(), Fixed::ZERO);

    let restored = Engine::from_save(save, Ruleset::standard(), EngineConfig::default()).unwrap();
    assert_eq!(restored.ledger().capacity(), fixed(2000));
    assert_eq!(restored.ledger().whole_amount(ResourceKind::Food), 1800);
    assert_eq!(restored.bonuses().food_production_percent, 15);
    assert_eq!(restored.bonuses().storage_capacity, 500);
}

#[test]
fn restored_engine_continues_identically() {
    let mut original = mid_game();
    let mut restored = Engine::from_save(
        original.save_game(),
        Ruleset::standard(),
        EngineConfig::default(),
    )
    .unwrap();

    for _ in 0..10 {
        original.tick(fixed(15));
        restored.tick(fixed(15));
    }
    assert_eq!(original.state_hash(), restored.state_hash());
}

#[test]
fn save_and_load_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empire.sav");
    let engine = mid_game();

    engine.save_game().save(&path).unwrap();
    let loaded = SaveGame::load(&path).unwrap();
    let restored = Engine::from_save(loaded, Ruleset::standard(), EngineConfig::default()).unwrap();
    assert_eq!(restored.state_hash(), engine.state_hash());
}

#[test]
fn version_mismatch_is_rejected() {
    let mut save = mid_game().save_game();
    save.version = SAVE_VERSION + 1;
    let bytes = save.to_bytes().unwrap();

    assert!(matches!(
        SaveGame::from_bytes(&bytes),
        Err(GameError::VersionMismatch { expected, found })
            if expected == SAVE_VERSION && found == SAVE_VERSION + 1
    ));
    assert!(matches!(
        Engine::from_save(save, Ruleset::standard(), EngineConfig::default()),
        Err(GameError::VersionMismatch { .. })
    ));
}

#[test]
fn corrupt_and_missing_files_fail() {
    assert!(matches!(
        SaveGame::from_bytes(&[1, 0, 0, 0, 7]),
        Err(GameError::Serialization(_))
    ));
    assert!(matches!(SaveGame::from_bytes(&[]), Err(GameError::Serialization(_))));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SaveGame::load(dir.path().join("missing.sav")),
        Err(GameError::Io { .. })
    ));
}

#[test]
fn loaded_history_respects_config_limit() {
    let mut engine = engine_with(
        developed_start().with_units(UnitCounts::new().with(UnitKind::Spearman, 10)),
    );
    for _ in 0..3 {
        let army = engine.units().clone();
        engine.commit_attack(Coord::new(13, 13), &army).unwrap();
    }
    assert_eq!(engine.reports().count(), 3);

    let mut config = EngineConfig::default();
    config.report_history_limit = 1;
    let restored = Engine::from_save(engine.save_game(), Ruleset::standard(), config).unwrap();
    // each defeat costs 60% of the spearmen: 10, then 4, then 2 committed
    let committed: Vec<u32> = restored
        .reports()
        .map(|r| r.committed.get(UnitKind::Spearman))
        .collect();
    assert_eq!(committed, vec![2]);
}
