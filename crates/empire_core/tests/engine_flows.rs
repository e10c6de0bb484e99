//! End-to-end flows through start operations, ticks and attacks.

use empire_core::math::ratio;
use empire_core::prelude::*;
use empire_test_utils::fixtures::{
    developed_start, engine_with, engine_with_config, fixed, fixed_f, tech, town_start,
    TOWN_HALL_AT,
};

const FARM_AT: Coord = Coord::new(7, 8);
const GOBLINS_AT: Coord = Coord::new(2, 2);
const BANDITS_AT: Coord = Coord::new(13, 13);

fn developed(resources: Cost) -> Engine {
    engine_with(developed_start().with_resources(resources))
}

fn amounts(engine: &Engine) -> (Fixed, Fixed) {
    (
        engine.ledger().amount(ResourceKind::Food),
        engine.ledger().amount(ResourceKind::Ore),
    )
}

#[test]
fn upgrade_deducts_level_cost_once() {
    let mut engine = developed(Cost::new(500, 500));
    engine.start_construction(BuildingKind::Farm, FARM_AT).unwrap();

    // level 3 farm: 40/60 grown by 150% twice
    assert_eq!(amounts(&engine), (fixed(500 - 90), fixed(500 - 135)));
    let head = engine.queue(QueueKind::Construction).head().unwrap().clone();
    // 30s grown by 140% twice is 58s, town hall level 3 runs at 120%
    assert_eq!(head.total_time, ratio(5800, 120));
    assert_eq!(
        head.payload,
        JobPayload::Construction {
            building: BuildingKind::Farm,
            target_level: 3,
            position: FARM_AT,
        }
    );
}

#[test]
fn rejected_starts_leave_resources_unchanged() {
    let mut engine = developed(Cost::new(100, 100));
    let before = engine.ledger().clone();
    let hash = engine.state_hash();

    assert!(matches!(
        engine.start_training(UnitKind::Cavalry, 100),
        Err(CommandError::InsufficientResources {
            resource: ResourceKind::Food,
            required: 6000,
            available: 100,
        })
    ));
    assert!(matches!(
        engine.start_construction(BuildingKind::Library, Coord::new(0, 0)),
        Err(CommandError::InvalidPlacement { .. })
    ));
    assert!(matches!(
        engine.start_research(&tech(TechCategory::Defense, "fortification")),
        Err(CommandError::PrerequisiteNotMet(Prerequisite::BuildingLevel {
            building: BuildingKind::Wall,
            level: 2,
        }))
    ));

    assert_eq!(engine.ledger(), &before);
    assert_eq!(engine.state_hash(), hash);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn training_requires_barracks_level() {
    let start = town_start(Cost::new(1000, 1000)).with_building(
        BuildingKind::Barracks,
        1,
        Coord::new(3, 3),
    );
    let mut engine = engine_with(start);
    assert_eq!(
        engine.start_training(UnitKind::Archer, 1),
        Err(CommandError::PrerequisiteNotMet(Prerequisite::BuildingLevel {
            building: BuildingKind::Barracks,
            level: 2,
        }))
    );
    engine.start_training(UnitKind::Spearman, 3).unwrap();
    assert_eq!(
        engine.queue(QueueKind::Training).head().unwrap().total_time,
        fixed(60)
    );
}

#[test]
fn full_queue_rejects_before_paying() {
    let mut engine = developed(Cost::new(1500, 1500));
    for _ in 0..JobQueue::DEFAULT_MAX_LEN {
        engine.start_training(UnitKind::Spearman, 1).unwrap();
    }
    let before = engine.ledger().clone();

    assert_eq!(
        engine.start_training(UnitKind::Spearman, 1),
        Err(CommandError::QueueFull(QueueKind::Training))
    );
    assert_eq!(engine.ledger(), &before);
}

#[test]
fn research_cannot_be_queued_twice() {
    let mut engine = developed(Cost::new(1000, 1000));
    let irrigation = tech(TechCategory::Economy, "irrigation");
    engine.start_research(&irrigation).unwrap();
    assert_eq!(
        engine.start_research(&irrigation),
        Err(CommandError::ResearchInProgress(irrigation))
    );
    assert_eq!(
        engine.start_research(&tech(TechCategory::Economy, "compost")),
        Err(CommandError::UnknownTechnology(tech(TechCategory::Economy, "compost")))
    );
}

#[test]
fn town_hall_cannot_pass_max_level() {
    let start = StartingState::bare(4, 4)
        .with_resources(Cost::new(1000, 1000))
        .with_building(BuildingKind::TownHall, 10, Coord::new(1, 1));
    let mut engine = engine_with(start);
    assert_eq!(
        engine.start_construction(BuildingKind::TownHall, Coord::new(1, 1)),
        Err(CommandError::MaxLevelReached {
            building: BuildingKind::TownHall,
            max_level: 10,
        })
    );
}

#[test]
fn new_buildings_need_a_free_cell() {
    let mut fresh = engine_with(town_start(Cost::new(1000, 1000)).with_camp(
        Coord::new(1, 1),
        Camp::new(CampKind::GoblinCamp, 1, Cost::ZERO),
    ));
    assert_eq!(
        fresh.start_construction(BuildingKind::Mine, Coord::new(1, 1)),
        Err(CommandError::InvalidPlacement {
            building: BuildingKind::Mine,
            at: Coord::new(1, 1),
        })
    );
    assert_eq!(
        fresh.start_construction(BuildingKind::Mine, Coord::new(40, 1)),
        Err(CommandError::InvalidPlacement {
            building: BuildingKind::Mine,
            at: Coord::new(40, 1),
        })
    );
    assert_eq!(
        fresh.start_construction(BuildingKind::TownHall, Coord::new(0, 0)),
        Err(CommandError::InvalidPlacement {
            building: BuildingKind::TownHall,
            at: Coord::new(0, 0),
        })
    );
    fresh.start_construction(BuildingKind::TownHall, TOWN_HALL_AT).unwrap();
}

#[test]
fn research_bonus_applies_to_same_tick_production() {
    let mut engine = developed(Cost::new(500, 500));
    engine.start_research(&tech(TechCategory::Economy, "irrigation")).unwrap();
    assert_eq!(amounts(&engine), (fixed(420), fixed(440)));

    // 45s at library level 2 is under 41s, so one minute completes it
    let events = engine.tick(fixed(60));
    assert!(events.contains(&GameEvent::ResearchCompleted {
        tech: tech(TechCategory::Economy, "irrigation"),
    }));
    assert_eq!(engine.bonuses().food_production_percent, 15);

    // (town hall 30 + farm 120) × 115% food, town hall 30 + mine 90 ore
    assert_eq!(amounts(&engine), (fixed_f(592.5), fixed(560)));
    assert!(matches!(events.last(), Some(GameEvent::ResourcesChanged { .. })));
}

#[test]
fn granaries_raise_capacity_on_completion() {
    let start = developed_start()
        .with_resources(Cost::new(1000, 1000))
        .with_technology(tech(TechCategory::Economy, "irrigation"));
    let mut engine = engine_with(start);
    assert_eq!(engine.ledger().capacity(), fixed(1500));

    engine.start_research(&tech(TechCategory::Economy, "granaries")).unwrap();
    engine.tick(fixed(90));

    assert!(engine.tech_tree().is_researched(&tech(TechCategory::Economy, "granaries")));
    assert_eq!(engine.ledger().capacity(), fixed(2000));
}

#[test]
fn victory_takes_loot_and_clears_the_camp() {
    let army = UnitCounts::new().with(UnitKind::Spearman, 5);
    let start = developed_start()
        .with_resources(Cost::new(500, 500))
        .with_units(army.clone());
    let mut engine = engine_with(start);

    let preview = engine.preview_attack(GOBLINS_AT, &army).unwrap();
    let report = engine.commit_attack(GOBLINS_AT, &army).unwrap();

    assert_eq!(report.total_attack_power, preview.total_attack_power);
    assert_eq!(report.outcome, preview.outcome);
    assert_eq!(report.outcome, Outcome::Victory);
    assert_eq!(report.losses, UnitCounts::new().with(UnitKind::Spearman, 2));
    assert_eq!(report.loot, Cost::new(150, 100));

    assert_eq!(engine.units().get(UnitKind::Spearman), 3);
    assert_eq!(amounts(&engine), (fixed(650), fixed(600)));
    assert_eq!(engine.map().cell(GOBLINS_AT), Some(Cell::Empty));
    assert_eq!(engine.reports().count(), 1);
    assert_eq!(engine.drain_events(), vec![GameEvent::CombatResolved(report)]);

    assert_eq!(
        engine.preview_attack(GOBLINS_AT, &UnitCounts::new().with(UnitKind::Spearman, 1)),
        Err(CommandError::InvalidTarget(GOBLINS_AT))
    );
}

#[test]
fn defeat_keeps_the_camp_and_costs_units() {
    let army = UnitCounts::new().with(UnitKind::Cavalry, 3);
    let mut engine = engine_with(developed_start().with_units(army.clone()));
    let before = engine.ledger().clone();

    let report = engine.commit_attack(BANDITS_AT, &army).unwrap();
    assert_eq!(report.outcome, Outcome::Defeat);
    assert_eq!(report.total_attack_power, fixed(36));
    assert_eq!(report.target_defense, 100);
    assert_eq!(report.loot, Cost::ZERO);
    assert_eq!(engine.units().get(UnitKind::Cavalry), 2);
    assert!(engine.map().camp_at(BANDITS_AT).is_some());
    assert_eq!(engine.ledger(), &before);
}

#[test]
fn invalid_attacks_change_nothing() {
    let army = UnitCounts::new().with(UnitKind::Spearman, 4);
    let mut engine = engine_with(developed_start().with_units(army));
    let hash = engine.state_hash();

    assert_eq!(
        engine.commit_attack(TOWN_HALL_AT, &UnitCounts::new().with(UnitKind::Spearman, 1)),
        Err(CommandError::InvalidTarget(TOWN_HALL_AT))
    );
    assert_eq!(
        engine.commit_attack(GOBLINS_AT, &UnitCounts::new()),
        Err(CommandError::EmptyCommitment)
    );
    // an all-zero army read from a script is still empty
    let zeros: Command = ron::from_str(
        "CommitAttack(target: (x: 2, y: 2), units: {Spearman: 0, Archer: 0})",
    )
    .unwrap();
    assert_eq!(engine.apply(zeros), Err(CommandError::EmptyCommitment));
    assert_eq!(
        engine.commit_attack(GOBLINS_AT, &UnitCounts::new().with(UnitKind::Spearman, 5)),
        Err(CommandError::InsufficientUnits {
            unit: UnitKind::Spearman,
            requested: 5,
            available: 4,
        })
    );
    assert_eq!(engine.state_hash(), hash);
    assert_eq!(engine.reports().count(), 0);
}

#[test]
fn report_history_drops_oldest() {
    let start = developed_start().with_units(UnitCounts::new().with(UnitKind::Spearman, 10));
    let mut config = EngineConfig::default().with_start(start);
    config.report_history_limit = 2;
    let mut engine = engine_with_config(config);

    // spearmen have no advantage against bandits: 10 × 10 ties defense 100
    for _ in 0..3 {
        let army = engine.units().clone();
        let report = engine.commit_attack(BANDITS_AT, &army).unwrap();
        assert_eq!(report.outcome, Outcome::Defeat);
    }

    let committed: Vec<u32> = engine
        .reports()
        .map(|r| r.committed.get(UnitKind::Spearman))
        .collect();
    assert_eq!(committed, vec![4, 2]);
    assert_eq!(engine.units().get(UnitKind::Spearman), 1);
}

#[test]
fn commands_match_direct_calls() {
    let mut direct = developed(Cost::new(800, 800));
    let mut applied = direct.clone();

    direct.start_training(UnitKind::Archer, 2).unwrap();
    direct.tick(fixed(30));

    assert_eq!(
        applied.apply(Command::StartTraining {
            unit: UnitKind::Archer,
            quantity: 2,
        }),
        Ok(CommandOutcome::Queued)
    );
    assert!(matches!(
        applied.apply(Command::Tick { delta: fixed(30) }),
        Ok(CommandOutcome::Ticked(_))
    ));
    assert_eq!(direct.state_hash(), applied.state_hash());
}
