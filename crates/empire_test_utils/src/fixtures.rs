//! Test fixtures and helpers.
//!
//! Pre-built starting states and scripted scenarios for consistent
//! testing.

use empire_core::prelude::*;
use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Town hall cell used by every fixture start.
pub const TOWN_HALL_AT: Coord = Coord::new(8, 8);

/// A 16x16 map with only a level 1 town hall and the given stockpiles.
#[must_use]
pub fn town_start(resources: Cost) -> StartingState {
    StartingState::bare(16, 16)
        .with_resources(resources)
        .with_building(BuildingKind::TownHall, 1, TOWN_HALL_AT)
}

/// A mid-game empire: every building type built, three camps on the map.
///
/// Camps: goblin camp difficulty 5 at (2, 2), bandit hideout difficulty 10
/// at (13, 13), goblin camp difficulty 1 at (13, 2).
#[must_use]
pub fn developed_start() -> StartingState {
    StartingState::bare(16, 16)
        .with_resources(Cost::new(1500, 1500))
        .with_building(BuildingKind::TownHall, 3, TOWN_HALL_AT)
        .with_building(BuildingKind::Farm, 2, Coord::new(7, 8))
        .with_building(BuildingKind::Mine, 2, Coord::new(9, 8))
        .with_building(BuildingKind::Warehouse, 1, Coord::new(8, 7))
        .with_building(BuildingKind::Barracks, 3, Coord::new(8, 9))
        .with_building(BuildingKind::Library, 2, Coord::new(7, 7))
        .with_building(BuildingKind::Wall, 1, Coord::new(9, 9))
        .with_camp(
            Coord::new(2, 2),
            Camp::new(CampKind::GoblinCamp, 5, Cost::new(150, 100)),
        )
        .with_camp(
            Coord::new(13, 13),
            Camp::new(CampKind::BanditHideout, 10, Cost::new(300, 300)),
        )
        .with_camp(
            Coord::new(13, 2),
            Camp::new(CampKind::GoblinCamp, 1, Cost::new(20, 10)),
        )
}

/// Build an engine on the standard ruleset.
///
/// # Panics
///
/// Panics if the starting state is invalid.
#[must_use]
pub fn engine_with(start: StartingState) -> Engine {
    engine_with_config(EngineConfig::default().with_start(start))
}

/// Build an engine on the standard ruleset with a full config.
///
/// # Panics
///
/// Panics if the config is invalid.
#[must_use]
pub fn engine_with_config(config: EngineConfig) -> Engine {
    Engine::new(Ruleset::standard(), config).expect("fixture config must be valid")
}

/// Shorthand for a technology key.
#[must_use]
pub fn tech(category: TechCategory, id: &str) -> TechKey {
    TechKey::new(category, id)
}

/// A named starting config plus a command script, loadable from RON.
///
/// # Example RON
///
/// ```ron
/// (
///     name: "first barracks",
///     config: (start: (resources: (food: 500, ore: 500))),
///     script: [
///         StartConstruction(building: Barracks, at: (x: 3, y: 3)),
///         Tick(delta_ms: 45000),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name for test output.
    pub name: String,
    /// Engine configuration.
    #[serde(default)]
    pub config: EngineConfig,
    /// Commands applied in order.
    #[serde(default)]
    pub script: Vec<Command>,
}

impl Scenario {
    /// Parse a scenario from RON.
    ///
    /// # Errors
    ///
    /// Returns the parse error message.
    pub fn from_ron(text: &str) -> std::result::Result<Self, String> {
        ron::from_str(text).map_err(|e| e.to_string())
    }

    /// Run the script on a fresh engine, returning the engine and every
    /// command's result.
    ///
    /// # Errors
    ///
    /// Fails only if the engine cannot be created.
    pub fn run(&self) -> Result<(Engine, Vec<CommandResult<CommandOutcome>>)> {
        let mut engine = Engine::new(Ruleset::standard(), self.config.clone())?;
        let results = self
            .script
            .iter()
            .map(|command| engine.apply(command.clone()))
            .collect();
        tracing::debug!(scenario = %self.name, turn = engine.turn(), "Scenario finished");
        Ok((engine, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_valid() {
        let engine = engine_with(developed_start());
        assert_eq!(engine.buildings().level(BuildingKind::Barracks), 3);
        assert_eq!(engine.map().camps().count(), 3);
        assert_eq!(engine.ledger().capacity(), fixed(1500));

        let engine = engine_with(town_start(Cost::new(10, 20)));
        assert_eq!(engine.ledger().whole_amount(ResourceKind::Ore), 20);
    }

    #[test]
    fn test_scenario_from_ron() {
        let scenario = Scenario::from_ron(
            r#"(
                name: "first barracks",
                config: (start: (resources: (food: 500, ore: 500))),
                script: [
                    StartConstruction(building: Barracks, at: (x: 3, y: 3)),
                    Tick(delta_ms: 45000),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.script[1], Command::Tick { delta: fixed(45) });

        let (engine, results) = scenario.run().unwrap();
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(engine.buildings().level(BuildingKind::Barracks), 1);
    }
}
