//! Scripted headless simulation.
//!
//! Builds or loads an engine, applies an optional command script, then
//! ticks it a fixed number of times. Rejected script commands are counted
//! and logged; they never abort the run.

use std::path::PathBuf;

use empire_core::prelude::*;
use serde::Serialize;

use crate::read_ron;

/// What to simulate.
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Ruleset file; the standard ruleset when absent.
    pub ruleset: Option<PathBuf>,
    /// Engine config file; the default config when absent.
    pub config: Option<PathBuf>,
    /// Save to continue from instead of a new game.
    pub load: Option<PathBuf>,
    /// RON list of commands applied before ticking.
    pub script: Option<PathBuf>,
    /// Number of ticks to run after the script.
    pub ticks: u32,
    /// Seconds per tick.
    pub dt: u32,
    /// Where to write the final save.
    pub save: Option<PathBuf>,
}

/// Final state of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    /// Ticks elapsed, including ticks from a loaded save.
    pub turn: u64,
    /// Whole food in storage.
    pub food: u32,
    /// Whole ore in storage.
    pub ore: u32,
    /// Whole storage capacity.
    pub capacity: u32,
    /// Owned buildings and their levels.
    pub buildings: Vec<(BuildingKind, u8)>,
    /// Army.
    pub units: UnitCounts,
    /// Technologies researched.
    pub researched: Vec<TechKey>,
    /// Script commands the engine accepted.
    pub accepted_commands: usize,
    /// Script commands the engine rejected.
    pub rejected_commands: usize,
    /// Events produced during the run.
    pub events: Vec<GameEvent>,
    /// Final state hash.
    pub state_hash: u64,
}

/// Run a simulation.
///
/// # Errors
///
/// Returns an error if an input file cannot be read, the engine cannot be
/// built or restored, or the final save cannot be written.
pub fn run_simulation(options: &SimulateOptions) -> Result<SimulationSummary> {
    let ruleset = match &options.ruleset {
        Some(path) => Ruleset::load(path)?,
        None => Ruleset::standard(),
    };
    let config: EngineConfig = match &options.config {
        Some(path) => read_ron(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = match &options.load {
        Some(path) => Engine::from_save(SaveGame::load(path)?, ruleset, config)?,
        None => Engine::new(ruleset, config)?,
    };
    let script: Vec<Command> = match &options.script {
        Some(path) => read_ron(path)?,
        None => Vec::new(),
    };

    let mut events = Vec::new();
    let mut accepted = 0;
    let mut rejected = 0;
    for (step, command) in script.into_iter().enumerate() {
        match engine.apply(command) {
            Ok(CommandOutcome::Ticked(tick_events)) => {
                accepted += 1;
                events.extend(tick_events);
            }
            Ok(_) => accepted += 1,
            Err(e) => {
                rejected += 1;
                tracing::warn!(step, error = %e, "Script command rejected");
            }
        }
        events.append(&mut engine.drain_events());
    }

    let delta = Fixed::from_num(options.dt);
    for _ in 0..options.ticks {
        events.extend(engine.tick(delta));
    }
    tracing::info!(
        ticks = options.ticks,
        dt = options.dt,
        turn = engine.turn(),
        "Simulation finished"
    );

    if let Some(path) = &options.save {
        engine.save_game().save(path)?;
    }

    Ok(SimulationSummary {
        turn: engine.turn(),
        food: engine.ledger().whole_amount(ResourceKind::Food),
        ore: engine.ledger().whole_amount(ResourceKind::Ore),
        capacity: engine.ledger().capacity().saturating_to_num(),
        buildings: engine
            .buildings()
            .iter()
            .map(|(kind, b)| (kind, b.level))
            .collect(),
        units: engine.units().clone(),
        researched: engine.researched().cloned().collect(),
        accepted_commands: accepted,
        rejected_commands: rejected,
        events,
        state_hash: engine.state_hash(),
    })
}
