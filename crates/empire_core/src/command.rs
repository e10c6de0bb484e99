//! Every mutating engine operation as a value.
//!
//! Commands let hosts serialize, log and replay player input. The actor in
//! the server crate and scripted runs both go through [`crate::Engine::apply`].

use serde::{Deserialize, Serialize};

use crate::combat::CombatReport;
use crate::data::{BuildingKind, TechKey, UnitKind};
use crate::events::GameEvent;
use crate::map::Coord;
use crate::math::{millis_serde, Fixed};
use crate::units::UnitCounts;

/// A player or host request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Queue construction or an upgrade of a building at a cell.
    StartConstruction {
        /// Building type.
        building: BuildingKind,
        /// Building cell.
        at: Coord,
    },
    /// Queue a batch of units.
    StartTraining {
        /// Unit type.
        unit: UnitKind,
        /// Batch size.
        quantity: u32,
    },
    /// Queue a technology.
    StartResearch {
        /// Technology.
        tech: TechKey,
    },
    /// Advance the simulation.
    Tick {
        /// Elapsed seconds, written as `delta_ms` milliseconds.
        #[serde(rename = "delta_ms", with = "millis_serde")]
        delta: Fixed,
    },
    /// Send units against a camp.
    CommitAttack {
        /// Camp cell.
        target: Coord,
        /// Units sent.
        units: UnitCounts,
    },
}

/// What a successfully applied command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// A job was queued.
    Queued,
    /// The simulation advanced; carries the tick's events.
    Ticked(Vec<GameEvent>),
    /// An attack was resolved.
    Attacked(CombatReport),
}
