//! Domain events emitted by the engine.
//!
//! The engine never calls back into presentation code. Collaborators read
//! the events returned by [`crate::Engine::tick`] or drained with
//! [`crate::Engine::drain_events`].

use serde::{Deserialize, Serialize};

use crate::combat::CombatReport;
use crate::data::{BuildingKind, TechKey, UnitKind};
use crate::map::Coord;
use crate::math::{fixed_serde, Fixed};

/// Something that happened inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A construction job was queued.
    ConstructionStarted {
        /// Building type.
        building: BuildingKind,
        /// Level it will reach.
        target_level: u8,
        /// Building cell.
        position: Coord,
        /// Job duration in seconds.
        #[serde(with = "fixed_serde")]
        duration: Fixed,
    },
    /// A building reached a new level.
    ConstructionCompleted {
        /// Building type.
        building: BuildingKind,
        /// New level.
        level: u8,
        /// Building cell.
        position: Coord,
    },
    /// A training job was queued.
    TrainingStarted {
        /// Unit type.
        unit: UnitKind,
        /// Batch size.
        quantity: u32,
        /// Job duration in seconds.
        #[serde(with = "fixed_serde")]
        duration: Fixed,
    },
    /// Units joined the army.
    TrainingCompleted {
        /// Unit type.
        unit: UnitKind,
        /// Units added.
        quantity: u32,
    },
    /// A research job was queued.
    ResearchStarted {
        /// Technology.
        tech: TechKey,
        /// Job duration in seconds.
        #[serde(with = "fixed_serde")]
        duration: Fixed,
    },
    /// A technology became researched.
    ResearchCompleted {
        /// Technology.
        tech: TechKey,
    },
    /// Stockpiles changed during a tick.
    ResourcesChanged {
        /// Food after the change.
        #[serde(with = "fixed_serde")]
        food: Fixed,
        /// Ore after the change.
        #[serde(with = "fixed_serde")]
        ore: Fixed,
        /// Storage capacity.
        #[serde(with = "fixed_serde")]
        capacity: Fixed,
    },
    /// An attack was committed and resolved.
    CombatResolved(CombatReport),
}
