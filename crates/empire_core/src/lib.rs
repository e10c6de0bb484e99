//! # Empire Core
//!
//! Deterministic progression engine for a single empire: resource
//! production, construction/training/research queues, technology bonuses
//! and attacks on NPC camps.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (except explicit save and ruleset file helpers)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Identical command sequences applied to identical starting states always
//! produce identical [`Engine::state_hash`] values.
//!
//! ## Crate Structure
//!
//! - [`engine`] - The simulation context and its operations
//! - [`data`] - Ruleset definitions loaded from RON
//! - [`resources`] - Resource ledger
//! - [`technology`] - Bonus aggregation
//! - [`queue`] - Job queues
//! - [`combat`] - Attack resolution
//! - [`save`] - Save games
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buildings;
pub mod combat;
pub mod command;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod map;
pub mod math;
pub mod queue;
pub mod resources;
pub mod save;
pub mod technology;
pub mod units;

pub use engine::Engine;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buildings::{Buildings, OwnedBuilding};
    pub use crate::combat::{AttackPreview, CombatReport, Outcome, UnitContribution};
    pub use crate::command::{Command, CommandOutcome};
    pub use crate::config::{CampPlacement, EngineConfig, StartingBuilding, StartingState};
    pub use crate::data::{
        BuildingKind, Ruleset, RulesetData, TechCategory, TechEffect, TechKey, UnitKind,
    };
    pub use crate::engine::Engine;
    pub use crate::error::{CommandError, CommandResult, GameError, Prerequisite, Result};
    pub use crate::events::GameEvent;
    pub use crate::map::{Camp, CampKind, Cell, Coord, GameMap};
    pub use crate::math::Fixed;
    pub use crate::queue::{JobPayload, JobQueue, QueueEntry, QueueKind, ResidualPolicy};
    pub use crate::resources::{Cost, ResourceDelta, ResourceKind, ResourceLedger};
    pub use crate::save::{SaveGame, SAVE_VERSION};
    pub use crate::technology::{BonusVector, TechTree};
    pub use crate::units::UnitCounts;
}
