//! Error types for the empire engine.
//!
//! [`CommandError`] covers every recoverable rejection of a player command.
//! A command that fails this way has left engine state untouched.
//! [`GameError`] covers infrastructure failures: data files, save files,
//! serialization.

use thiserror::Error;

use crate::data::{BuildingKind, TechKey, UnitKind};
use crate::map::Coord;
use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Result type alias using [`CommandError`].
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// A requirement that was not satisfied when starting a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    /// A building must be at least this level.
    BuildingLevel {
        /// The required building.
        building: BuildingKind,
        /// Minimum level.
        level: u8,
    },
    /// A technology must already be researched.
    Technology(TechKey),
}

impl std::fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildingLevel { building, level } => write!(f, "{building} level {level}"),
            Self::Technology(key) => write!(f, "technology {key}"),
        }
    }
}

/// Rejection of a start or attack command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Not enough of a resource to pay the cost.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource that is short.
        resource: ResourceKind,
        /// Amount required.
        required: u32,
        /// Amount available (rounded down).
        available: u32,
    },

    /// A building level or technology requirement is missing.
    #[error("Prerequisite not met: {0}")]
    PrerequisiteNotMet(Prerequisite),

    /// The technology has already been researched.
    #[error("Technology already researched: {0}")]
    AlreadyResearched(TechKey),

    /// The technology is already waiting in the research queue.
    #[error("Technology already queued for research: {0}")]
    ResearchInProgress(TechKey),

    /// The ruleset has no technology with this key.
    #[error("Unknown technology: {0}")]
    UnknownTechnology(TechKey),

    /// The attack target is not an NPC camp.
    #[error("Map cell {0} is not a combat target")]
    InvalidTarget(Coord),

    /// No units were committed to an attack.
    #[error("No units committed to the attack")]
    EmptyCommitment,

    /// The building that hosts this job has not been built.
    #[error("Missing required building: {0}")]
    UnsupportedBuilding(BuildingKind),

    /// The building cannot be placed or upgraded at this cell.
    #[error("Cannot place {building} at {at}")]
    InvalidPlacement {
        /// Building being placed.
        building: BuildingKind,
        /// Requested cell.
        at: Coord,
    },

    /// The building is already at (or queued to) its maximum level.
    #[error("{building} is already at maximum level {max_level}")]
    MaxLevelReached {
        /// Building being upgraded.
        building: BuildingKind,
        /// Maximum level from the ruleset.
        max_level: u8,
    },

    /// A training order asked for zero units.
    #[error("Quantity must be at least one")]
    InvalidQuantity,

    /// More units were committed than the empire owns.
    #[error("Insufficient units: need {requested} {unit}, have {available}")]
    InsufficientUnits {
        /// Unit type that is short.
        unit: UnitKind,
        /// Amount committed.
        requested: u32,
        /// Amount owned.
        available: u32,
    },

    /// The queue has reached its configured length limit.
    #[error("{0} queue is full")]
    QueueFull(crate::queue::QueueKind),
}

/// Top-level error type for data, save and serialization failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to read or write a file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Ruleset validation failed.
    #[error("Ruleset validation failed: {errors:?}")]
    Validation {
        /// Every problem found.
        errors: Vec<String>,
    },

    /// Binary encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Save file was written by an incompatible version.
    #[error("Save version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
