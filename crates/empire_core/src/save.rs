//! Save games.
//!
//! A [`SaveGame`] is a plain snapshot of every persisted field. Derived
//! values (storage capacity, bonus vector) are never stored; the engine
//! recomputes them in [`crate::Engine::from_save`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buildings::Buildings;
use crate::combat::CombatReport;
use crate::error::{GameError, Result};
use crate::map::GameMap;
use crate::queue::JobQueue;
use crate::resources::ResourceLedger;
use crate::technology::TechTree;
use crate::units::UnitCounts;

/// Save file format version. Files with any other version are rejected.
pub const SAVE_VERSION: u32 = 1;

/// Persisted engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGame {
    /// Format version; always the first encoded field.
    pub version: u32,
    /// Ticks elapsed.
    pub turn: u64,
    /// Stockpiles.
    pub ledger: ResourceLedger,
    /// Owned buildings.
    pub buildings: Buildings,
    /// Army.
    pub units: UnitCounts,
    /// Researched technologies.
    pub technologies: TechTree,
    /// World map, camps included.
    pub map: GameMap,
    /// Construction queue with remaining times.
    pub construction: JobQueue,
    /// Training queue with remaining times.
    pub training: JobQueue,
    /// Research queue with remaining times.
    pub research: JobQueue,
    /// Combat history, oldest first.
    pub reports: Vec<CombatReport>,
}

impl SaveGame {
    /// Encode with bincode.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to encode save: {e}")))
    }

    /// Decode from bincode, checking the format version first.
    ///
    /// # Errors
    /// Returns an error if the version differs or decoding fails.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let version: u32 = bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to read save version: {e}")))?;
        if version != SAVE_VERSION {
            return Err(GameError::VersionMismatch {
                expected: SAVE_VERSION,
                found: version,
            });
        }

        bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to decode save: {e}")))
    }

    /// Save to a file.
    ///
    /// # Errors
    /// Returns an error if encoding or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), turn = self.turn, "Saved game");
        Ok(())
    }

    /// Load from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, the version check or decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }
}
