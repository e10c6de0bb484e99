//! Engine configuration and the starting state of a new game.
//!
//! # Example RON
//!
//! ```ron
//! (
//!     residual_policy: CarryForward,
//!     max_queue_len: 3,
//!     start: (
//!         resources: (food: 800, ore: 600),
//!         buildings: [(kind: TownHall, level: 2, position: (x: 4, y: 4))],
//!         map_width: 12,
//!         map_height: 12,
//!         camps: [(position: (x: 9, y: 2), camp: (kind: GoblinCamp, difficulty: 4))],
//!     ),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::data::{BuildingKind, TechKey};
use crate::map::{Camp, CampKind, Coord};
use crate::queue::{JobQueue, ResidualPolicy};
use crate::resources::Cost;
use crate::units::UnitCounts;

/// Default number of combat reports kept.
pub const DEFAULT_REPORT_HISTORY: usize = 20;

/// Tunables that are not part of the game rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How leftover tick time is handled when a job completes.
    pub residual_policy: ResidualPolicy,
    /// Maximum entries per queue.
    pub max_queue_len: usize,
    /// Combat reports kept before the oldest is dropped.
    pub report_history_limit: usize,
    /// State of a new game.
    pub start: StartingState,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            residual_policy: ResidualPolicy::default(),
            max_queue_len: JobQueue::DEFAULT_MAX_LEN,
            report_history_limit: DEFAULT_REPORT_HISTORY,
            start: StartingState::default(),
        }
    }
}

impl EngineConfig {
    /// Set the residual policy.
    #[must_use]
    pub fn with_residual_policy(mut self, policy: ResidualPolicy) -> Self {
        self.residual_policy = policy;
        self
    }

    /// Set the starting state.
    #[must_use]
    pub fn with_start(mut self, start: StartingState) -> Self {
        self.start = start;
        self
    }
}

/// A building present at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingBuilding {
    /// Building type.
    pub kind: BuildingKind,
    /// Starting level.
    pub level: u8,
    /// Map cell.
    pub position: Coord,
}

/// A camp present at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampPlacement {
    /// Map cell.
    pub position: Coord,
    /// The camp.
    pub camp: Camp,
}

/// Everything an empire owns when a new game begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingState {
    /// Starting stockpiles, clamped to capacity.
    pub resources: Cost,
    /// Pre-built buildings.
    pub buildings: Vec<StartingBuilding>,
    /// Starting army.
    pub units: UnitCounts,
    /// Technologies researched from the start.
    pub technologies: Vec<TechKey>,
    /// Map width in cells.
    pub map_width: u32,
    /// Map height in cells.
    pub map_height: u32,
    /// NPC camps.
    pub camps: Vec<CampPlacement>,
}

impl Default for StartingState {
    fn default() -> Self {
        Self {
            resources: Cost::new(500, 500),
            buildings: vec![
                StartingBuilding {
                    kind: BuildingKind::TownHall,
                    level: 1,
                    position: Coord::new(8, 8),
                },
                StartingBuilding {
                    kind: BuildingKind::Farm,
                    level: 1,
                    position: Coord::new(7, 8),
                },
                StartingBuilding {
                    kind: BuildingKind::Mine,
                    level: 1,
                    position: Coord::new(9, 8),
                },
            ],
            units: UnitCounts::new(),
            technologies: Vec::new(),
            map_width: 16,
            map_height: 16,
            camps: vec![
                CampPlacement {
                    position: Coord::new(13, 2),
                    camp: Camp::new(CampKind::GoblinCamp, 3, Cost::new(120, 60)),
                },
                CampPlacement {
                    position: Coord::new(2, 12),
                    camp: Camp::new(CampKind::BanditHideout, 8, Cost::new(200, 250)),
                },
                CampPlacement {
                    position: Coord::new(14, 14),
                    camp: Camp::new(CampKind::GoblinCamp, 15, Cost::new(600, 400)),
                },
            ],
        }
    }
}

impl StartingState {
    /// An empty map with no buildings, units or resources.
    #[must_use]
    pub fn bare(width: u32, height: u32) -> Self {
        Self {
            resources: Cost::ZERO,
            buildings: Vec::new(),
            units: UnitCounts::new(),
            technologies: Vec::new(),
            map_width: width,
            map_height: height,
            camps: Vec::new(),
        }
    }

    /// Add a pre-built building.
    #[must_use]
    pub fn with_building(mut self, kind: BuildingKind, level: u8, position: Coord) -> Self {
        self.buildings.push(StartingBuilding {
            kind,
            level,
            position,
        });
        self
    }

    /// Add a camp.
    #[must_use]
    pub fn with_camp(mut self, position: Coord, camp: Camp) -> Self {
        self.camps.push(CampPlacement { position, camp });
        self
    }

    /// Set the starting stockpiles.
    #[must_use]
    pub fn with_resources(mut self, resources: Cost) -> Self {
        self.resources = resources;
        self
    }

    /// Set the starting army.
    #[must_use]
    pub fn with_units(mut self, units: UnitCounts) -> Self {
        self.units = units;
        self
    }

    /// Add a technology researched from the start.
    #[must_use]
    pub fn with_technology(mut self, key: TechKey) -> Self {
        self.technologies.push(key);
        self
    }
}
