//! Building data structures for data-driven building definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::Cost;

/// Building types an empire can own. One instance of each at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Seat of government; speeds up construction.
    TownHall,
    /// Produces food.
    Farm,
    /// Produces ore.
    Mine,
    /// Raises storage capacity.
    Warehouse,
    /// Trains troops; speeds up training.
    Barracks,
    /// Hosts research; speeds up research.
    Library,
    /// Adds to the empire's defense.
    Wall,
}

impl BuildingKind {
    /// All building kinds in a fixed order.
    pub const ALL: [Self; 7] = [
        Self::TownHall,
        Self::Farm,
        Self::Mine,
        Self::Warehouse,
        Self::Barracks,
        Self::Library,
        Self::Wall,
    ];
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TownHall => "town hall",
            Self::Farm => "farm",
            Self::Mine => "mine",
            Self::Warehouse => "warehouse",
            Self::Barracks => "barracks",
            Self::Library => "library",
            Self::Wall => "wall",
        };
        f.write_str(name)
    }
}

/// Minimum level of a building required by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingRequirement {
    /// Building that must exist.
    pub building: BuildingKind,
    /// Minimum level.
    pub level: u8,
}

impl BuildingRequirement {
    /// Create a new requirement.
    #[must_use]
    pub const fn new(building: BuildingKind, level: u8) -> Self {
        Self { building, level }
    }
}

/// Data-driven building definition.
///
/// Costs and build times grow geometrically with the target level:
/// level 1 uses the base values, every further level multiplies the
/// previous one by the growth percentage.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     kind: Barracks,
///     name: "Barracks",
///     base_cost: Cost(food: 80, ore: 120),
///     cost_growth_percent: 160,
///     build_time: 45,
///     time_growth_percent: 150,
///     max_level: 10,
///     requires: [BuildingRequirement(building: TownHall, level: 1)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Which building this defines.
    pub kind: BuildingKind,

    /// Display name.
    pub name: String,

    /// Cost of level 1.
    pub base_cost: Cost,

    /// Per-level cost multiplier in percent (150 = x1.5 per level).
    #[serde(default = "default_growth")]
    pub cost_growth_percent: u32,

    /// Build time of level 1 in seconds.
    pub build_time: u32,

    /// Per-level build-time multiplier in percent.
    #[serde(default = "default_growth")]
    pub time_growth_percent: u32,

    /// Highest reachable level.
    pub max_level: u8,

    /// Other buildings that must exist first.
    #[serde(default)]
    pub requires: Vec<BuildingRequirement>,
}

const fn default_growth() -> u32 {
    150
}

impl BuildingData {
    /// Cost of constructing or upgrading to `level`.
    #[must_use]
    pub fn cost_at(&self, level: u8) -> Cost {
        (1..level).fold(self.base_cost, |cost, _| {
            cost.scaled_percent(self.cost_growth_percent)
        })
    }

    /// Base build time in seconds for `level`, before speed bonuses.
    #[must_use]
    pub fn build_time_at(&self, level: u8) -> u32 {
        let time = (1..level).fold(u64::from(self.build_time), |time, _| {
            time.saturating_mul(u64::from(self.time_growth_percent)) / 100
        });
        u32::try_from(time).unwrap_or(u32::MAX)
    }
}
