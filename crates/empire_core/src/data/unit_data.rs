//! Unit data structures for data-driven troop definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::Cost;

/// Troop types the empire can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Cheap infantry, strong against goblin camps.
    Spearman,
    /// Ranged infantry, strong against bandit hideouts.
    Archer,
    /// Expensive mounted troops with no camp advantage.
    Cavalry,
}

impl UnitKind {
    /// All unit kinds in a fixed order.
    pub const ALL: [Self; 3] = [Self::Spearman, Self::Archer, Self::Cavalry];
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spearman => "spearman",
            Self::Archer => "archer",
            Self::Cavalry => "cavalry",
        };
        f.write_str(name)
    }
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     kind: Spearman,
///     name: "Spearman",
///     attack: 10,
///     defense: 8,
///     cost: Cost(food: 30, ore: 20),
///     train_time: 20,
///     upkeep_per_minute: 1,
///     barracks_level: 1,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Which troop type this defines.
    pub kind: UnitKind,

    /// Display name.
    pub name: String,

    /// Base attack per unit.
    pub attack: u32,

    /// Base defense per unit.
    pub defense: u32,

    /// Cost of a single unit.
    pub cost: Cost,

    /// Training time of a single unit in seconds.
    pub train_time: u32,

    /// Food consumed per unit per minute.
    #[serde(default)]
    pub upkeep_per_minute: u32,

    /// Minimum barracks level needed to train this unit.
    #[serde(default = "default_barracks_level")]
    pub barracks_level: u8,
}

const fn default_barracks_level() -> u8 {
    1
}
