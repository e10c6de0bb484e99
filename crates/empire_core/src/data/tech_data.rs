//! Tech tree data structures for data-driven technology definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::building_data::BuildingRequirement;
use crate::resources::Cost;

/// Branch of the tech tree a technology belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TechCategory {
    /// Weapons, armor and tactics.
    Military,
    /// Production and storage.
    Economy,
    /// Fortifications.
    Defense,
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Military => "military",
            Self::Economy => "economy",
            Self::Defense => "defense",
        };
        f.write_str(name)
    }
}

/// Identity of a technology: its category plus an id unique in that category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TechKey {
    /// Tech tree branch.
    pub category: TechCategory,
    /// Identifier within the branch.
    pub id: String,
}

impl TechKey {
    /// Create a new tech key.
    #[must_use]
    pub fn new(category: TechCategory, id: impl Into<String>) -> Self {
        Self {
            category,
            id: id.into(),
        }
    }
}

impl fmt::Display for TechKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.id)
    }
}

/// A single effect granted by a researched technology.
///
/// Technologies list only the effects they actually grant; every other
/// bonus slot is implicitly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechEffect {
    /// Unit attack, percent (10 for +10%).
    UnitAttackPercent(i32),
    /// Unit defense, percent.
    UnitDefensePercent(i32),
    /// Food production, percent.
    FoodProductionPercent(i32),
    /// Ore production, percent.
    OreProductionPercent(i32),
    /// Flat storage capacity added to each resource.
    StorageCapacity(i32),
    /// Flat wall defense.
    WallDefense(i32),
    /// Percent points added to every camp advantage multiplier.
    CampAdvantagePercent(i32),
    /// Percent reduction of attacker casualties.
    CasualtyReductionPercent(i32),
}

/// Data-driven technology definition.
///
/// # Example RON
///
/// ```ron
/// TechData(
///     key: TechKey(category: Military, id: "bronze_weapons"),
///     name: "Bronze Weapons",
///     cost: Cost(food: 100, ore: 150),
///     research_time: 60,
///     required_buildings: [BuildingRequirement(building: Barracks, level: 1)],
///     prerequisites: [],
///     effects: [UnitAttackPercent(10)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechData {
    /// Unique key of this technology.
    pub key: TechKey,

    /// Display name.
    pub name: String,

    /// Resource cost to research.
    pub cost: Cost,

    /// Research time in seconds, before library speed.
    pub research_time: u32,

    /// Building levels that must be reached first.
    #[serde(default)]
    pub required_buildings: Vec<BuildingRequirement>,

    /// Technologies that must be researched first.
    #[serde(default)]
    pub prerequisites: Vec<TechKey>,

    /// Effects granted once researched.
    #[serde(default)]
    pub effects: Vec<TechEffect>,
}

impl TechData {
    /// Check if this technology has a specific prerequisite.
    #[must_use]
    pub fn requires(&self, key: &TechKey) -> bool {
        self.prerequisites.iter().any(|t| t == key)
    }
}
