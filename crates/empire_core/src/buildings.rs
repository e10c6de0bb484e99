//! Owned buildings and the stats derived from their levels.
//!
//! Every derived value (storage, production, job speed, wall defense) is a
//! pure function of building levels and [`EconomyRules`], so it can be
//! recomputed at any time, including right after loading a save.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{BuildingKind, BuildingRequirement, EconomyRules};
use crate::error::{CommandError, CommandResult, Prerequisite};
use crate::map::Coord;

/// A building the empire owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedBuilding {
    /// Current level, at least 1.
    pub level: u8,
    /// Map cell the building stands on.
    pub position: Coord,
}

/// All buildings the empire owns, keyed by type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Buildings {
    owned: BTreeMap<BuildingKind, OwnedBuilding>,
}

impl Buildings {
    /// Create an empty set of buildings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of a building, `0` if not built.
    #[must_use]
    pub fn level(&self, kind: BuildingKind) -> u8 {
        self.owned.get(&kind).map_or(0, |b| b.level)
    }

    /// Owned building entry, if built.
    #[must_use]
    pub fn get(&self, kind: BuildingKind) -> Option<&OwnedBuilding> {
        self.owned.get(&kind)
    }

    /// Set a building's level and position.
    pub fn set(&mut self, kind: BuildingKind, level: u8, position: Coord) {
        self.owned.insert(kind, OwnedBuilding { level, position });
    }

    /// Iterate owned buildings in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (BuildingKind, &OwnedBuilding)> {
        self.owned.iter().map(|(kind, b)| (*kind, b))
    }

    /// Check whether a requirement is satisfied.
    #[must_use]
    pub fn meets(&self, requirement: BuildingRequirement) -> bool {
        self.level(requirement.building) >= requirement.level
    }

    /// Fail with the first unmet requirement.
    pub fn check_requirements(&self, requirements: &[BuildingRequirement]) -> CommandResult<()> {
        match requirements.iter().find(|r| !self.meets(**r)) {
            Some(r) => Err(CommandError::PrerequisiteNotMet(Prerequisite::BuildingLevel {
                building: r.building,
                level: r.level,
            })),
            None => Ok(()),
        }
    }

    /// Storage capacity from the base value and warehouse level, before bonuses.
    #[must_use]
    pub fn base_capacity(&self, rules: &EconomyRules) -> u32 {
        let warehouse = u32::from(self.level(BuildingKind::Warehouse));
        rules
            .base_capacity
            .saturating_add(warehouse.saturating_mul(rules.storage_per_warehouse_level))
    }

    /// Food produced per minute, before research bonuses.
    #[must_use]
    pub fn food_per_minute(&self, rules: &EconomyRules) -> u32 {
        let farms = u32::from(self.level(BuildingKind::Farm));
        let mut rate = farms.saturating_mul(rules.food_per_farm_level);
        if self.level(BuildingKind::TownHall) > 0 {
            rate = rate.saturating_add(rules.town_hall_food_per_minute);
        }
        rate
    }

    /// Ore produced per minute, before research bonuses.
    #[must_use]
    pub fn ore_per_minute(&self, rules: &EconomyRules) -> u32 {
        let mines = u32::from(self.level(BuildingKind::Mine));
        let mut rate = mines.saturating_mul(rules.ore_per_mine_level);
        if self.level(BuildingKind::TownHall) > 0 {
            rate = rate.saturating_add(rules.town_hall_ore_per_minute);
        }
        rate
    }

    /// Job speed of a hosting building in percent (100 = base speed).
    ///
    /// Level 1 runs at base speed; each further level adds the configured
    /// percentage. Unbuilt hosts also report base speed.
    #[must_use]
    pub fn speed_percent(&self, host: BuildingKind, rules: &EconomyRules) -> u32 {
        let per_level = match host {
            BuildingKind::TownHall => rules.construction_speed_percent_per_level,
            BuildingKind::Barracks => rules.training_speed_percent_per_level,
            BuildingKind::Library => rules.research_speed_percent_per_level,
            _ => 0,
        };
        let extra_levels = u32::from(self.level(host).saturating_sub(1));
        extra_levels.saturating_mul(per_level).saturating_add(100)
    }

    /// Defense from wall levels, before research bonuses.
    #[must_use]
    pub fn wall_defense(&self, rules: &EconomyRules) -> u32 {
        u32::from(self.level(BuildingKind::Wall)).saturating_mul(rules.wall_defense_per_level)
    }
}
