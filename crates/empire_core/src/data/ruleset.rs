//! Validated registry of every game definition.
//!
//! [`RulesetData`] is the raw, file-shaped form. [`Ruleset`] is built from it
//! only after validation, and guarantees that every [`UnitKind`] and
//! [`BuildingKind`] has exactly one definition, so lookups by kind never fail.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::building_data::{BuildingData, BuildingKind, BuildingRequirement};
use super::tech_data::{TechCategory, TechData, TechEffect, TechKey};
use super::unit_data::{UnitData, UnitKind};
use crate::error::{GameError, Result};
use crate::map::CampKind;
use crate::resources::Cost;

/// Base advantage multiplier of a unit type against a camp type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampAdvantage {
    /// Attacking unit type.
    pub unit: UnitKind,
    /// Defending camp type.
    pub camp: CampKind,
    /// Multiplier in percent (120 = x1.20).
    pub percent: u32,
}

/// Production, storage and speed constants.
///
/// Production rates are per minute; speed bonuses are percent per building
/// level above the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Storage capacity with no warehouse or bonus.
    pub base_capacity: u32,
    /// Storage added per warehouse level.
    pub storage_per_warehouse_level: u32,
    /// Food the town hall produces per minute.
    pub town_hall_food_per_minute: u32,
    /// Ore the town hall produces per minute.
    pub town_hall_ore_per_minute: u32,
    /// Food per farm level per minute.
    pub food_per_farm_level: u32,
    /// Ore per mine level per minute.
    pub ore_per_mine_level: u32,
    /// Town hall construction speed-up per level.
    pub construction_speed_percent_per_level: u32,
    /// Barracks training speed-up per level.
    pub training_speed_percent_per_level: u32,
    /// Library research speed-up per level.
    pub research_speed_percent_per_level: u32,
    /// Defense added per wall level.
    pub wall_defense_per_level: u32,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            base_capacity: 1000,
            storage_per_warehouse_level: 500,
            town_hall_food_per_minute: 30,
            town_hall_ore_per_minute: 30,
            food_per_farm_level: 60,
            ore_per_mine_level: 45,
            construction_speed_percent_per_level: 10,
            training_speed_percent_per_level: 10,
            research_speed_percent_per_level: 10,
            wall_defense_per_level: 25,
        }
    }
}

/// Attacker casualty rates used when committing an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Share of committed units lost on defeat, percent.
    pub defeat_loss_percent: u32,
    /// Share lost on victory when defense equals attack, percent.
    /// Scaled down by `defense / attack`.
    pub victory_loss_percent: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            defeat_loss_percent: 60,
            victory_loss_percent: 50,
        }
    }
}

/// File-shaped ruleset, as written in RON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetData {
    /// One entry per unit kind.
    pub units: Vec<UnitData>,
    /// One entry per building kind.
    pub buildings: Vec<BuildingData>,
    /// Every technology.
    #[serde(default)]
    pub technologies: Vec<TechData>,
    /// Unit-vs-camp advantages.
    #[serde(default)]
    pub advantages: Vec<CampAdvantage>,
    /// Economy constants.
    #[serde(default)]
    pub economy: EconomyRules,
    /// Combat constants.
    #[serde(default)]
    pub combat: CombatRules,
}

/// Validated, indexed game definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RulesetData", into = "RulesetData")]
pub struct Ruleset {
    units: [UnitData; 3],
    buildings: [BuildingData; 7],
    technologies: BTreeMap<TechKey, TechData>,
    advantages: BTreeMap<(UnitKind, CampKind), u32>,
    economy: EconomyRules,
    combat: CombatRules,
}

impl TryFrom<RulesetData> for Ruleset {
    type Error = GameError;

    fn try_from(data: RulesetData) -> Result<Self> {
        Self::new(data)
    }
}

impl From<Ruleset> for RulesetData {
    fn from(ruleset: Ruleset) -> Self {
        ruleset.to_data()
    }
}

impl Ruleset {
    /// Validate and index raw definitions.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Validation`] listing every problem found.
    pub fn new(data: RulesetData) -> Result<Self> {
        let errors = validate(&data);
        if !errors.is_empty() {
            return Err(GameError::Validation { errors });
        }

        let RulesetData {
            mut units,
            mut buildings,
            technologies,
            advantages,
            economy,
            combat,
        } = data;

        units.sort_by_key(|u| u.kind);
        buildings.sort_by_key(|b| b.kind);
        let units: [UnitData; 3] = units
            .try_into()
            .map_err(|_| GameError::InvalidState("unit table size".to_string()))?;
        let buildings: [BuildingData; 7] = buildings
            .try_into()
            .map_err(|_| GameError::InvalidState("building table size".to_string()))?;

        Ok(Self {
            units,
            buildings,
            technologies: technologies
                .into_iter()
                .map(|t| (t.key.clone(), t))
                .collect(),
            advantages: advantages
                .into_iter()
                .map(|a| ((a.unit, a.camp), a.percent))
                .collect(),
            economy,
            combat,
        })
    }

    /// Parse and validate a ruleset from RON text.
    ///
    /// `origin` names the source in error messages.
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self> {
        let data: RulesetData = ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Self::new(data)
    }

    /// Load and validate a ruleset from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ruleset = Self::from_ron_str(&text, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            technologies = ruleset.technologies.len(),
            "Loaded ruleset"
        );
        Ok(ruleset)
    }

    /// Render the ruleset back to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(&self.to_data(), ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Convert back to the file-shaped form.
    #[must_use]
    pub fn to_data(&self) -> RulesetData {
        RulesetData {
            units: self.units.to_vec(),
            buildings: self.buildings.to_vec(),
            technologies: self.technologies.values().cloned().collect(),
            advantages: self
                .advantages
                .iter()
                .map(|(&(unit, camp), &percent)| CampAdvantage {
                    unit,
                    camp,
                    percent,
                })
                .collect(),
            economy: self.economy,
            combat: self.combat,
        }
    }

    /// Definition of a unit kind.
    #[must_use]
    pub fn unit(&self, kind: UnitKind) -> &UnitData {
        &self.units[kind as usize]
    }

    /// Definition of a building kind.
    #[must_use]
    pub fn building(&self, kind: BuildingKind) -> &BuildingData {
        &self.buildings[kind as usize]
    }

    /// Look up a technology.
    #[must_use]
    pub fn technology(&self, key: &TechKey) -> Option<&TechData> {
        self.technologies.get(key)
    }

    /// All technologies in key order.
    pub fn technologies(&self) -> impl Iterator<Item = &TechData> {
        self.technologies.values()
    }

    /// Base advantage percent of a unit against a camp type, if declared.
    #[must_use]
    pub fn advantage(&self, unit: UnitKind, camp: CampKind) -> Option<u32> {
        self.advantages.get(&(unit, camp)).copied()
    }

    /// Economy constants.
    #[must_use]
    pub const fn economy(&self) -> &EconomyRules {
        &self.economy
    }

    /// Combat constants.
    #[must_use]
    pub const fn combat(&self) -> &CombatRules {
        &self.combat
    }

    /// The base ruleset shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        use BuildingKind::{Barracks, Farm, Library, Mine, TownHall, Wall, Warehouse};
        use TechCategory::{Defense, Economy, Military};

        let unit = |kind, name: &str, attack, defense, cost, train_time, upkeep, barracks| {
            UnitData {
                kind,
                name: name.to_string(),
                attack,
                defense,
                cost,
                train_time,
                upkeep_per_minute: upkeep,
                barracks_level: barracks,
            }
        };
        let building = |kind, name: &str, cost, cost_growth, time, time_growth, requires| {
            BuildingData {
                kind,
                name: name.to_string(),
                base_cost: cost,
                cost_growth_percent: cost_growth,
                build_time: time,
                time_growth_percent: time_growth,
                max_level: 10,
                requires,
            }
        };
        let req = BuildingRequirement::new;
        let tech = |category, id: &str, name: &str, cost, time, required, prerequisites, effects| {
            TechData {
                key: TechKey::new(category, id),
                name: name.to_string(),
                cost,
                research_time: time,
                required_buildings: required,
                prerequisites,
                effects,
            }
        };

        #[rustfmt::skip]
        let technologies = vec![
            tech(Military, "bronze_weapons", "Bronze Weapons", Cost::new(100, 150), 60,
                vec![req(Barracks, 1)], vec![], vec![TechEffect::UnitAttackPercent(10)]),
            tech(Military, "iron_armor", "Iron Armor", Cost::new(120, 200), 90,
                vec![req(Barracks, 2)], vec![TechKey::new(Military, "bronze_weapons")],
                vec![TechEffect::UnitDefensePercent(15)]),
            tech(Military, "tactics", "Tactics", Cost::new(150, 150), 120,
                vec![req(Library, 2)], vec![TechKey::new(Military, "bronze_weapons")],
                vec![TechEffect::CampAdvantagePercent(10)]),
            tech(Military, "field_medicine", "Field Medicine", Cost::new(200, 100), 120,
                vec![req(Library, 2)], vec![], vec![TechEffect::CasualtyReductionPercent(25)]),
            tech(Economy, "irrigation", "Irrigation", Cost::new(80, 60), 45,
                vec![req(Farm, 1)], vec![], vec![TechEffect::FoodProductionPercent(15)]),
            tech(Economy, "deep_mining", "Deep Mining", Cost::new(60, 100), 60,
                vec![req(Mine, 2)], vec![], vec![TechEffect::OreProductionPercent(15)]),
            tech(Economy, "granaries", "Granaries", Cost::new(150, 150), 90,
                vec![req(Warehouse, 1)], vec![TechKey::new(Economy, "irrigation")],
                vec![TechEffect::StorageCapacity(500)]),
            tech(Defense, "masonry", "Masonry", Cost::new(50, 150), 60,
                vec![req(Wall, 1)], vec![], vec![TechEffect::WallDefense(50)]),
            tech(Defense, "fortification", "Fortification", Cost::new(100, 250), 120,
                vec![req(Wall, 2)], vec![TechKey::new(Defense, "masonry")],
                vec![TechEffect::WallDefense(100), TechEffect::UnitDefensePercent(5)]),
        ];

        #[rustfmt::skip]
        let buildings = [
            building(TownHall, "Town Hall", Cost::new(200, 200), 150, 60, 150, vec![]),
            building(Farm, "Farm", Cost::new(40, 60), 150, 30, 140, vec![req(TownHall, 1)]),
            building(Mine, "Mine", Cost::new(60, 40), 150, 30, 140, vec![req(TownHall, 1)]),
            building(Warehouse, "Warehouse", Cost::new(80, 80), 150, 40, 140,
                vec![req(TownHall, 1)]),
            building(Barracks, "Barracks", Cost::new(80, 120), 160, 45, 150,
                vec![req(TownHall, 1)]),
            building(Library, "Library", Cost::new(120, 100), 160, 60, 150,
                vec![req(TownHall, 2)]),
            building(Wall, "Wall", Cost::new(50, 150), 150, 50, 150, vec![req(TownHall, 2)]),
        ];

        Self {
            units: [
                unit(UnitKind::Spearman, "Spearman", 10, 8, Cost::new(30, 20), 20, 1, 1),
                unit(UnitKind::Archer, "Archer", 8, 5, Cost::new(25, 35), 25, 1, 2),
                unit(UnitKind::Cavalry, "Cavalry", 12, 10, Cost::new(60, 80), 40, 2, 3),
            ],
            buildings,
            technologies: technologies
                .into_iter()
                .map(|t| (t.key.clone(), t))
                .collect(),
            advantages: [
                ((UnitKind::Spearman, CampKind::GoblinCamp), 120),
                ((UnitKind::Archer, CampKind::BanditHideout), 120),
            ]
            .into_iter()
            .collect(),
            economy: EconomyRules::default(),
            combat: CombatRules::default(),
        }
    }
}

/// Collect every validation problem in raw definitions.
fn validate(data: &RulesetData) -> Vec<String> {
    let mut errors = Vec::new();

    for kind in UnitKind::ALL {
        let count = data.units.iter().filter(|u| u.kind == kind).count();
        if count != 1 {
            errors.push(format!("unit {kind} defined {count} times, expected once"));
        }
    }

    for kind in BuildingKind::ALL {
        let count = data.buildings.iter().filter(|b| b.kind == kind).count();
        if count != 1 {
            errors.push(format!("building {kind} defined {count} times, expected once"));
        }
    }
    for building in &data.buildings {
        if building.max_level == 0 {
            errors.push(format!("building {} has max_level 0", building.kind));
        }
        if building.requires.iter().any(|r| r.building == building.kind) {
            errors.push(format!("building {} requires itself", building.kind));
        }
    }

    let mut keys = BTreeSet::new();
    for tech in &data.technologies {
        if tech.key.id.is_empty() {
            errors.push(format!("technology in {} has an empty id", tech.key.category));
        }
        if !keys.insert(&tech.key) {
            errors.push(format!("technology {} defined more than once", tech.key));
        }
    }
    for tech in &data.technologies {
        for prerequisite in &tech.prerequisites {
            if prerequisite == &tech.key {
                errors.push(format!("technology {} requires itself", tech.key));
            } else if !keys.contains(prerequisite) {
                errors.push(format!(
                    "technology {} requires unknown technology {prerequisite}",
                    tech.key
                ));
            }
        }
    }

    let mut pairs = BTreeSet::new();
    for advantage in &data.advantages {
        if advantage.percent == 0 {
            errors.push(format!(
                "advantage of {} against {} must be positive",
                advantage.unit, advantage.camp
            ));
        }
        if !pairs.insert((advantage.unit, advantage.camp)) {
            errors.push(format!(
                "advantage of {} against {} declared more than once",
                advantage.unit, advantage.camp
            ));
        }
    }

    errors
}
