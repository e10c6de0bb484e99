//! Data structures for the game ruleset.
//!
//! This module contains the immutable definitions of units, buildings and
//! technologies plus the [`Ruleset`] registry that validates and indexes
//! them. Definitions deserialize from RON.

mod building_data;
mod ruleset;
mod tech_data;
mod unit_data;

pub use building_data::{BuildingData, BuildingKind, BuildingRequirement};
pub use ruleset::{CampAdvantage, CombatRules, EconomyRules, Ruleset, RulesetData};
pub use tech_data::{TechCategory, TechData, TechEffect, TechKey};
pub use unit_data::{UnitData, UnitKind};
