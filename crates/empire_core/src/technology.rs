//! Technology effect aggregation.
//!
//! The [`BonusVector`] is never updated incrementally. Every change to the
//! researched set, and every load, triggers a full recompute over the
//! ruleset, so the vector always matches the current research state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::buildings::Buildings;
use crate::data::{Ruleset, TechData, TechEffect, TechKey};
use crate::error::{CommandError, CommandResult, Prerequisite};
use crate::resources::ResourceLedger;

/// Aggregated research bonuses.
///
/// Percent slots are whole percent points (10 = +10%); the storage and
/// wall slots are flat amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BonusVector {
    /// Unit attack bonus, percent.
    pub unit_attack_percent: i32,
    /// Unit defense bonus, percent.
    pub unit_defense_percent: i32,
    /// Food production bonus, percent.
    pub food_production_percent: i32,
    /// Ore production bonus, percent.
    pub ore_production_percent: i32,
    /// Flat storage capacity.
    pub storage_capacity: i32,
    /// Flat wall defense.
    pub wall_defense: i32,
    /// Added on top of every base camp advantage, percent points.
    pub camp_advantage_percent: i32,
    /// Attacker casualty reduction, percent.
    pub casualty_reduction_percent: i32,
}

impl BonusVector {
    /// Fold one effect into the vector. Slots saturate at the `i32` range.
    pub fn apply(&mut self, effect: TechEffect) {
        let (slot, v) = match effect {
            TechEffect::UnitAttackPercent(v) => (&mut self.unit_attack_percent, v),
            TechEffect::UnitDefensePercent(v) => (&mut self.unit_defense_percent, v),
            TechEffect::FoodProductionPercent(v) => (&mut self.food_production_percent, v),
            TechEffect::OreProductionPercent(v) => (&mut self.ore_production_percent, v),
            TechEffect::StorageCapacity(v) => (&mut self.storage_capacity, v),
            TechEffect::WallDefense(v) => (&mut self.wall_defense, v),
            TechEffect::CampAdvantagePercent(v) => (&mut self.camp_advantage_percent, v),
            TechEffect::CasualtyReductionPercent(v) => (&mut self.casualty_reduction_percent, v),
        };
        *slot = slot.saturating_add(v);
    }
}

/// The empire's research state and the bonuses derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TechTree {
    researched: BTreeSet<TechKey>,
    #[serde(skip)]
    bonuses: BonusVector,
}

impl TechTree {
    /// Create a tree with nothing researched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a technology has been researched.
    #[must_use]
    pub fn is_researched(&self, key: &TechKey) -> bool {
        self.researched.contains(key)
    }

    /// All researched technologies in key order.
    pub fn researched(&self) -> impl Iterator<Item = &TechKey> {
        self.researched.iter()
    }

    /// Current bonus vector.
    #[must_use]
    pub const fn bonuses(&self) -> &BonusVector {
        &self.bonuses
    }

    /// Mark a technology researched. Returns `false` if it already was.
    ///
    /// Does not recompute bonuses; call [`TechTree::recompute_bonuses`].
    pub fn mark_researched(&mut self, key: TechKey) -> bool {
        self.researched.insert(key)
    }

    /// Validate a research order, returning the definition on success.
    ///
    /// Prerequisite technologies are checked one level deep only: the
    /// declared prerequisites must be researched, their own prerequisites
    /// are not walked.
    pub fn check_research<'r>(
        &self,
        key: &TechKey,
        ruleset: &'r Ruleset,
        buildings: &Buildings,
        ledger: &ResourceLedger,
    ) -> CommandResult<&'r TechData> {
        let tech = ruleset
            .technology(key)
            .ok_or_else(|| CommandError::UnknownTechnology(key.clone()))?;

        if self.is_researched(key) {
            return Err(CommandError::AlreadyResearched(key.clone()));
        }

        buildings.check_requirements(&tech.required_buildings)?;

        if let Some(missing) = tech.prerequisites.iter().find(|p| !self.is_researched(p)) {
            return Err(CommandError::PrerequisiteNotMet(Prerequisite::Technology(
                missing.clone(),
            )));
        }

        ledger.check_affordable(tech.cost)?;
        Ok(tech)
    }

    /// True iff the technology could be researched right now.
    #[must_use]
    pub fn can_research(
        &self,
        key: &TechKey,
        ruleset: &Ruleset,
        buildings: &Buildings,
        ledger: &ResourceLedger,
    ) -> bool {
        self.check_research(key, ruleset, buildings, ledger).is_ok()
    }

    /// Reset the bonus vector and re-sum every researched technology.
    ///
    /// Researched keys missing from the ruleset contribute nothing.
    pub fn recompute_bonuses(&mut self, ruleset: &Ruleset) -> &BonusVector {
        let mut bonuses = BonusVector::default();
        for tech in ruleset.technologies() {
            if self.researched.contains(&tech.key) {
                for effect in &tech.effects {
                    bonuses.apply(*effect);
                }
            }
        }
        self.bonuses = bonuses;
        &self.bonuses
    }
}
