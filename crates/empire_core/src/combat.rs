//! Attack resolution against NPC camps.
//!
//! Power is computed in whole percent points and converted to fixed-point
//! once per value, so `10 archers × 8 × 110% × 120%` is exactly the
//! fixed-point nearest to `105.6` no matter how the factors are ordered.
//!
//! Everything here is pure. The engine validates targets and unit
//! ownership, then applies the outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{CombatRules, Ruleset, UnitKind};
use crate::map::{Camp, CampKind, Coord};
use crate::math::{fixed_serde, ratio, Fixed};
use crate::resources::Cost;
use crate::technology::BonusVector;
use crate::units::UnitCounts;

/// Scale of a power numerator: attack percent × advantage percent.
const POWER_SCALE: i64 = 100 * 100;

/// Result of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Attack power exceeded the camp's defense.
    Victory,
    /// Attack power did not exceed the camp's defense (ties included).
    Defeat,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory => f.write_str("victory"),
            Self::Defeat => f.write_str("defeat"),
        }
    }
}

/// One unit type's share of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitContribution {
    /// Unit type.
    pub unit: UnitKind,
    /// Units committed.
    pub count: u32,
    /// Attack power after bonuses and advantage.
    #[serde(with = "fixed_serde")]
    pub attack_power: Fixed,
    /// Effective advantage percent against the camp, if the unit has one.
    pub advantage_percent: Option<u32>,
}

/// Predicted result of an attack, without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPreview {
    /// Camp cell.
    pub target: Coord,
    /// Camp type.
    pub camp: CampKind,
    /// Sum of every contribution.
    #[serde(with = "fixed_serde")]
    pub total_attack_power: Fixed,
    /// Camp defense.
    pub target_defense: u32,
    /// Predicted outcome.
    pub outcome: Outcome,
    /// Per unit type breakdown, in unit-kind order.
    pub contributions: Vec<UnitContribution>,
}

/// Record of a committed attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    /// Turn the attack happened on.
    pub turn: u64,
    /// Camp cell.
    pub target: Coord,
    /// Camp type.
    pub camp: CampKind,
    /// Camp difficulty.
    pub difficulty: u32,
    /// Units sent.
    pub committed: UnitCounts,
    /// Units that did not return.
    pub losses: UnitCounts,
    /// Attack power of the committed force.
    #[serde(with = "fixed_serde")]
    pub total_attack_power: Fixed,
    /// Camp defense.
    pub target_defense: u32,
    /// Outcome.
    pub outcome: Outcome,
    /// Resources taken; zero on defeat.
    pub loot: Cost,
}

/// Effective advantage percent of a unit against a camp type.
///
/// Research adds flat percent points on top of the declared base; units
/// without a declared advantage get none.
#[must_use]
pub fn advantage_percent(
    ruleset: &Ruleset,
    bonuses: &BonusVector,
    unit: UnitKind,
    camp: CampKind,
) -> Option<u32> {
    ruleset.advantage(unit, camp).map(|base| {
        let total = i64::from(base) + i64::from(bonuses.camp_advantage_percent);
        u32::try_from(total.max(0)).unwrap_or(u32::MAX)
    })
}

fn power_numerator(
    ruleset: &Ruleset,
    bonuses: &BonusVector,
    unit: UnitKind,
    count: u32,
    advantage: Option<u32>,
) -> i128 {
    let attack_percent = if bonuses.unit_attack_percent > 0 {
        100 + i128::from(bonuses.unit_attack_percent)
    } else {
        100
    };
    let advantage_percent = advantage.map_or(100, i128::from);
    i128::from(count) * i128::from(ruleset.unit(unit).attack) * attack_percent * advantage_percent
}

fn to_power(numerator: i128) -> Fixed {
    let clamped = i64::try_from(numerator).unwrap_or(i64::MAX);
    ratio(clamped, POWER_SCALE)
}

/// Compute attack power of `units` against `camp` at `target`.
#[must_use]
pub fn compute_attack(
    ruleset: &Ruleset,
    bonuses: &BonusVector,
    target: Coord,
    camp: &Camp,
    units: &UnitCounts,
) -> AttackPreview {
    let mut total: i128 = 0;
    let contributions: Vec<UnitContribution> = units
        .iter()
        .map(|(unit, count)| {
            let advantage = advantage_percent(ruleset, bonuses, unit, camp.kind);
            let numerator = power_numerator(ruleset, bonuses, unit, count, advantage);
            total = total.saturating_add(numerator);
            UnitContribution {
                unit,
                count,
                attack_power: to_power(numerator),
                advantage_percent: advantage,
            }
        })
        .collect();

    let total_attack_power = to_power(total);
    let target_defense = camp.defense();
    let outcome = if total_attack_power > Fixed::saturating_from_num(target_defense) {
        Outcome::Victory
    } else {
        Outcome::Defeat
    };

    AttackPreview {
        target,
        camp: camp.kind,
        total_attack_power,
        target_defense,
        outcome,
        contributions,
    }
}

/// Units lost by the attacking force.
///
/// A defeat loses `defeat_loss_percent` of every type. A victory loses
/// `victory_loss_percent` scaled by `defense / power`. Both are then cut by
/// the casualty reduction bonus. Per-type losses round down.
#[must_use]
pub fn compute_losses(
    rules: &CombatRules,
    bonuses: &BonusVector,
    preview: &AttackPreview,
) -> UnitCounts {
    let reduction = bonuses.casualty_reduction_percent.clamp(0, 100).unsigned_abs();
    let kept_percent = u128::from(100 - reduction);

    // rate = numerator / denominator, as a fraction of one
    let (numerator, denominator) = match preview.outcome {
        Outcome::Defeat => (u128::from(rules.defeat_loss_percent) * kept_percent, 100 * 100),
        Outcome::Victory => {
            // power is in fixed-point bits, so scale the defense to match
            let power_bits = u128::try_from(preview.total_attack_power.to_bits()).unwrap_or(0);
            (
                (u128::from(rules.victory_loss_percent)
                    * u128::from(preview.target_defense)
                    * kept_percent)
                    << Fixed::FRAC_NBITS,
                power_bits * 100 * 100,
            )
        }
    };

    preview
        .contributions
        .iter()
        .map(|c| {
            let lost = if denominator == 0 {
                0
            } else {
                u128::from(c.count) * numerator / denominator
            };
            (c.unit, u32::try_from(lost).unwrap_or(u32::MAX).min(c.count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TechEffect;

    fn goblins(difficulty: u32) -> Camp {
        Camp::new(CampKind::GoblinCamp, difficulty, Cost::new(100, 50))
    }

    fn bandits(difficulty: u32) -> Camp {
        Camp::new(CampKind::BanditHideout, difficulty, Cost::ZERO)
    }

    fn attack(camp: &Camp, bonuses: &BonusVector, units: &UnitCounts) -> AttackPreview {
        compute_attack(&Ruleset::standard(), bonuses, Coord::new(3, 3), camp, units)
    }

    #[test]
    fn test_spearmen_against_goblins() {
        let preview = attack(
            &goblins(5),
            &BonusVector::default(),
            &UnitCounts::new().with(UnitKind::Spearman, 5),
        );
        assert_eq!(preview.total_attack_power, Fixed::from_num(60));
        assert_eq!(preview.contributions[0].advantage_percent, Some(120));
    }

    #[test]
    fn test_archers_with_attack_bonus_against_bandits() {
        let mut bonuses = BonusVector::default();
        bonuses.apply(TechEffect::UnitAttackPercent(10));
        let preview = attack(
            &bandits(20),
            &bonuses,
            &UnitCounts::new().with(UnitKind::Archer, 10),
        );
        assert_eq!(preview.total_attack_power, ratio(1056, 10));
        assert!(preview.total_attack_power > Fixed::from_num(105.59));
        assert!(preview.total_attack_power < Fixed::from_num(105.61));
    }

    #[test]
    fn test_cavalry_has_no_advantage() {
        let cavalry = UnitCounts::new().with(UnitKind::Cavalry, 5);
        for camp in [goblins(1), bandits(1)] {
            let preview = attack(&camp, &BonusVector::default(), &cavalry);
            assert_eq!(preview.total_attack_power, Fixed::from_num(60));
            assert_eq!(preview.contributions[0].advantage_percent, None);
        }
    }

    #[test]
    fn test_victory_requires_strictly_more_power() {
        let spearmen = UnitCounts::new().with(UnitKind::Spearman, 5);
        let preview = attack(&goblins(5), &BonusVector::default(), &spearmen);
        assert_eq!(preview.target_defense, 50);
        assert_eq!(preview.outcome, Outcome::Victory);

        let tie = attack(&goblins(6), &BonusVector::default(), &spearmen);
        assert_eq!(tie.outcome, Outcome::Defeat);
    }

    #[test]
    fn test_negative_attack_bonus_is_ignored() {
        let mut bonuses = BonusVector::default();
        bonuses.apply(TechEffect::UnitAttackPercent(-20));
        let preview = attack(&goblins(1), &bonuses, &UnitCounts::new().with(UnitKind::Cavalry, 1));
        assert_eq!(preview.total_attack_power, Fixed::from_num(12));
    }

    #[test]
    fn test_advantage_bonus_adds_percent_points() {
        let mut bonuses = BonusVector::default();
        bonuses.apply(TechEffect::CampAdvantagePercent(10));
        let preview = attack(&goblins(1), &bonuses, &UnitCounts::new().with(UnitKind::Spearman, 5));
        assert_eq!(preview.contributions[0].advantage_percent, Some(130));
        assert_eq!(preview.total_attack_power, Fixed::from_num(65));
    }

    #[test]
    fn test_mixed_force_sums_contributions() {
        let units = UnitCounts::new()
            .with(UnitKind::Spearman, 5)
            .with(UnitKind::Cavalry, 5);
        let preview = attack(&goblins(1), &BonusVector::default(), &units);
        assert_eq!(preview.contributions.len(), 2);
        assert_eq!(preview.total_attack_power, Fixed::from_num(120));
    }

    #[test]
    fn test_victory_losses_scale_with_resistance() {
        let rules = CombatRules::default();
        let preview = attack(
            &goblins(5),
            &BonusVector::default(),
            &UnitCounts::new().with(UnitKind::Spearman, 5),
        );
        // 50% × 50 / 60 of 5 is 2.08
        let losses = compute_losses(&rules, &BonusVector::default(), &preview);
        assert_eq!(losses.get(UnitKind::Spearman), 2);
    }

    #[test]
    fn test_defeat_losses_and_casualty_reduction() {
        let rules = CombatRules::default();
        let units = UnitCounts::new().with(UnitKind::Cavalry, 10);
        let preview = attack(&goblins(50), &BonusVector::default(), &units);
        assert_eq!(preview.outcome, Outcome::Defeat);
        assert_eq!(
            compute_losses(&rules, &BonusVector::default(), &preview).get(UnitKind::Cavalry),
            6
        );

        let mut medicine = BonusVector::default();
        medicine.apply(TechEffect::CasualtyReductionPercent(25));
        assert_eq!(compute_losses(&rules, &medicine, &preview).get(UnitKind::Cavalry), 4);

        medicine.apply(TechEffect::CasualtyReductionPercent(200));
        assert!(compute_losses(&rules, &medicine, &preview).is_empty());
    }
}
