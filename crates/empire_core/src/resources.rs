//! Resource ledger: food and ore stockpiles with a storage cap.
//!
//! Costs are whole numbers; stockpiles are fixed-point so that fractional
//! per-tick production accumulates exactly. Every mutation keeps each
//! amount inside `[0, capacity]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, CommandResult};
use crate::math::{fixed_serde, Fixed};

/// The two fungible resources of an empire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Feeds the population and army upkeep.
    Food,
    /// Raw material for buildings, weapons and research.
    Ore,
}

impl ResourceKind {
    /// All resource kinds in ledger order.
    pub const ALL: [Self; 2] = [Self::Food, Self::Ore];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Food => write!(f, "food"),
            Self::Ore => write!(f, "ore"),
        }
    }
}

/// A whole-number price or loot table in both resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Food component.
    #[serde(default)]
    pub food: u32,
    /// Ore component.
    #[serde(default)]
    pub ore: u32,
}

impl Cost {
    /// Zero cost.
    pub const ZERO: Self = Self { food: 0, ore: 0 };

    /// Create a new cost.
    #[must_use]
    pub const fn new(food: u32, ore: u32) -> Self {
        Self { food, ore }
    }

    /// Amount of a single resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Ore => self.ore,
        }
    }

    /// Multiply both components, saturating at `u32::MAX`.
    #[must_use]
    pub const fn times(self, factor: u32) -> Self {
        Self {
            food: self.food.saturating_mul(factor),
            ore: self.ore.saturating_mul(factor),
        }
    }

    /// Scale both components by `percent` percent, rounding down.
    #[must_use]
    pub fn scaled_percent(self, percent: u32) -> Self {
        let scale = |v: u32| {
            let scaled = u64::from(v) * u64::from(percent) / 100;
            u32::try_from(scaled).unwrap_or(u32::MAX)
        };
        Self {
            food: scale(self.food),
            ore: scale(self.ore),
        }
    }
}

impl std::ops::Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            food: self.food.saturating_add(rhs.food),
            ore: self.ore.saturating_add(rhs.ore),
        }
    }
}

/// Signed per-resource change applied by production, upkeep or loot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDelta {
    /// Food change.
    #[serde(with = "fixed_serde")]
    pub food: Fixed,
    /// Ore change.
    #[serde(with = "fixed_serde")]
    pub ore: Fixed,
}

impl ResourceDelta {
    /// Create a new delta.
    #[must_use]
    pub const fn new(food: Fixed, ore: Fixed) -> Self {
        Self { food, ore }
    }
}

impl From<Cost> for ResourceDelta {
    fn from(cost: Cost) -> Self {
        Self {
            food: Fixed::saturating_from_num(cost.food),
            ore: Fixed::saturating_from_num(cost.ore),
        }
    }
}

/// Holds the empire's stockpiles and the derived storage capacity.
///
/// Capacity is never persisted: it is re-derived from buildings and the
/// bonus vector via [`ResourceLedger::recompute_capacity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    #[serde(with = "fixed_serde")]
    food: Fixed,
    #[serde(with = "fixed_serde")]
    ore: Fixed,
    #[serde(skip)]
    capacity: Fixed,
}

impl ResourceLedger {
    /// Create a ledger with starting amounts, clamped to `capacity`.
    #[must_use]
    pub fn new(starting: Cost, capacity: u32) -> Self {
        let mut ledger = Self {
            food: Fixed::ZERO,
            ore: Fixed::ZERO,
            capacity: Fixed::saturating_from_num(capacity),
        };
        ledger.produce(ResourceDelta::from(starting));
        ledger
    }

    /// Current amount of a resource.
    #[must_use]
    pub const fn amount(&self, kind: ResourceKind) -> Fixed {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Ore => self.ore,
        }
    }

    /// Current amount rounded down to a whole number.
    #[must_use]
    pub fn whole_amount(&self, kind: ResourceKind) -> u32 {
        let whole = self.amount(kind).to_num::<i64>().max(0);
        u32::try_from(whole).unwrap_or(u32::MAX)
    }

    /// Storage capacity applying to each resource.
    #[must_use]
    pub const fn capacity(&self) -> Fixed {
        self.capacity
    }

    /// True iff every amount is at least the corresponding cost.
    #[must_use]
    pub fn can_afford(&self, cost: Cost) -> bool {
        ResourceKind::ALL
            .iter()
            .all(|&kind| self.amount(kind) >= Fixed::saturating_from_num(cost.get(kind)))
    }

    /// Check affordability, reporting the first short resource.
    pub fn check_affordable(&self, cost: Cost) -> CommandResult<()> {
        for kind in ResourceKind::ALL {
            let required = cost.get(kind);
            if self.amount(kind) < Fixed::saturating_from_num(required) {
                return Err(CommandError::InsufficientResources {
                    resource: kind,
                    required,
                    available: self.whole_amount(kind),
                });
            }
        }
        Ok(())
    }

    /// Deduct a cost. Leaves the ledger untouched if it is not affordable.
    pub fn deduct(&mut self, cost: Cost) -> CommandResult<()> {
        self.check_affordable(cost)?;
        self.food -= Fixed::saturating_from_num(cost.food);
        self.ore -= Fixed::saturating_from_num(cost.ore);
        Ok(())
    }

    /// Apply a signed change, then clamp every amount to `[0, capacity]`.
    pub fn produce(&mut self, delta: ResourceDelta) {
        self.food = self.food.saturating_add(delta.food);
        self.ore = self.ore.saturating_add(delta.ore);
        self.clamp();
    }

    /// Re-derive capacity as `base + bonus` and clamp existing amounts.
    pub fn recompute_capacity(&mut self, base: u32, bonus: i32) {
        let total = (i64::from(base) + i64::from(bonus)).max(0);
        self.capacity = Fixed::saturating_from_num(total);
        self.clamp();
    }

    fn clamp(&mut self) {
        self.food = self.food.clamp(Fixed::ZERO, self.capacity);
        self.ore = self.ore.clamp(Fixed::ZERO, self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ledger_clamps_to_capacity() {
        let ledger = ResourceLedger::new(Cost::new(800, 50), 500);
        assert_eq!(ledger.amount(ResourceKind::Food), Fixed::from_num(500));
        assert_eq!(ledger.amount(ResourceKind::Ore), Fixed::from_num(50));
    }

    #[test]
    fn test_can_afford_requires_every_resource() {
        let ledger = ResourceLedger::new(Cost::new(100, 20), 1000);
        assert!(ledger.can_afford(Cost::new(100, 20)));
        assert!(!ledger.can_afford(Cost::new(50, 21)));
        assert!(ledger.can_afford(Cost::ZERO));
    }

    #[test]
    fn test_deduct_failure_leaves_ledger_unchanged() {
        let mut ledger = ResourceLedger::new(Cost::new(100, 20), 1000);
        let before = ledger.clone();

        let result = ledger.deduct(Cost::new(10, 30));
        assert_eq!(
            result,
            Err(CommandError::InsufficientResources {
                resource: ResourceKind::Ore,
                required: 30,
                available: 20,
            })
        );
        assert_eq!(ledger, before);

        ledger.deduct(Cost::new(40, 20)).unwrap();
        assert_eq!(ledger.whole_amount(ResourceKind::Food), 60);
        assert_eq!(ledger.whole_amount(ResourceKind::Ore), 0);
    }

    #[test]
    fn test_produce_clamps_both_ends() {
        let mut ledger = ResourceLedger::new(Cost::new(100, 100), 150);
        ledger.produce(ResourceDelta::new(Fixed::from_num(80), Fixed::from_num(-250)));
        assert_eq!(ledger.amount(ResourceKind::Food), Fixed::from_num(150));
        assert_eq!(ledger.amount(ResourceKind::Ore), Fixed::ZERO);
    }

    #[test]
    fn test_recompute_capacity_shrink_clamps() {
        let mut ledger = ResourceLedger::new(Cost::new(900, 10), 1000);
        ledger.recompute_capacity(500, 200);
        assert_eq!(ledger.capacity(), Fixed::from_num(700));
        assert_eq!(ledger.amount(ResourceKind::Food), Fixed::from_num(700));

        ledger.recompute_capacity(100, -500);
        assert_eq!(ledger.capacity(), Fixed::ZERO);
        assert_eq!(ledger.amount(ResourceKind::Ore), Fixed::ZERO);
    }

    #[test]
    fn test_cost_scaling() {
        let cost = Cost::new(30, 20);
        assert_eq!(cost.times(5), Cost::new(150, 100));
        assert_eq!(cost.scaled_percent(150), Cost::new(45, 30));
        assert_eq!(cost + Cost::new(1, 2), Cost::new(31, 22));
    }
}
