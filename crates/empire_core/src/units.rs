//! Fungible troop counts.
//!
//! Units have no identity: the army is a count per [`UnitKind`].
//! Zero counts are never stored, so two equal armies compare equal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::UnitKind;

/// Count of units per type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<UnitKind, u32>", into = "BTreeMap<UnitKind, u32>")]
pub struct UnitCounts {
    counts: BTreeMap<UnitKind, u32>,
}

impl UnitCounts {
    /// Create an empty army.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any existing count.
    #[must_use]
    pub fn with(mut self, kind: UnitKind, count: u32) -> Self {
        self.set(kind, count);
        self
    }

    /// Count of one unit type.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Replace the count of one unit type.
    pub fn set(&mut self, kind: UnitKind, count: u32) {
        if count == 0 {
            self.counts.remove(&kind);
        } else {
            self.counts.insert(kind, count);
        }
    }

    /// Add units, saturating at `u32::MAX`.
    pub fn add(&mut self, kind: UnitKind, count: u32) {
        self.set(kind, self.get(kind).saturating_add(count));
    }

    /// Remove units. Returns `false` and changes nothing if there are too few.
    pub fn remove(&mut self, kind: UnitKind, count: u32) -> bool {
        match self.get(kind).checked_sub(count) {
            Some(left) => {
                self.set(kind, left);
                true
            }
            None => false,
        }
    }

    /// Total number of units across all types.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// True if there are no units at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Non-zero counts in unit-kind order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitKind, u32)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl FromIterator<(UnitKind, u32)> for UnitCounts {
    fn from_iter<I: IntoIterator<Item = (UnitKind, u32)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (kind, count) in iter {
            counts.add(kind, count);
        }
        counts
    }
}

impl From<BTreeMap<UnitKind, u32>> for UnitCounts {
    fn from(counts: BTreeMap<UnitKind, u32>) -> Self {
        counts.into_iter().collect()
    }
}

impl From<UnitCounts> for BTreeMap<UnitKind, u32> {
    fn from(counts: UnitCounts) -> Self {
        counts.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counts_are_not_stored() {
        let counts = UnitCounts::new()
            .with(UnitKind::Archer, 0)
            .with(UnitKind::Spearman, 3);
        assert_eq!(counts.iter().collect::<Vec<_>>(), vec![(UnitKind::Spearman, 3)]);
        assert_eq!(counts, UnitCounts::new().with(UnitKind::Spearman, 3));
    }

    #[test]
    fn test_remove_is_all_or_nothing() {
        let mut counts = UnitCounts::new().with(UnitKind::Cavalry, 4);
        assert!(!counts.remove(UnitKind::Cavalry, 5));
        assert_eq!(counts.get(UnitKind::Cavalry), 4);

        assert!(counts.remove(UnitKind::Cavalry, 4));
        assert!(counts.is_empty());
    }

    #[test]
    fn test_collect_sums_duplicates() {
        let counts: UnitCounts = [(UnitKind::Archer, 2), (UnitKind::Archer, 3)]
            .into_iter()
            .collect();
        assert_eq!(counts.get(UnitKind::Archer), 5);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_decoded_zero_counts_are_dropped() {
        let counts: UnitCounts = ron::from_str("{Spearman: 0, Archer: 2}").unwrap();
        assert_eq!(counts, UnitCounts::new().with(UnitKind::Archer, 2));

        let counts: UnitCounts = ron::from_str("{Spearman: 0}").unwrap();
        assert!(counts.is_empty());
    }
}
