//! Bags: multisets of named items.
//!
//! A bag maps an item name to a positive count. Zero counts never persist:
//! every constructor and every operation prunes them, so two bags are equal
//! exactly when they hold the same non-zero entries. Entries are kept in a
//! `BTreeMap`, which makes iteration order (and therefore digests) canonical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{OfferUpError, Result};

/// A multiset of named items with positive counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, u64>", into = "BTreeMap<String, u64>")]
pub struct Bag {
    entries: BTreeMap<String, u64>,
}

impl Bag {
    /// The empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from `(name, count)` pairs. Duplicate names merge,
    /// zero counts are dropped.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if merged counts exceed `u64::MAX`.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut bag = Self::new();
        for (name, count) in entries {
            bag.add_entry(name.into(), count)?;
        }
        Ok(bag)
    }

    fn add_entry(&mut self, name: String, count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let slot = self.entries.entry(name).or_insert(0);
        *slot = slot.checked_add(count).ok_or(OfferUpError::AmountOverflow)?;
        Ok(())
    }

    /// Count held for `name`; zero when absent.
    #[must_use]
    pub fn count_of(&self, name: &str) -> u64 {
        self.entries.get(name).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total_count(&self) -> u128 {
        self.entries.values().map(|&c| u128::from(c)).sum()
    }

    /// Number of distinct item names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical (name) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Entrywise sum.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if any entry exceeds `u64::MAX`.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        for (name, &count) in &other.entries {
            out.add_entry(name.clone(), count)?;
        }
        Ok(out)
    }

    /// Entrywise difference. Entries reaching zero are dropped.
    ///
    /// # Errors
    /// Returns `InsufficientValue` naming the first entry that would go
    /// negative.
    pub fn checked_subtract(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        for (name, &count) in &other.entries {
            let have = out.count_of(name);
            let left = have
                .checked_sub(count)
                .ok_or_else(|| OfferUpError::InsufficientValue {
                    reason: format!("bag holds {have} of {name:?}, cannot remove {count}"),
                })?;
            if left == 0 {
                out.entries.remove(name);
            } else {
                out.entries.insert(name.clone(), left);
            }
        }
        Ok(out)
    }

    /// Whether every entry of `other` is covered by this bag.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other
            .entries
            .iter()
            .all(|(name, &count)| self.count_of(name) >= count)
    }
}

impl From<BTreeMap<String, u64>> for Bag {
    fn from(mut entries: BTreeMap<String, u64>) -> Self {
        entries.retain(|_, count| *count > 0);
        Self { entries }
    }
}

impl From<Bag> for BTreeMap<String, u64> {
    fn from(bag: Bag) -> Self {
        bag.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: &[(&str, u64)]) -> Bag {
        Bag::from_entries(entries.iter().map(|&(n, c)| (n, c))).unwrap()
    }

    #[test]
    fn duplicates_merge_and_zeros_drop() {
        let b = bag(&[("burger", 1), ("fries", 0), ("burger", 2)]);
        assert_eq!(b.count_of("burger"), 3);
        assert_eq!(b.count_of("fries"), 0);
        assert_eq!(b.len(), 1);
        assert_eq!(b.total_count(), 3);
    }

    #[test]
    fn equality_is_structural() {
        let a = bag(&[("fries", 1), ("burger", 2)]);
        let b = bag(&[("burger", 2), ("fries", 1), ("shake", 0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn merge_is_entrywise() {
        let a = bag(&[("burger", 2)]);
        let b = bag(&[("burger", 1), ("fries", 4)]);
        let m = a.merge(&b).unwrap();
        assert_eq!(m.count_of("burger"), 3);
        assert_eq!(m.count_of("fries"), 4);
        assert_eq!(m.total_count(), 7);
    }

    #[test]
    fn subtract_prunes_zero_entries() {
        let a = bag(&[("burger", 2), ("fries", 1)]);
        let d = a.checked_subtract(&bag(&[("fries", 1)])).unwrap();
        assert_eq!(d, bag(&[("burger", 2)]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn subtract_underflow_fails() {
        let a = bag(&[("burger", 1)]);
        let err = a.checked_subtract(&bag(&[("burger", 2)])).unwrap_err();
        assert!(matches!(err, OfferUpError::InsufficientValue { .. }));

        let err = a.checked_subtract(&bag(&[("shake", 1)])).unwrap_err();
        assert!(matches!(err, OfferUpError::InsufficientValue { .. }));
    }

    #[test]
    fn contains_checks_every_entry() {
        let a = bag(&[("burger", 2), ("fries", 1)]);
        assert!(a.contains(&bag(&[("burger", 2)])));
        assert!(a.contains(&Bag::new()));
        assert!(!a.contains(&bag(&[("burger", 3)])));
        assert!(!a.contains(&bag(&[("shake", 1)])));
    }

    #[test]
    fn merge_overflow_detected() {
        let a = bag(&[("x", u64::MAX)]);
        let err = a.merge(&bag(&[("x", 1)])).unwrap_err();
        assert_eq!(err, OfferUpError::AmountOverflow);
    }

    #[test]
    fn deserialize_drops_zero_counts() {
        let b: Bag = serde_json::from_str(r#"{"burger":2,"fries":0}"#).unwrap();
        assert_eq!(b, bag(&[("burger", 2)]));
        assert_eq!(serde_json::to_string(&b).unwrap(), r#"{"burger":2}"#);
    }
}
