//! Property-based tests for bag and amount arithmetic.
//!
//! Bags are generated over a small item alphabet so that merges and
//! subtractions regularly hit shared entries.

use offerup_types::{Amount, AssetKind, Bag, Brand, OfferUpError};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

/// Strategy to generate a bag over a five-item alphabet, zeros included.
fn bag_strategy() -> impl Strategy<Value = Bag> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["burger", "fries", "shake", "map", "potion"]),
            0u64..50,
        ),
        0..8,
    )
    .prop_map(|entries| Bag::from_entries(entries).unwrap())
}

proptest! {
    #[test]
    fn merge_then_subtract_round_trips(a in bag_strategy(), b in bag_strategy()) {
        let merged = a.merge(&b).unwrap();
        let back = merged.checked_subtract(&b).unwrap();
        prop_assert_eq!(&back, &a);
        prop_assert_eq!(back.merge(&b).unwrap(), merged);
    }

    #[test]
    fn merge_is_commutative(a in bag_strategy(), b in bag_strategy()) {
        prop_assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
    }

    #[test]
    fn total_count_is_additive(a in bag_strategy(), b in bag_strategy()) {
        let merged = a.merge(&b).unwrap();
        prop_assert_eq!(merged.total_count(), a.total_count() + b.total_count());
    }

    #[test]
    fn no_zero_entries_at_rest(a in bag_strategy(), b in bag_strategy()) {
        let merged = a.merge(&b).unwrap();
        let diff = merged.checked_subtract(&a).unwrap();
        for bag in [&a, &b, &merged, &diff] {
            prop_assert!(bag.iter().all(|(_, count)| count > 0));
        }
    }

    #[test]
    fn subtract_succeeds_iff_contained(a in bag_strategy(), b in bag_strategy()) {
        match a.checked_subtract(&b) {
            Ok(diff) => {
                prop_assert!(a.contains(&b));
                prop_assert_eq!(diff.merge(&b).unwrap(), a);
            }
            Err(err) => {
                prop_assert!(!a.contains(&b));
                let is_insufficient = matches!(err, OfferUpError::InsufficientValue { .. });
                prop_assert!(is_insufficient);
            }
        }
    }

    #[test]
    fn bag_amount_add_subtract_round_trips(a in bag_strategy(), b in bag_strategy()) {
        let item = Brand::issue("Item", AssetKind::Bag);
        let a = Amount::make_bag(&item, a).unwrap();
        let b = Amount::make_bag(&item, b).unwrap();
        let sum = a.add(&b).unwrap();
        prop_assert!(sum.is_gte(&b).unwrap());
        prop_assert_eq!(sum.subtract(&b).unwrap().add(&b).unwrap(), sum);
    }

    #[test]
    fn fungible_add_subtract_round_trips(a in 0u128..1_000_000_000, b in 0u128..1_000_000_000) {
        let ist = Brand::issue("IST", AssetKind::Nat);
        let x = Amount::make_fungible(&ist, a).unwrap();
        let y = Amount::make_fungible(&ist, b).unwrap();
        prop_assert_eq!(x.add(&y).unwrap().subtract(&y).unwrap(), x.clone());
        prop_assert_eq!(x.is_gte(&y).unwrap(), a >= b);
    }
}
