//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced after every trade:
//! ```text
//! ∀ brand: Σ(active seat allocations) == Σ(escrowed) + Σ(minted) - Σ(paid out)
//! ```
//!
//! Rearrangements only move value between seats, so they never change the
//! right-hand side. If this invariant ever breaks, value has leaked and the
//! contract instance must stop.

use std::collections::HashMap;

use offerup_types::{Amount, Brand, OfferUpError, Result};

/// Tracks per-brand value entering and leaving the escrow ledger.
#[derive(Debug)]
pub struct SupplyConservation {
    /// Value deposited into seats at admission, per brand.
    escrowed: HashMap<Brand, Amount>,
    /// Value created by the mint, per brand.
    minted: HashMap<Brand, Amount>,
    /// Value paid out of seats on exit, per brand.
    paid_out: HashMap<Brand, Amount>,
}

fn accumulate(map: &mut HashMap<Brand, Amount>, amount: &Amount) -> Result<()> {
    let total = match map.get(amount.brand()) {
        Some(current) => current.add(amount)?,
        None => amount.clone(),
    };
    map.insert(amount.brand().clone(), total);
    Ok(())
}

/// Accumulate every amount, or none of them.
fn accumulate_all<'a>(
    map: &mut HashMap<Brand, Amount>,
    amounts: impl IntoIterator<Item = &'a Amount>,
) -> Result<()> {
    let mut staged = map.clone();
    for amount in amounts {
        accumulate(&mut staged, amount)?;
    }
    *map = staged;
    Ok(())
}

fn total_of(map: &HashMap<Brand, Amount>, brand: &Brand) -> Amount {
    map.get(brand)
        .cloned()
        .unwrap_or_else(|| Amount::empty(brand))
}

impl SupplyConservation {
    /// Create a new supply conservation tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            escrowed: HashMap::new(),
            minted: HashMap::new(),
            paid_out: HashMap::new(),
        }
    }

    /// Record a whole seat's admission escrow, all-or-nothing.
    pub fn record_escrow_all<'a>(
        &mut self,
        amounts: impl IntoIterator<Item = &'a Amount>,
    ) -> Result<()> {
        accumulate_all(&mut self.escrowed, amounts)
    }

    /// Record a whole seat's payout, all-or-nothing.
    pub fn record_payout_all<'a>(
        &mut self,
        amounts: impl IntoIterator<Item = &'a Amount>,
    ) -> Result<()> {
        accumulate_all(&mut self.paid_out, amounts)
    }

    /// Record a whole mint issuance, all-or-nothing.
    pub fn record_mint_all<'a>(
        &mut self,
        amounts: impl IntoIterator<Item = &'a Amount>,
    ) -> Result<()> {
        accumulate_all(&mut self.minted, amounts)
    }

    /// Expected value held by active seats: escrowed + minted - paid out.
    ///
    /// # Errors
    /// Returns [`OfferUpError::SupplyInvariantViolation`] if more was paid
    /// out than ever entered.
    pub fn expected_supply(&self, brand: &Brand) -> Result<Amount> {
        let entered = self.total_escrowed(brand).add(&self.total_minted(brand))?;
        entered
            .subtract(&self.total_paid_out(brand))
            .map_err(|err| OfferUpError::SupplyInvariantViolation {
                reason: format!("brand {brand}: paid out more than entered ({err})"),
            })
    }

    /// Verify that the actual holdings match the expected supply.
    ///
    /// # Errors
    /// Returns [`OfferUpError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, brand: &Brand, actual: &Amount) -> Result<()> {
        let expected = self.expected_supply(brand)?;
        if &expected != actual {
            return Err(OfferUpError::SupplyInvariantViolation {
                reason: format!(
                    "brand {brand}: actual holdings {actual} != expected {expected} \
                     (escrowed={}, minted={}, paid_out={})",
                    self.total_escrowed(brand),
                    self.total_minted(brand),
                    self.total_paid_out(brand),
                ),
            });
        }
        Ok(())
    }

    /// Every brand that has entered or left the ledger.
    #[must_use]
    pub fn tracked_brands(&self) -> Vec<Brand> {
        let mut brands: std::collections::HashSet<Brand> =
            self.escrowed.keys().cloned().collect();
        brands.extend(self.minted.keys().cloned());
        brands.extend(self.paid_out.keys().cloned());
        let mut brands: Vec<Brand> = brands.into_iter().collect();
        brands.sort();
        brands
    }

    #[must_use]
    pub fn total_escrowed(&self, brand: &Brand) -> Amount {
        total_of(&self.escrowed, brand)
    }

    #[must_use]
    pub fn total_minted(&self, brand: &Brand) -> Amount {
        total_of(&self.minted, brand)
    }

    #[must_use]
    pub fn total_paid_out(&self, brand: &Brand) -> Amount {
        total_of(&self.paid_out, brand)
    }
}

impl Default for SupplyConservation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        let ist = Brand::dummy_nat();
        assert!(sc.expected_supply(&ist).unwrap().is_empty());
        assert!(sc.verify(&ist, &Amount::empty(&ist)).is_ok());
        assert!(sc.tracked_brands().is_empty());
    }

    #[test]
    fn escrow_and_mint_increase_expected() {
        let mut sc = SupplyConservation::new();
        let ist = Brand::dummy_nat();
        let item = Brand::dummy_bag();
        sc.record_escrow_all(&[Amount::nat(&ist, 300)]).unwrap();
        sc.record_escrow_all(&[Amount::nat(&ist, 200)]).unwrap();
        sc.record_mint_all(&[Amount::bag(&item, &[("burger", 2)])])
            .unwrap();
        assert_eq!(sc.expected_supply(&ist).unwrap(), Amount::nat(&ist, 500));
        assert_eq!(
            sc.expected_supply(&item).unwrap(),
            Amount::bag(&item, &[("burger", 2)])
        );
        assert_eq!(sc.tracked_brands().len(), 2);
    }

    #[test]
    fn payouts_decrease_expected() {
        let mut sc = SupplyConservation::new();
        let item = Brand::dummy_bag();
        sc.record_mint_all(&[Amount::bag(&item, &[("burger", 2), ("fries", 1)])])
            .unwrap();
        sc.record_payout_all(&[Amount::bag(&item, &[("fries", 1)])])
            .unwrap();
        assert!(
            sc.verify(&item, &Amount::bag(&item, &[("burger", 2)]))
                .is_ok()
        );
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut sc = SupplyConservation::new();
        let ist = Brand::dummy_nat();
        sc.record_escrow_all(&[Amount::nat(&ist, 10)]).unwrap();
        let err = sc.verify(&ist, &Amount::nat(&ist, 11)).unwrap_err();
        assert!(matches!(err, OfferUpError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn record_all_is_atomic() {
        let mut sc = SupplyConservation::new();
        let ist = Brand::dummy_nat();
        let amounts = [Amount::nat(&ist, 5), Amount::nat(&ist, u128::MAX)];
        assert_eq!(
            sc.record_escrow_all(&amounts).unwrap_err(),
            OfferUpError::AmountOverflow
        );
        assert!(sc.total_escrowed(&ist).is_empty());
    }

    #[test]
    fn overdrawn_payout_is_violation() {
        let mut sc = SupplyConservation::new();
        let ist = Brand::dummy_nat();
        sc.record_payout_all(&[Amount::nat(&ist, 1)]).unwrap();
        let err = sc.expected_supply(&ist).unwrap_err();
        assert!(matches!(err, OfferUpError::SupplyInvariantViolation { .. }));
    }
}
