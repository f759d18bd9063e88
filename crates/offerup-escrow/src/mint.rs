//! Item mint, the only source of new supply.
//!
//! One mint exists per contract instance. It owns the brand it issues and a
//! running total of everything it has ever issued. Issuance is credited
//! straight into a ledger seat, and the total only ever grows.

use offerup_types::{Amount, AssetKind, Brand, KeywordRecord, Result, SeatId};
use tracing::info;

use crate::ledger::SeatLedger;

/// Mint authority for one brand.
#[derive(Debug)]
pub struct ItemMint {
    brand: Brand,
    /// Everything issued since creation.
    issued: Amount,
    /// Number of successful issuances.
    issuances: u64,
}

impl ItemMint {
    /// Register a new semi-fungible brand and its mint.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::for_brand(Brand::issue(name, AssetKind::Bag))
    }

    /// A mint for an already registered brand.
    #[must_use]
    pub fn for_brand(brand: Brand) -> Self {
        let issued = Amount::empty(&brand);
        Self {
            brand,
            issued,
            issuances: 0,
        }
    }

    #[must_use]
    pub fn brand(&self) -> &Brand {
        &self.brand
    }

    /// Everything issued so far.
    #[must_use]
    pub fn issued(&self) -> &Amount {
        &self.issued
    }

    /// Total supply in units (bag item count, or fungible value).
    #[must_use]
    pub fn supply(&self) -> u128 {
        self.issued.units()
    }

    #[must_use]
    pub fn issuances(&self) -> u64 {
        self.issuances
    }

    /// Issue `amounts` into `seat`.
    ///
    /// Every amount must be of this mint's brand and the seat must be
    /// active; all checks run before anything changes, so a failure leaves
    /// both the supply and the seat untouched.
    ///
    /// # Errors
    /// `BrandMismatch` for a foreign amount, `SeatNotFound` /
    /// `SeatNotActive` for a bad seat, `AmountOverflow` on overflow.
    pub fn mint_into(
        &mut self,
        ledger: &mut SeatLedger,
        seat: SeatId,
        amounts: &KeywordRecord,
    ) -> Result<()> {
        let mut issued = self.issued.clone();
        for amount in amounts.values() {
            amount.ensure_brand(&self.brand)?;
            issued = issued.add(amount)?;
        }
        ledger.active_seat(seat)?;

        ledger.credit_record(seat, amounts)?;
        ledger.supply_mut().record_mint_all(amounts.values())?;

        let minted = issued.units() - self.issued.units();
        self.issued = issued;
        self.issuances += 1;
        info!(
            brand = %self.brand,
            seat = %seat,
            minted,
            supply = self.supply(),
            "items minted"
        );
        Ok(())
    }

    /// Allocate a fresh seat and issue `amounts` into it.
    ///
    /// # Errors
    /// Same as [`ItemMint::mint_into`]. On failure the fresh seat exits as
    /// discarded, empty.
    pub fn mint_gains(&mut self, ledger: &mut SeatLedger, amounts: &KeywordRecord) -> Result<SeatId> {
        let seat = ledger.allocate();
        if let Err(err) = self.mint_into(ledger, seat, amounts) {
            ledger.exit(seat, crate::ExitOutcome::Discarded)?;
            return Err(err);
        }
        Ok(seat)
    }
}
