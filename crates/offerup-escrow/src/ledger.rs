//! Seat ledger: the escrow record for every party in a trade.
//!
//! The ledger exclusively owns every seat's allocation. Outside this crate,
//! allocations can only be read; the credit/debit primitives are
//! `pub(crate)` and reachable only through the [`crate::ItemMint`] and
//! [`crate::atomic_rearrange`].
//!
//! ## Seat lifecycle
//!
//! ```text
//!   ┌────────┐  exit(outcome)  ┌────────┐
//!   │ ACTIVE ├────────────────▶│ EXITED │
//!   └────────┘                 └────────┘
//! ```
//!
//! Exit is terminal. The final allocation is frozen as the seat's payout
//! and any further mutation fails with `SeatNotActive`.
//!
//! The ledger keeps a running per-brand total of what active seats hold, so
//! supply verification costs the same however many seats have exited.

use std::{
    collections::{BTreeMap, HashMap},
    fmt, iter,
};

use chrono::{DateTime, Utc};
use offerup_types::{
    Allocation, Amount, Brand, Keyword, KeywordRecord, OfferUpError, Result, SeatId, add_records,
};
use tracing::{debug, info};

use crate::supply_conservation::SupplyConservation;

/// Whether a seat can still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatStatus {
    Active,
    Exited,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Exited => write!(f, "EXITED"),
        }
    }
}

/// Why a seat exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The seat's part of a trade settled.
    Completed,
    /// The trade failed; the seat's escrow went back untouched.
    Refunded { reason: String },
    /// The seat was an internal staging seat that is no longer needed.
    Discarded,
}

/// One escrow record.
#[derive(Debug, Clone)]
pub struct Seat {
    id: SeatId,
    allocation: Allocation,
    status: SeatStatus,
    outcome: Option<ExitOutcome>,
    created_at: DateTime<Utc>,
    exited_at: Option<DateTime<Utc>>,
}

impl Seat {
    fn new(id: SeatId, allocation: Allocation) -> Self {
        Self {
            id,
            allocation,
            status: SeatStatus::Active,
            outcome: None,
            created_at: Utc::now(),
            exited_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SeatId {
        self.id
    }

    /// Current allocation, or the frozen payout once exited.
    #[must_use]
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Amount held under `keyword`, if any.
    #[must_use]
    pub fn amount(&self, keyword: &Keyword) -> Option<&Amount> {
        self.allocation.get(keyword)
    }

    #[must_use]
    pub fn status(&self) -> SeatStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SeatStatus::Active
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&ExitOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn exited_at(&self) -> Option<DateTime<Utc>> {
        self.exited_at
    }
}

/// Owner of all seats and of the supply tracker.
#[derive(Debug)]
pub struct SeatLedger {
    seats: BTreeMap<SeatId, Seat>,
    next_id: SeatId,
    supply: SupplyConservation,
    /// Sum over active seats, per brand.
    held: HashMap<Brand, Amount>,
    active: usize,
}

impl SeatLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seats: BTreeMap::new(),
            next_id: SeatId(1),
            supply: SupplyConservation::new(),
            held: HashMap::new(),
            active: 0,
        }
    }

    fn held_of(&self, brand: &Brand) -> Amount {
        self.held
            .get(brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand))
    }

    /// New per-brand totals after `credits` enter and `debits` leave active
    /// seats. Nothing is written until [`SeatLedger::commit_held`].
    fn stage_held<'a>(
        &self,
        credits: impl IntoIterator<Item = &'a Amount>,
        debits: impl IntoIterator<Item = &'a Amount>,
    ) -> Result<HashMap<Brand, Amount>> {
        let mut staged: HashMap<Brand, Amount> = HashMap::new();
        for amount in credits {
            let current = staged
                .remove(amount.brand())
                .unwrap_or_else(|| self.held_of(amount.brand()));
            staged.insert(amount.brand().clone(), current.add(amount)?);
        }
        for amount in debits {
            let current = staged
                .remove(amount.brand())
                .unwrap_or_else(|| self.held_of(amount.brand()));
            staged.insert(amount.brand().clone(), current.subtract(amount)?);
        }
        Ok(staged)
    }

    fn commit_held(&mut self, staged: HashMap<Brand, Amount>) {
        self.held.extend(staged);
    }

    fn fresh_id(&mut self) -> SeatId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Create an empty, active seat.
    pub fn allocate(&mut self) -> SeatId {
        let id = self.fresh_id();
        self.seats.insert(id, Seat::new(id, Allocation::new()));
        self.active += 1;
        debug!(seat = %id, "seat allocated");
        id
    }

    /// Admit a party whose payments the hosting runtime has already
    /// collected: create an active seat holding `escrow`.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if recording the escrow overflows the
    /// supply tracker. No seat is created in that case.
    pub fn admit(&mut self, escrow: KeywordRecord) -> Result<SeatId> {
        let escrow: KeywordRecord = escrow
            .into_iter()
            .filter(|(_, amount)| !amount.is_empty())
            .collect();
        let staged = self.stage_held(escrow.values(), iter::empty())?;
        self.supply.record_escrow_all(escrow.values())?;
        self.commit_held(staged);
        let id = self.fresh_id();
        self.seats.insert(id, Seat::new(id, escrow));
        self.active += 1;
        debug!(seat = %id, "seat admitted with escrow");
        Ok(id)
    }

    /// # Errors
    /// Returns `SeatNotFound` for an unknown ID.
    pub fn seat(&self, id: SeatId) -> Result<&Seat> {
        self.seats.get(&id).ok_or(OfferUpError::SeatNotFound(id))
    }

    /// The seat, provided it is still active.
    ///
    /// # Errors
    /// `SeatNotFound` for an unknown ID, `SeatNotActive` after exit.
    pub fn active_seat(&self, id: SeatId) -> Result<&Seat> {
        let seat = self.seat(id)?;
        if !seat.is_active() {
            return Err(OfferUpError::SeatNotActive(id));
        }
        Ok(seat)
    }

    fn active_seat_mut(&mut self, id: SeatId) -> Result<&mut Seat> {
        let seat = self
            .seats
            .get_mut(&id)
            .ok_or(OfferUpError::SeatNotFound(id))?;
        if !seat.is_active() {
            return Err(OfferUpError::SeatNotActive(id));
        }
        Ok(seat)
    }

    /// Add `amount` to the seat's allocation under `keyword`.
    pub(crate) fn credit_add(&mut self, id: SeatId, keyword: &Keyword, amount: &Amount) -> Result<()> {
        let updated = match self.active_seat(id)?.allocation.get(keyword) {
            Some(current) => current.add(amount)?,
            None => amount.clone(),
        };
        let staged = self.stage_held([amount], iter::empty())?;
        store(&mut self.active_seat_mut(id)?.allocation, keyword, updated);
        self.commit_held(staged);
        Ok(())
    }

    /// Remove `amount` from the seat's allocation under `keyword`.
    pub(crate) fn credit_subtract(
        &mut self,
        id: SeatId,
        keyword: &Keyword,
        amount: &Amount,
    ) -> Result<()> {
        let current = self
            .active_seat(id)?
            .allocation
            .get(keyword)
            .cloned()
            .unwrap_or_else(|| Amount::empty(amount.brand()));
        let updated = current.subtract(amount)?;
        let staged = self.stage_held(iter::empty(), [amount])?;
        store(&mut self.active_seat_mut(id)?.allocation, keyword, updated);
        self.commit_held(staged);
        Ok(())
    }

    /// Add a whole record to a seat, all-or-nothing.
    pub(crate) fn credit_record(&mut self, id: SeatId, record: &KeywordRecord) -> Result<()> {
        let updated = add_records(&self.active_seat(id)?.allocation, record)?;
        let staged = self.stage_held(record.values(), iter::empty())?;
        self.active_seat_mut(id)?.allocation = updated;
        self.commit_held(staged);
        Ok(())
    }

    pub(crate) fn supply_mut(&mut self) -> &mut SupplyConservation {
        &mut self.supply
    }

    /// Exit a seat. Its allocation is frozen and returned as the payout.
    ///
    /// # Errors
    /// `SeatNotFound` for an unknown ID, `SeatNotActive` if it already exited.
    pub fn exit(&mut self, id: SeatId, outcome: ExitOutcome) -> Result<KeywordRecord> {
        let payout = self.active_seat(id)?.allocation.clone();
        let staged = self.stage_held(iter::empty(), payout.values())?;
        self.supply.record_payout_all(payout.values())?;
        self.commit_held(staged);
        self.active -= 1;
        let seat = self.active_seat_mut(id)?;
        seat.status = SeatStatus::Exited;
        seat.exited_at = Some(Utc::now());
        info!(seat = %id, outcome = ?outcome, keywords = payout.len(), "seat exited");
        seat.outcome = Some(outcome);
        Ok(payout)
    }

    /// Sum of `brand` held across all active seats.
    #[must_use]
    pub fn held(&self, brand: &Brand) -> Amount {
        self.held_of(brand)
    }

    /// Verify supply conservation for one brand.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if holdings and flows disagree.
    pub fn verify_supply(&self, brand: &Brand) -> Result<()> {
        self.supply.verify(brand, &self.held_of(brand))
    }

    /// Verify supply conservation for every brand the ledger has seen.
    ///
    /// # Errors
    /// Returns the first `SupplyInvariantViolation` found.
    pub fn verify_all(&self) -> Result<()> {
        for brand in self.supply.tracked_brands() {
            self.verify_supply(&brand)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    /// Number of seats ever allocated.
    #[must_use]
    pub fn count(&self) -> usize {
        self.seats.len()
    }

    /// Number of seats still active.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active
    }
}

impl Default for SeatLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `amount` under `keyword`, dropping the entry when it is empty.
fn store(allocation: &mut KeywordRecord, keyword: &Keyword, amount: Amount) {
    if amount.is_empty() {
        allocation.remove(keyword);
    } else {
        allocation.insert(keyword.clone(), amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(name: &str) -> Keyword {
        Keyword::new(name).unwrap()
    }

    #[test]
    fn allocate_creates_empty_active_seat() {
        let mut ledger = SeatLedger::new();
        let id = ledger.allocate();
        let seat = ledger.seat(id).unwrap();
        assert!(seat.is_active());
        assert!(seat.allocation().is_empty());
        assert_eq!(ledger.count(), 1);
        assert_eq!(ledger.active_count(), 1);
    }

    #[test]
    fn seat_ids_are_sequential() {
        let mut ledger = SeatLedger::new();
        let a = ledger.allocate();
        let b = ledger.allocate();
        assert_eq!(b, a.next());
    }

    #[test]
    fn admit_records_escrow() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let mut give = KeywordRecord::new();
        give.insert(kw("Price"), Amount::nat(&ist, 300));
        let id = ledger.admit(give).unwrap();

        assert_eq!(
            ledger.seat(id).unwrap().amount(&kw("Price")),
            Some(&Amount::nat(&ist, 300))
        );
        assert_eq!(ledger.supply().total_escrowed(&ist), Amount::nat(&ist, 300));
        ledger.verify_supply(&ist).unwrap();
    }

    #[test]
    fn credit_add_and_subtract() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let id = ledger.allocate();
        ledger
            .credit_add(id, &kw("Price"), &Amount::nat(&ist, 10))
            .unwrap();
        ledger
            .credit_subtract(id, &kw("Price"), &Amount::nat(&ist, 4))
            .unwrap();
        assert_eq!(
            ledger.seat(id).unwrap().amount(&kw("Price")),
            Some(&Amount::nat(&ist, 6))
        );
    }

    #[test]
    fn subtract_to_zero_prunes_keyword() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let id = ledger.allocate();
        ledger
            .credit_add(id, &kw("Price"), &Amount::nat(&ist, 10))
            .unwrap();
        ledger
            .credit_subtract(id, &kw("Price"), &Amount::nat(&ist, 10))
            .unwrap();
        assert!(ledger.seat(id).unwrap().allocation().is_empty());
    }

    #[test]
    fn subtract_beyond_holding_fails_unchanged() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let id = ledger.allocate();
        ledger
            .credit_add(id, &kw("Price"), &Amount::nat(&ist, 3))
            .unwrap();
        let err = ledger
            .credit_subtract(id, &kw("Price"), &Amount::nat(&ist, 4))
            .unwrap_err();
        assert!(matches!(err, OfferUpError::InsufficientValue { .. }));
        assert_eq!(
            ledger.seat(id).unwrap().amount(&kw("Price")),
            Some(&Amount::nat(&ist, 3))
        );
    }

    #[test]
    fn credit_record_is_all_or_nothing() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let other = Brand::dummy_nat();
        let id = ledger.allocate();
        ledger
            .credit_add(id, &kw("B"), &Amount::nat(&ist, 1))
            .unwrap();

        let mut record = KeywordRecord::new();
        record.insert(kw("A"), Amount::nat(&ist, 5));
        record.insert(kw("B"), Amount::nat(&other, 5));
        let err = ledger.credit_record(id, &record).unwrap_err();
        assert!(matches!(err, OfferUpError::BrandMismatch { .. }));
        assert!(ledger.seat(id).unwrap().amount(&kw("A")).is_none());
    }

    #[test]
    fn exit_freezes_allocation() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let mut give = KeywordRecord::new();
        give.insert(kw("Price"), Amount::nat(&ist, 300));
        let id = ledger.admit(give.clone()).unwrap();

        let payout = ledger.exit(id, ExitOutcome::Completed).unwrap();
        assert_eq!(payout, give);

        let seat = ledger.seat(id).unwrap();
        assert_eq!(seat.status(), SeatStatus::Exited);
        assert_eq!(seat.outcome(), Some(&ExitOutcome::Completed));
        assert!(seat.exited_at().is_some());
        assert_eq!(seat.allocation(), &give);

        let err = ledger
            .credit_add(id, &kw("Price"), &Amount::nat(&ist, 1))
            .unwrap_err();
        assert_eq!(err, OfferUpError::SeatNotActive(id));
        let err = ledger
            .credit_subtract(id, &kw("Price"), &Amount::nat(&ist, 1))
            .unwrap_err();
        assert_eq!(err, OfferUpError::SeatNotActive(id));
    }

    #[test]
    fn double_exit_fails() {
        let mut ledger = SeatLedger::new();
        let id = ledger.allocate();
        ledger.exit(id, ExitOutcome::Discarded).unwrap();
        let err = ledger.exit(id, ExitOutcome::Completed).unwrap_err();
        assert_eq!(err, OfferUpError::SeatNotActive(id));
        assert_eq!(ledger.active_count(), 0);
    }

    #[test]
    fn exit_paid_out_keeps_supply_balanced() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let mut give = KeywordRecord::new();
        give.insert(kw("Price"), Amount::nat(&ist, 300));
        let id = ledger.admit(give).unwrap();
        ledger
            .exit(id, ExitOutcome::Refunded {
                reason: "test".into(),
            })
            .unwrap();
        assert!(ledger.held(&ist).is_empty());
        ledger.verify_all().unwrap();
    }

    /// Sum of `brand` over active seats, by walking every seat.
    fn recount(ledger: &SeatLedger, brand: &Brand) -> Amount {
        let mut total = Amount::empty(brand);
        for seat in ledger.seats.values().filter(|s| s.is_active()) {
            for amount in seat.allocation.values().filter(|a| a.brand() == brand) {
                total = total.add(amount).unwrap();
            }
        }
        total
    }

    #[test]
    fn held_totals_follow_every_mutation() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let item = Brand::dummy_bag();

        let mut give = KeywordRecord::new();
        give.insert(kw("Price"), Amount::nat(&ist, 300));
        let buyer = ledger.admit(give).unwrap();
        let other = ledger.allocate();
        assert_eq!(ledger.held(&ist), recount(&ledger, &ist));

        ledger
            .credit_subtract(buyer, &kw("Price"), &Amount::nat(&ist, 120))
            .unwrap();
        ledger
            .credit_add(other, &kw("Price"), &Amount::nat(&ist, 120))
            .unwrap();
        let mut items = KeywordRecord::new();
        items.insert(kw("Items"), Amount::bag(&item, &[("burger", 2)]));
        ledger.credit_record(other, &items).unwrap();
        assert_eq!(ledger.held(&ist), Amount::nat(&ist, 300));
        assert_eq!(ledger.held(&item), recount(&ledger, &item));

        ledger.exit(other, ExitOutcome::Completed).unwrap();
        assert_eq!(ledger.held(&ist), Amount::nat(&ist, 180));
        assert_eq!(ledger.held(&ist), recount(&ledger, &ist));
        assert!(ledger.held(&item).is_empty());
        assert_eq!(ledger.active_count(), 1);
    }

    #[test]
    fn failed_mutation_leaves_held_untouched() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        let id = ledger.allocate();
        ledger
            .credit_add(id, &kw("Price"), &Amount::nat(&ist, 3))
            .unwrap();
        ledger
            .credit_subtract(id, &kw("Price"), &Amount::nat(&ist, 4))
            .unwrap_err();
        ledger.exit(id, ExitOutcome::Discarded).unwrap();
        ledger
            .credit_add(id, &kw("Price"), &Amount::nat(&ist, 1))
            .unwrap_err();
        assert!(ledger.held(&ist).is_empty());
        assert_eq!(ledger.held(&ist), recount(&ledger, &ist));
    }

    #[test]
    fn exited_seats_do_not_weigh_on_verification() {
        let mut ledger = SeatLedger::new();
        let ist = Brand::dummy_nat();
        for n in 1..=500u128 {
            let mut give = KeywordRecord::new();
            give.insert(kw("Price"), Amount::nat(&ist, n));
            let id = ledger.admit(give).unwrap();
            ledger.exit(id, ExitOutcome::Completed).unwrap();
        }
        assert_eq!(ledger.count(), 500);
        assert_eq!(ledger.active_count(), 0);
        assert_eq!(ledger.held.len(), 1);
        assert!(ledger.held(&ist).is_empty());
        ledger.verify_all().unwrap();
    }

    #[test]
    fn unknown_seat() {
        let ledger = SeatLedger::new();
        let err = ledger.seat(SeatId(99)).unwrap_err();
        assert_eq!(err, OfferUpError::SeatNotFound(SeatId(99)));
    }
}
