//! Atomic multi-leg rearrangement.
//!
//! Moves amounts between seats so that either every leg lands or none does.
//! Atomicity is structural: the engine proves the whole batch in a dry run
//! against staged copies of the touched allocations, and only then commits.
//!
//! ## Algorithm
//!
//! 1. **Dry run**: for each leg, in order, check that both seats are active
//!    and that the source's staged allocation covers the debit (`is_gte`).
//!    Apply the leg to the staged copies and tally debits and credits per
//!    brand.
//! 2. **Conservation**: every brand's debits must equal its credits.
//! 3. **Commit**: replay every leg against the ledger. Steps 1 and 2 proved
//!    each operation succeeds, so a failure here is an invariant break and
//!    panics instead of returning.

use std::collections::BTreeMap;

use offerup_types::{Amount, Brand, Keyword, KeywordRecord, OfferUpError, Result, SeatId};
use tracing::{debug, error, info};

use crate::ledger::SeatLedger;

/// One transfer between two seats.
///
/// `debit` is taken from `from`. `credit` is given to `to`; when absent it
/// is the same record as `debit`. Keywords may differ between the two sides
/// as long as each brand's totals agree across the whole rearrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLeg {
    pub from: SeatId,
    pub to: SeatId,
    pub debit: KeywordRecord,
    pub credit: Option<KeywordRecord>,
}

impl TransferLeg {
    #[must_use]
    pub fn new(from: SeatId, to: SeatId, amounts: KeywordRecord) -> Self {
        Self {
            from,
            to,
            debit: amounts,
            credit: None,
        }
    }

    /// Credit the destination under different keywords than the debit.
    #[must_use]
    pub fn with_credit(mut self, credit: KeywordRecord) -> Self {
        self.credit = Some(credit);
        self
    }

    /// The record credited to `to`.
    #[must_use]
    pub fn credits(&self) -> &KeywordRecord {
        self.credit.as_ref().unwrap_or(&self.debit)
    }
}

/// Summary of a committed rearrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RearrangeSummary {
    /// Brands touched, with the total amount moved of each.
    pub moved: BTreeMap<Brand, Amount>,
    /// Seats whose allocation changed.
    pub seats: Vec<SeatId>,
}

#[derive(Default)]
struct Tally {
    debited: BTreeMap<Brand, Amount>,
    credited: BTreeMap<Brand, Amount>,
}

fn tally_into(side: &mut BTreeMap<Brand, Amount>, amount: &Amount) -> Result<()> {
    let total = match side.get(amount.brand()) {
        Some(current) => current.add(amount)?,
        None => amount.clone(),
    };
    side.insert(amount.brand().clone(), total);
    Ok(())
}

fn stage_debit(
    staged: &mut KeywordRecord,
    leg_index: usize,
    seat: SeatId,
    keyword: &Keyword,
    amount: &Amount,
) -> Result<()> {
    let current = staged
        .get(keyword)
        .cloned()
        .unwrap_or_else(|| Amount::empty(amount.brand()));
    if !current.is_gte(amount)? {
        return Err(OfferUpError::InsufficientValue {
            reason: format!(
                "leg {leg_index}: {seat} holds {current} under {keyword}, cannot give {amount}"
            ),
        });
    }
    let left = current.subtract(amount)?;
    if left.is_empty() {
        staged.remove(keyword);
    } else {
        staged.insert(keyword.clone(), left);
    }
    Ok(())
}

fn stage_credit(staged: &mut KeywordRecord, keyword: &Keyword, amount: &Amount) -> Result<()> {
    let updated = match staged.get(keyword) {
        Some(current) => current.add(amount)?,
        None => amount.clone(),
    };
    if !updated.is_empty() {
        staged.insert(keyword.clone(), updated);
    }
    Ok(())
}

/// Validate every leg and the per-brand balance without touching the ledger.
///
/// Returns the staged post-rearrangement allocations of every touched seat.
fn dry_run(
    ledger: &SeatLedger,
    legs: &[TransferLeg],
) -> Result<(BTreeMap<SeatId, KeywordRecord>, Tally)> {
    if legs.is_empty() {
        return Err(OfferUpError::EmptyRearrangement);
    }
    let mut staged: BTreeMap<SeatId, KeywordRecord> = BTreeMap::new();
    let mut tally = Tally::default();

    for (i, leg) in legs.iter().enumerate() {
        let from = ledger.active_seat(leg.from)?;
        let to = ledger.active_seat(leg.to)?;
        let to_allocation = to.allocation().clone();

        let source = staged
            .entry(leg.from)
            .or_insert_with(|| from.allocation().clone());
        for (keyword, amount) in &leg.debit {
            stage_debit(source, i, leg.from, keyword, amount)?;
            tally_into(&mut tally.debited, amount)?;
        }

        let dest = staged.entry(leg.to).or_insert(to_allocation);
        for (keyword, amount) in leg.credits() {
            stage_credit(dest, keyword, amount)?;
            tally_into(&mut tally.credited, amount)?;
        }
    }
    Ok((staged, tally))
}

fn check_conservation(tally: &Tally) -> Result<()> {
    let brands = tally.debited.keys().chain(tally.credited.keys());
    for brand in brands {
        let debited = tally
            .debited
            .get(brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand));
        let credited = tally
            .credited
            .get(brand)
            .cloned()
            .unwrap_or_else(|| Amount::empty(brand));
        if debited != credited {
            return Err(OfferUpError::ConservationViolation {
                brand: brand.to_string(),
                delta: format!("debited {debited}, credited {credited}"),
            });
        }
    }
    Ok(())
}

fn invariant_break(leg_index: usize, err: &OfferUpError) -> ! {
    error!(leg = leg_index, %err, "rearrangement commit failed after a successful dry run");
    panic!("rearrangement invariant broken at leg {leg_index}: {err}");
}

/// Apply `legs` to the ledger as one indivisible step.
///
/// # Errors
/// `EmptyRearrangement`, `SeatNotFound`, `SeatNotActive`,
/// `InsufficientValue`, `BrandMismatch` or `ConservationViolation`. On any
/// error no seat has changed.
///
/// # Panics
/// Panics if the commit pass fails after validation succeeded, which would
/// mean the ledger's own invariants are broken.
pub fn atomic_rearrange(ledger: &mut SeatLedger, legs: &[TransferLeg]) -> Result<RearrangeSummary> {
    let (staged, tally) = dry_run(ledger, legs)?;
    check_conservation(&tally)?;
    debug!(legs = legs.len(), seats = staged.len(), "rearrangement validated");

    for (i, leg) in legs.iter().enumerate() {
        for (keyword, amount) in &leg.debit {
            if let Err(err) = ledger.credit_subtract(leg.from, keyword, amount) {
                invariant_break(i, &err);
            }
        }
        for (keyword, amount) in leg.credits() {
            if let Err(err) = ledger.credit_add(leg.to, keyword, amount) {
                invariant_break(i, &err);
            }
        }
    }

    debug_assert!(
        staged.iter().all(|(id, expected)| ledger
            .seat(*id)
            .is_ok_and(|seat| seat.allocation() == expected)),
        "committed allocations diverge from the dry run"
    );

    info!(legs = legs.len(), seats = staged.len(), "rearrangement committed");
    Ok(RearrangeSummary {
        moved: tally.debited,
        seats: staged.into_keys().collect(),
    })
}
