//! Trade handler: the per-request state machine.
//!
//! ```text
//!   RECEIVED ──validate──▶ VALIDATED ──admit──▶ ESCROWED ──mint + rearrange──▶ SETTLED
//!      │                      │                    │
//!      └──────────────────────┴────────────────────┴──────────────▶ REJECTED
//! ```
//!
//! A rejection before `ESCROWED` touches nothing. A rejection after it exits
//! the buyer seat with a refund of exactly what it escrowed, and discards the
//! mint seat if one was opened. A supply invariant that fails after a
//! committed rearrangement is fatal.
//!
//! The invitation is redeemed on arrival, before validation, so even a
//! proposal rejected for its shape has used it up.

use std::fmt;

use offerup_escrow::{ExitOutcome, TransferLeg, atomic_rearrange};
use offerup_types::{
    Amount, Brand, InvitationHandle, KeywordRecord, OfferUpError, Proposal, Result, SeatId,
    TradeReceipt, constants,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::contract::OfferUpContract;
use crate::validator::validate;

/// Where a trade request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeState {
    Received,
    Validated,
    Escrowed,
    Settled,
    Rejected,
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "RECEIVED"),
            Self::Validated => write!(f, "VALIDATED"),
            Self::Escrowed => write!(f, "ESCROWED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// What the requester gets back from a trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Trade settled; `payout` is the buyer seat's final allocation.
    Completed {
        message: String,
        receipt: TradeReceipt,
        payout: KeywordRecord,
    },
    /// Trade rejected; `refund` is everything the buyer gave back in full.
    Refunded {
        reason: OfferUpError,
        refund: KeywordRecord,
        /// Absent when the request was rejected before escrow.
        buyer_seat: Option<SeatId>,
    },
}

impl TradeOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    #[must_use]
    pub fn receipt(&self) -> Option<&TradeReceipt> {
        match self {
            Self::Completed { receipt, .. } => Some(receipt),
            Self::Refunded { .. } => None,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&OfferUpError> {
        match self {
            Self::Completed { .. } => None,
            Self::Refunded { reason, .. } => Some(reason),
        }
    }

    /// The buyer seat, if one was opened.
    #[must_use]
    pub fn buyer_seat(&self) -> Option<SeatId> {
        match self {
            Self::Completed { receipt, .. } => Some(receipt.buyer_seat),
            Self::Refunded { buyer_seat, .. } => *buyer_seat,
        }
    }

    /// Everything returned to the buyer: the payout or the refund.
    #[must_use]
    pub fn returned(&self) -> &KeywordRecord {
        match self {
            Self::Completed { payout, .. } => payout,
            Self::Refunded { refund, .. } => refund,
        }
    }

    /// Convert into the `Result` shape hosts usually want.
    ///
    /// # Errors
    /// The rejection reason for a refunded trade.
    pub fn into_result(self) -> Result<TradeReceipt> {
        match self {
            Self::Completed { receipt, .. } => Ok(receipt),
            Self::Refunded { reason, .. } => Err(reason),
        }
    }

    #[must_use]
    pub fn report(&self) -> TradeReport {
        match self {
            Self::Completed { message, receipt, .. } => TradeReport {
                state: TradeState::Settled,
                message: message.clone(),
                error_kind: None,
                buyer_seat: Some(receipt.buyer_seat),
                receipt_digest: Some(receipt.digest_hex()),
                supply_after: Some(receipt.supply_after),
            },
            Self::Refunded {
                reason, buyer_seat, ..
            } => TradeReport {
                state: TradeState::Rejected,
                message: reason.to_string(),
                error_kind: Some(reason.kind().to_string()),
                buyer_seat: *buyer_seat,
                receipt_digest: None,
                supply_after: None,
            },
        }
    }
}

/// Flat, serialisable summary of a trade outcome for hosts and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReport {
    pub state: TradeState,
    pub message: String,
    pub error_kind: Option<String>,
    pub buyer_seat: Option<SeatId>,
    pub receipt_digest: Option<String>,
    pub supply_after: Option<u128>,
}

impl TradeReport {
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A broken invariant after escrow is not recoverable.
fn invariant_break(context: &str, err: &OfferUpError) -> ! {
    error!(context, error = %err, kind = err.kind(), "trade invariant broken");
    panic!("{context}: {err}");
}

fn advance(state: &mut TradeState, next: TradeState, invitation: InvitationHandle) {
    debug!(invitation = %invitation, from = %state, to = %next, "trade state");
    *state = next;
}

/// Reject before anything was escrowed. Empty amounts are dropped from the
/// refund, as the ledger drops them on admission.
fn reject(
    state: &mut TradeState,
    invitation: InvitationHandle,
    reason: OfferUpError,
    mut give: KeywordRecord,
) -> TradeOutcome {
    give.retain(|_, amount| !amount.is_empty());
    warn!(invitation = %invitation, stage = %state, error = %reason, "trade rejected");
    advance(state, TradeState::Rejected, invitation);
    TradeOutcome::Refunded {
        reason,
        refund: give,
        buyer_seat: None,
    }
}

/// Reject after the buyer seat holds the escrow. The mint seat, if any,
/// exits first so nothing it holds stays live.
fn refund(
    ctx: &mut OfferUpContract,
    state: &mut TradeState,
    invitation: InvitationHandle,
    buyer: SeatId,
    mint_seat: Option<SeatId>,
    reason: OfferUpError,
) -> TradeOutcome {
    if reason.is_recoverable() {
        warn!(invitation = %invitation, stage = %state, seat = %buyer, error = %reason, "trade refunded");
    } else {
        error!(invitation = %invitation, stage = %state, seat = %buyer, error = %reason, "trade refunded on integration error");
    }

    if let Some(mint_seat) = mint_seat {
        if let Err(err) = ctx.ledger.exit(mint_seat, ExitOutcome::Discarded) {
            invariant_break("discard mint seat", &err);
        }
    }
    let returned = match ctx.ledger.exit(
        buyer,
        ExitOutcome::Refunded {
            reason: reason.to_string(),
        },
    ) {
        Ok(returned) => returned,
        Err(err) => invariant_break("refund buyer seat", &err),
    };

    advance(state, TradeState::Rejected, invitation);
    TradeOutcome::Refunded {
        reason,
        refund: returned,
        buyer_seat: Some(buyer),
    }
}

fn verify_brands(ctx: &OfferUpContract, brands: [&Brand; 2]) {
    for brand in brands {
        if let Err(err) = ctx.ledger.verify_supply(brand) {
            invariant_break("post-trade supply check", &err);
        }
    }
}

fn requested_items(ctx: &OfferUpContract, proposal: &Proposal) -> Result<Amount> {
    proposal
        .want
        .get(&ctx.items_kw)
        .cloned()
        .ok_or_else(|| OfferUpError::Internal("validated proposal lacks want.Items".to_string()))
}

fn offered_price(ctx: &OfferUpContract, proposal: &Proposal) -> Result<Amount> {
    proposal
        .give
        .get(&ctx.price_kw)
        .cloned()
        .ok_or_else(|| OfferUpError::Internal("validated proposal lacks give.Price".to_string()))
}

pub(crate) fn run_trade(
    ctx: &mut OfferUpContract,
    invitation: InvitationHandle,
    proposal: Proposal,
) -> TradeOutcome {
    let mut state = TradeState::Received;
    debug!(invitation = %invitation, state = %state, "trade received");

    // RECEIVED → VALIDATED
    if let Err(err) = ctx.invitations.redeem(invitation) {
        return reject(&mut state, invitation, err, proposal.give);
    }
    if let Err(err) = validate(&proposal, &ctx.shape) {
        return reject(&mut state, invitation, err, proposal.give);
    }
    let (price, items) = match (offered_price(ctx, &proposal), requested_items(ctx, &proposal)) {
        (Ok(price), Ok(items)) => (price, items),
        (Err(err), _) | (_, Err(err)) => return reject(&mut state, invitation, err, proposal.give),
    };
    advance(&mut state, TradeState::Validated, invitation);

    // VALIDATED → ESCROWED
    let buyer = match ctx.ledger.admit(proposal.give.clone()) {
        Ok(seat) => seat,
        Err(err) => return reject(&mut state, invitation, err, proposal.give),
    };
    advance(&mut state, TradeState::Escrowed, invitation);

    let requested = items.units();
    if requested > u128::from(ctx.terms.max_items) {
        let reason = OfferUpError::ItemLimitExceeded {
            max: ctx.terms.max_items,
            requested,
        };
        return refund(ctx, &mut state, invitation, buyer, None, reason);
    }

    // ESCROWED → SETTLED
    let mut gains = KeywordRecord::new();
    gains.insert(ctx.items_kw.clone(), items.clone());
    // A failed mint has already discarded its own seat.
    let mint_seat = match ctx.mint.mint_gains(&mut ctx.ledger, &gains) {
        Ok(seat) => seat,
        Err(err) => return refund(ctx, &mut state, invitation, buyer, None, err),
    };

    let mut payment = KeywordRecord::new();
    payment.insert(ctx.price_kw.clone(), price.clone());
    let legs = [
        TransferLeg::new(buyer, ctx.proceeds, payment),
        TransferLeg::new(mint_seat, buyer, gains),
    ];
    if let Err(err) = atomic_rearrange(&mut ctx.ledger, &legs) {
        return refund(ctx, &mut state, invitation, buyer, Some(mint_seat), err);
    }

    if let Err(err) = ctx.ledger.exit(mint_seat, ExitOutcome::Completed) {
        invariant_break("exit mint seat", &err);
    }
    let payout = match ctx.ledger.exit(buyer, ExitOutcome::Completed) {
        Ok(payout) => payout,
        Err(err) => invariant_break("exit buyer seat", &err),
    };
    verify_brands(ctx, [price.brand(), items.brand()]);

    ctx.trades_completed += 1;
    let receipt = TradeReceipt::new(
        ctx.trades_completed,
        invitation,
        buyer,
        mint_seat,
        ctx.proceeds,
        price,
        items,
        ctx.mint.supply(),
    );
    advance(&mut state, TradeState::Settled, invitation);
    info!(
        invitation = %invitation,
        sequence = receipt.sequence,
        buyer = %buyer,
        price = %receipt.price_paid,
        items = %receipt.items,
        supply = receipt.supply_after,
        digest = %receipt.digest_hex(),
        "trade settled"
    );

    TradeOutcome::Completed {
        message: constants::TRADE_COMPLETE.to_string(),
        receipt,
        payout,
    }
}
