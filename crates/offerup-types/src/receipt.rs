//! Trade receipts for the OfferUp audit trail.
//!
//! Every settled trade yields a [`TradeReceipt`] whose `digest` is a SHA-256
//! over a canonical, domain-separated encoding of the settlement. The
//! wall-clock `settled_at` is deliberately outside the digest so that the
//! same settlement always hashes the same.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Amount, AmountValue, InvitationHandle, SeatId, constants};

/// Proof that one trade settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
    /// Position of this trade among the contract's settled trades (from 1).
    pub sequence: u64,
    /// The invitation that was redeemed.
    pub invitation: InvitationHandle,
    pub buyer_seat: SeatId,
    pub mint_seat: SeatId,
    pub proceeds_seat: SeatId,
    /// Amount moved from the buyer to the proceeds seat.
    pub price_paid: Amount,
    /// Amount minted and moved to the buyer.
    pub items: Amount,
    /// Mint supply (in item units) after this trade.
    pub supply_after: u128,
    pub settled_at: DateTime<Utc>,
    /// SHA-256 over the canonical payload.
    pub digest: [u8; 32],
}

impl TradeReceipt {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        sequence: u64,
        invitation: InvitationHandle,
        buyer_seat: SeatId,
        mint_seat: SeatId,
        proceeds_seat: SeatId,
        price_paid: Amount,
        items: Amount,
        supply_after: u128,
    ) -> Self {
        let mut receipt = Self {
            sequence,
            invitation,
            buyer_seat,
            mint_seat,
            proceeds_seat,
            price_paid,
            items,
            supply_after,
            settled_at: Utc::now(),
            digest: [0u8; 32],
        };
        receipt.digest = receipt.compute_digest();
        receipt
    }

    /// Canonical payload:
    /// `domain || sequence || invitation || seats || price_paid || items || supply_after`
    #[must_use]
    pub fn digest_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(256);
        payload.extend_from_slice(constants::RECEIPT_DOMAIN);
        payload.extend_from_slice(&self.sequence.to_le_bytes());
        payload.extend_from_slice(self.invitation.0.as_bytes());
        payload.extend_from_slice(&self.buyer_seat.0.to_le_bytes());
        payload.extend_from_slice(&self.mint_seat.0.to_le_bytes());
        payload.extend_from_slice(&self.proceeds_seat.0.to_le_bytes());
        encode_amount(&mut payload, &self.price_paid);
        encode_amount(&mut payload, &self.items);
        payload.extend_from_slice(&self.supply_after.to_le_bytes());
        payload
    }

    #[must_use]
    pub fn compute_digest(&self) -> [u8; 32] {
        let hash = Sha256::digest(self.digest_payload());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        out
    }

    /// Recompute the digest and compare with the stored one.
    #[must_use]
    pub fn verify_digest(&self) -> bool {
        self.compute_digest() == self.digest
    }

    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

fn encode_amount(out: &mut Vec<u8>, amount: &Amount) {
    out.extend_from_slice(amount.brand().id().as_bytes());
    match amount.value() {
        AmountValue::Nat(n) => {
            out.push(0);
            out.extend_from_slice(&n.to_le_bytes());
        }
        AmountValue::Bag(bag) => {
            out.push(1);
            out.extend_from_slice(&(bag.len() as u64).to_le_bytes());
            for (name, count) in bag.iter() {
                out.extend_from_slice(&(name.len() as u64).to_le_bytes());
                out.extend_from_slice(name.as_bytes());
                out.extend_from_slice(&count.to_le_bytes());
            }
        }
    }
}
