//! Serialized access to one contract instance from many callers.
//!
//! Every call holds the lock for the whole turn, so two trades never
//! interleave and no commit pass runs concurrently with another.

use std::sync::{Arc, Mutex, MutexGuard};

use offerup_types::{InvitationHandle, OfferUpError, Proposal, Result, TradeTerms};

use crate::contract::OfferUpContract;
use crate::handler::TradeOutcome;
use crate::invitation::Invitation;

/// Cloneable handle to a contract; clones share the same instance.
#[derive(Clone)]
pub struct SharedContract {
    inner: Arc<Mutex<OfferUpContract>>,
}

impl SharedContract {
    #[must_use]
    pub fn new(contract: OfferUpContract) -> Self {
        Self {
            inner: Arc::new(Mutex::new(contract)),
        }
    }

    /// # Errors
    /// Same as [`OfferUpContract::configure`].
    pub fn configure(terms: TradeTerms) -> Result<Self> {
        OfferUpContract::configure(terms).map(Self::new)
    }

    fn lock(&self) -> Result<MutexGuard<'_, OfferUpContract>> {
        // A poisoned lock means a trade panicked on a broken invariant.
        self.inner
            .lock()
            .map_err(|_| OfferUpError::Internal("contract instance aborted".to_string()))
    }

    /// # Errors
    /// `Internal` if the instance was aborted.
    pub fn make_trade_invitation(&self) -> Result<Invitation> {
        Ok(self.lock()?.make_trade_invitation())
    }

    /// # Errors
    /// `Internal` if the instance was aborted. Trade rejections are reported
    /// in the outcome, not here.
    pub fn redeem(&self, invitation: InvitationHandle, proposal: Proposal) -> Result<TradeOutcome> {
        Ok(self.lock()?.redeem(invitation, proposal))
    }

    /// Run a read-only closure against the contract under the lock.
    ///
    /// # Errors
    /// `Internal` if the instance was aborted.
    pub fn inspect<R>(&self, f: impl FnOnce(&OfferUpContract) -> R) -> Result<R> {
        let guard = self.lock()?;
        Ok(f(&*guard))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use offerup_types::{Amount, Brand};

    use super::*;

    #[test]
    fn concurrent_trades_are_serialized() {
        let shared =
            SharedContract::configure(TradeTerms::new(Amount::nat(&Brand::dummy_nat(), 10)))
                .unwrap();

        let handles: Vec<_> = (0..8u64)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let inv = shared.make_trade_invitation().unwrap();
                    let sku = format!("sku{n}");
                    let proposal = shared
                        .inspect(|c| {
                            Proposal::new()
                                .with_give(c.price_keyword().clone(), Amount::nat(c.price_brand(), 10))
                                .with_want(
                                    c.items_keyword().clone(),
                                    Amount::bag(c.item_brand(), &[(sku.as_str(), 1)]),
                                )
                        })
                        .unwrap();
                    shared.redeem(inv.handle, proposal).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_completed());
        }

        shared
            .inspect(|c| {
                assert_eq!(c.trades_completed(), 8);
                assert_eq!(c.mint_supply(), 8);
                assert_eq!(
                    c.proceeds().unwrap().amount(c.price_keyword()),
                    Some(&Amount::nat(c.price_brand(), 80))
                );
                c.ledger().verify_all().unwrap();
            })
            .unwrap();
    }

    #[test]
    fn receipts_have_distinct_sequence_numbers() {
        let shared =
            SharedContract::configure(TradeTerms::new(Amount::nat(&Brand::dummy_nat(), 1)))
                .unwrap();
        let sequences: Vec<u64> = (0..4)
            .map(|_| {
                let inv = shared.make_trade_invitation().unwrap();
                let proposal = shared
                    .inspect(|c| {
                        Proposal::new()
                            .with_give(c.price_keyword().clone(), Amount::nat(c.price_brand(), 1))
                            .with_want(c.items_keyword().clone(), Amount::bag(c.item_brand(), &[]))
                    })
                    .unwrap();
                shared.redeem(inv.handle, proposal).unwrap().receipt().unwrap().sequence
            })
            .collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }
}
