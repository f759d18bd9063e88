//! The contract instance: terms, shape, mint, ledger, and invitations.
//!
//! One [`OfferUpContract`] owns every piece of mutable state of a single
//! contract instance. Hosts start it with [`OfferUpContract::configure`],
//! hand out invitations, and redeem them with proposals. Each redemption
//! runs to completion before the call returns.

use offerup_escrow::{ItemMint, Seat, SeatLedger};
use offerup_types::{
    AmountPattern, AssetKind, Brand, ExitPattern, InvitationHandle, Keyword, KeywordRule,
    OfferUpError, Proposal, ProposalShape, Result, SeatId, TradeTerms, constants,
};
use tracing::info;

use crate::handler::{self, TradeOutcome};
use crate::invitation::{Invitation, InvitationRegistry};

/// A configured trade contract.
#[derive(Debug)]
pub struct OfferUpContract {
    pub(crate) terms: TradeTerms,
    pub(crate) shape: ProposalShape,
    pub(crate) mint: ItemMint,
    pub(crate) ledger: SeatLedger,
    /// Seat that collects every trade's payment.
    pub(crate) proceeds: SeatId,
    pub(crate) invitations: InvitationRegistry,
    pub(crate) price_kw: Keyword,
    pub(crate) items_kw: Keyword,
    pub(crate) trades_completed: u64,
}

impl OfferUpContract {
    /// Start a contract instance.
    ///
    /// Registers the item brand and its mint, opens the proceeds seat and
    /// derives the proposal shape every invitation is checked against:
    /// `give.Price >= trade_price`, `want.Items` a bag of the item brand,
    /// any exit rule.
    ///
    /// # Errors
    /// Returns `Configuration` if the terms are unusable (zero item cap,
    /// non-fungible price).
    pub fn configure(terms: TradeTerms) -> Result<Self> {
        terms.validate()?;
        if terms.trade_price.brand().kind() != AssetKind::Nat {
            return Err(OfferUpError::Configuration(format!(
                "trade price brand {} must be fungible",
                terms.trade_price.brand()
            )));
        }

        let price_kw = Keyword::new(constants::PRICE_KEYWORD)?;
        let items_kw = Keyword::new(constants::ITEMS_KEYWORD)?;
        let mint = ItemMint::new(terms.item_brand_name.clone());

        let shape = ProposalShape::new()
            .give(
                price_kw.clone(),
                KeywordRule::required(AmountPattern::Gte(terms.trade_price.clone())),
            )
            .want(
                items_kw.clone(),
                KeywordRule::required(AmountPattern::OfKind {
                    brand: mint.brand().clone(),
                    kind: AssetKind::Bag,
                }),
            )
            .exit(ExitPattern::Any);

        let mut ledger = SeatLedger::new();
        let proceeds = ledger.allocate();

        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            trade_price = %terms.trade_price,
            max_items = terms.max_items,
            item_brand = %mint.brand(),
            proceeds = %proceeds,
            "contract configured"
        );

        Ok(Self {
            terms,
            shape,
            mint,
            ledger,
            proceeds,
            invitations: InvitationRegistry::new(),
            price_kw,
            items_kw,
            trades_completed: 0,
        })
    }

    /// Issue a one-shot invitation to trade.
    pub fn make_trade_invitation(&mut self) -> Invitation {
        self.invitations.issue()
    }

    /// Redeem an invitation with a proposal and run the trade to completion.
    ///
    /// The caller always gets an outcome: either a completed trade with its
    /// receipt, or a refund of the proposal's `give` with the reason.
    ///
    /// The invitation is consumed as soon as it is presented. A proposal
    /// that fails validation still uses it up; ask for a new invitation to
    /// try again.
    ///
    /// # Panics
    /// If a supply invariant breaks after a committed rearrangement. The
    /// instance must not keep running in that state.
    pub fn redeem(&mut self, invitation: InvitationHandle, proposal: Proposal) -> TradeOutcome {
        handler::run_trade(self, invitation, proposal)
    }

    // -- inspection --

    #[must_use]
    pub fn proposal_shape(&self) -> &ProposalShape {
        &self.shape
    }

    #[must_use]
    pub fn item_brand(&self) -> &Brand {
        self.mint.brand()
    }

    #[must_use]
    pub fn price_brand(&self) -> &Brand {
        self.terms.trade_price.brand()
    }

    #[must_use]
    pub fn terms(&self) -> &TradeTerms {
        &self.terms
    }

    /// The seat collecting payments.
    ///
    /// # Errors
    /// Never in practice; the proceeds seat is created by `configure`.
    pub fn proceeds(&self) -> Result<&Seat> {
        self.ledger.seat(self.proceeds)
    }

    /// # Errors
    /// Returns `SeatNotFound` for an unknown ID.
    pub fn seat(&self, id: SeatId) -> Result<&Seat> {
        self.ledger.seat(id)
    }

    /// Items minted so far, in units.
    #[must_use]
    pub fn mint_supply(&self) -> u128 {
        self.mint.supply()
    }

    #[must_use]
    pub fn trades_completed(&self) -> u64 {
        self.trades_completed
    }

    #[must_use]
    pub fn ledger(&self) -> &SeatLedger {
        &self.ledger
    }

    #[must_use]
    pub fn price_keyword(&self) -> &Keyword {
        &self.price_kw
    }

    #[must_use]
    pub fn items_keyword(&self) -> &Keyword {
        &self.items_kw
    }

    /// Invitations issued and not yet redeemed.
    #[must_use]
    pub fn outstanding_invitations(&self) -> usize {
        self.invitations.outstanding_count()
    }
}

#[cfg(test)]
mod tests {
    use offerup_types::{Amount, ContractConfig};

    use super::*;

    fn terms() -> TradeTerms {
        TradeTerms::new(Amount::nat(&Brand::dummy_nat(), 250_000))
    }

    #[test]
    fn configure_derives_shape() {
        let contract = OfferUpContract::configure(terms()).unwrap();
        let shape = contract.proposal_shape();

        let price = &shape.give[contract.price_keyword()];
        assert!(price.required);
        assert_eq!(price.pattern, AmountPattern::Gte(contract.terms().trade_price.clone()));

        let items = &shape.want[contract.items_keyword()];
        assert!(items.required);
        assert_eq!(items.pattern.brand(), contract.item_brand());
        assert_eq!(shape.exit, ExitPattern::Any);
        assert_eq!(contract.item_brand().alleged_name(), "Item");
        assert_eq!(contract.item_brand().kind(), AssetKind::Bag);
    }

    #[test]
    fn configure_opens_empty_proceeds_seat() {
        let contract = OfferUpContract::configure(terms()).unwrap();
        let proceeds = contract.proceeds().unwrap();
        assert!(proceeds.is_active());
        assert!(proceeds.allocation().is_empty());
        assert_eq!(contract.mint_supply(), 0);
        assert_eq!(contract.trades_completed(), 0);
    }

    #[test]
    fn zero_item_cap_rejected() {
        let err = OfferUpContract::configure(terms().with_max_items(0)).unwrap_err();
        assert!(matches!(err, OfferUpError::Configuration(_)));
    }

    #[test]
    fn bag_price_rejected() {
        let bag = Brand::dummy_bag();
        let err = OfferUpContract::configure(TradeTerms::new(Amount::bag(&bag, &[("gold", 1)])))
            .unwrap_err();
        assert!(matches!(err, OfferUpError::Configuration(_)));
    }

    #[test]
    fn configure_from_json() {
        let ist = Brand::dummy_nat();
        let terms = ContractConfig::from_json_str(
            r#"{"price_brand": "IST", "trade_price": 250000, "max_items": 3}"#,
        )
        .unwrap()
        .into_terms(&ist)
        .unwrap();
        let contract = OfferUpContract::configure(terms).unwrap();
        assert_eq!(contract.terms().max_items, 3);
        assert_eq!(contract.price_brand(), &ist);
    }

    #[test]
    fn invitations_are_counted() {
        let mut contract = OfferUpContract::configure(terms()).unwrap();
        let a = contract.make_trade_invitation();
        let b = contract.make_trade_invitation();
        assert_ne!(a.handle, b.handle);
        assert_eq!(contract.outstanding_invitations(), 2);
    }
}
