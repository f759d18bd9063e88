//! System-wide constants for the OfferUp exchange engine.

/// Default cap on the total number of items one trade may request.
pub const DEFAULT_MAX_ITEMS: u64 = 10;

/// Default alleged name of the brand minted by the contract.
pub const DEFAULT_ITEM_BRAND_NAME: &str = "Item";

/// Keyword under which buyers give payment.
pub const PRICE_KEYWORD: &str = "Price";

/// Keyword under which buyers want minted items.
pub const ITEMS_KEYWORD: &str = "Items";

/// Description attached to every trade invitation.
pub const TRADE_INVITATION_DESCRIPTION: &str = "buy items";

/// Message reported on every settled trade.
pub const TRADE_COMPLETE: &str = "trade complete";

/// Domain separator for trade receipt digests.
pub const RECEIPT_DOMAIN: &[u8] = b"offerup:trade_receipt:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OfferUp";
