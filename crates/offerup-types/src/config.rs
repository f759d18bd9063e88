//! Contract configuration.
//!
//! [`ContractConfig`] is the serialisable form hosts load from JSON. Because
//! brands cannot be deserialised, it names the payment brand only by its
//! alleged name; [`ContractConfig::into_terms`] binds it to the real brand
//! and produces the [`TradeTerms`] passed to `configure`.

use serde::{Deserialize, Serialize};

use crate::{Amount, AssetKind, Brand, OfferUpError, Result, constants};

fn default_max_items() -> u64 {
    constants::DEFAULT_MAX_ITEMS
}

fn default_item_brand_name() -> String {
    constants::DEFAULT_ITEM_BRAND_NAME.to_string()
}

/// Serialisable contract configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Alleged name of the payment brand (e.g., "IST").
    pub price_brand: String,
    /// Minimum payment per trade, in payment-brand units.
    pub trade_price: u128,
    /// Maximum total item count per trade.
    #[serde(default = "default_max_items")]
    pub max_items: u64,
    /// Alleged name of the brand the contract mints.
    #[serde(default = "default_item_brand_name")]
    pub item_brand_name: String,
}

impl ContractConfig {
    /// Parse a JSON configuration document.
    ///
    /// # Errors
    /// Returns `Serialization` on malformed JSON or missing fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Bind the configuration to the registered payment brand.
    ///
    /// # Errors
    /// Returns `Configuration` if the brand's name or kind does not match.
    pub fn into_terms(self, price_brand: &Brand) -> Result<TradeTerms> {
        if price_brand.alleged_name() != self.price_brand {
            return Err(OfferUpError::Configuration(format!(
                "price brand {price_brand} does not match configured name {:?}",
                self.price_brand
            )));
        }
        if price_brand.kind() != AssetKind::Nat {
            return Err(OfferUpError::Configuration(format!(
                "price brand {price_brand} must be fungible"
            )));
        }
        Ok(TradeTerms {
            trade_price: Amount::make_fungible(price_brand, self.trade_price)?,
            max_items: self.max_items,
            item_brand_name: self.item_brand_name,
        })
    }
}

/// Terms a contract instance is started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeTerms {
    /// Minimum amount a buyer must give as `Price`.
    pub trade_price: Amount,
    /// Maximum total item count per trade.
    pub max_items: u64,
    /// Alleged name of the brand the contract mints.
    pub item_brand_name: String,
}

impl TradeTerms {
    /// Terms with the default item cap and item brand name.
    #[must_use]
    pub fn new(trade_price: Amount) -> Self {
        Self {
            trade_price,
            max_items: constants::DEFAULT_MAX_ITEMS,
            item_brand_name: default_item_brand_name(),
        }
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = max_items;
        self
    }

    /// # Errors
    /// Returns `Configuration` if the terms cannot produce a usable contract.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(OfferUpError::Configuration(
                "max_items must be at least 1".to_string(),
            ));
        }
        if self.item_brand_name.is_empty() {
            return Err(OfferUpError::Configuration(
                "item brand name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
