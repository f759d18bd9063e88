//! Keywords name the slots of proposals and seat allocations.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Amount, OfferUpError, Result};

/// Keyword under which a proposal gives or wants an amount (e.g. `Price`).
///
/// Must be ASCII, start with an uppercase letter, and continue with
/// letters or digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keyword(String);

impl Keyword {
    /// # Errors
    /// Returns `InvalidKeyword` if `name` breaks the naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = match name.chars().next() {
            None => Some("keyword is empty"),
            Some(c) if !c.is_ascii_uppercase() => Some("keyword must start with an uppercase letter"),
            Some(_) if !name.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Some("keyword must be ASCII alphanumeric")
            }
            Some(_) => None,
        };
        match reason {
            Some(reason) => Err(OfferUpError::InvalidKeyword {
                keyword: name,
                reason: reason.to_string(),
            }),
            None => Ok(Self(name)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Keyword {
    type Error = OfferUpError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Keyword> for String {
    fn from(kw: Keyword) -> Self {
        kw.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amounts indexed by keyword. Used for proposals' give/want, for seat
/// allocations, and for the two sides of a rearrangement leg.
pub type KeywordRecord = BTreeMap<Keyword, Amount>;

/// What a seat holds.
pub type Allocation = KeywordRecord;

/// Keyword-wise sum of two records.
///
/// # Errors
/// `BrandMismatch` if a keyword carries different brands on the two sides,
/// `AmountOverflow` on overflow.
pub fn add_records(left: &KeywordRecord, right: &KeywordRecord) -> Result<KeywordRecord> {
    let mut out = left.clone();
    for (keyword, amount) in right {
        let updated = match out.get(keyword) {
            Some(current) => current.add(amount)?,
            None => amount.clone(),
        };
        out.insert(keyword.clone(), updated);
    }
    out.retain(|_, amount| !amount.is_empty());
    Ok(out)
}
