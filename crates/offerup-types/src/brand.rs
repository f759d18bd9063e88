//! Brands: the identity of one asset type.
//!
//! Amounts of different brands are never comparable or combinable. A brand
//! is created exactly once, by whoever registers the asset, and every amount
//! of that asset carries a copy of it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BrandId;

/// How values of a brand are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AssetKind {
    /// Fungible: a non-negative integer.
    Nat,
    /// Semi-fungible: a multiset of named items.
    Bag,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nat => write!(f, "NAT"),
            Self::Bag => write!(f, "BAG"),
        }
    }
}

/// An unforgeable asset-type identity.
///
/// Field order matters: the derived `Ord` sorts by the opaque id first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct Brand {
    id: BrandId,
    name: String,
    kind: AssetKind,
}

impl Brand {
    /// Register a new brand. Every call yields a distinct brand, even for
    /// the same alleged name.
    #[must_use]
    pub fn issue(name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            id: BrandId::fresh(),
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> BrandId {
        self.id
    }

    /// The name the issuer chose. Not an identity: two brands may share it.
    #[must_use]
    pub fn alleged_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> AssetKind {
        self.kind
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id.short())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Brand {
    /// A fresh fungible brand named `IST`, for tests.
    #[must_use]
    pub fn dummy_nat() -> Self {
        Self::issue("IST", AssetKind::Nat)
    }

    /// A fresh bag brand named `Item`, for tests.
    #[must_use]
    pub fn dummy_bag() -> Self {
        Self::issue("Item", AssetKind::Bag)
    }
}
