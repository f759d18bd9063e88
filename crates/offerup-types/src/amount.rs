//! Amount algebra.
//!
//! An [`Amount`] pairs a [`Brand`] with a value whose representation is fixed
//! by the brand's [`AssetKind`]. Amounts are immutable: every operation
//! returns a new amount, and every binary operation fails with
//! `BrandMismatch` when the operands' brands differ.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AssetKind, Bag, Brand, OfferUpError, Result};

/// The value part of an amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountValue {
    /// Fungible quantity.
    Nat(u128),
    /// Semi-fungible quantity.
    Bag(Bag),
}

impl AmountValue {
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Nat(_) => AssetKind::Nat,
            Self::Bag(_) => AssetKind::Bag,
        }
    }
}

/// A branded quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Amount {
    brand: Brand,
    value: AmountValue,
}

impl Amount {
    /// A fungible amount of `n` units.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if `brand` is not a fungible brand.
    pub fn make_fungible(brand: &Brand, n: u128) -> Result<Self> {
        Self::make(brand, AmountValue::Nat(n))
    }

    /// A bag amount.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if `brand` is not a bag brand.
    pub fn make_bag(brand: &Brand, bag: Bag) -> Result<Self> {
        Self::make(brand, AmountValue::Bag(bag))
    }

    /// An amount with an explicit value.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the value kind disagrees with the brand.
    pub fn make(brand: &Brand, value: AmountValue) -> Result<Self> {
        if value.kind() != brand.kind() {
            return Err(OfferUpError::InvalidAmount {
                reason: format!(
                    "brand {brand} holds {} values, got a {} value",
                    brand.kind(),
                    value.kind()
                ),
            });
        }
        Ok(Self {
            brand: brand.clone(),
            value,
        })
    }

    /// The identity element for `brand`.
    #[must_use]
    pub fn empty(brand: &Brand) -> Self {
        let value = match brand.kind() {
            AssetKind::Nat => AmountValue::Nat(0),
            AssetKind::Bag => AmountValue::Bag(Bag::new()),
        };
        Self {
            brand: brand.clone(),
            value,
        }
    }

    #[must_use]
    pub fn brand(&self) -> &Brand {
        &self.brand
    }

    #[must_use]
    pub fn value(&self) -> &AmountValue {
        &self.value
    }

    /// The bag, if this is a bag amount.
    #[must_use]
    pub fn as_bag(&self) -> Option<&Bag> {
        match &self.value {
            AmountValue::Bag(bag) => Some(bag),
            AmountValue::Nat(_) => None,
        }
    }

    /// Fungible value, or the bag's total item count.
    #[must_use]
    pub fn units(&self) -> u128 {
        match &self.value {
            AmountValue::Nat(n) => *n,
            AmountValue::Bag(bag) => bag.total_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.value {
            AmountValue::Nat(n) => *n == 0,
            AmountValue::Bag(bag) => bag.is_empty(),
        }
    }

    /// `self + other`.
    ///
    /// # Errors
    /// `BrandMismatch` on differing brands, `AmountOverflow` on overflow.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.ensure_same_brand(other)?;
        let value = match (&self.value, &other.value) {
            (AmountValue::Nat(a), AmountValue::Nat(b)) => {
                AmountValue::Nat(a.checked_add(*b).ok_or(OfferUpError::AmountOverflow)?)
            }
            (AmountValue::Bag(a), AmountValue::Bag(b)) => AmountValue::Bag(a.merge(b)?),
            _ => return Err(self.kind_confusion()),
        };
        Ok(Self {
            brand: self.brand.clone(),
            value,
        })
    }

    /// `self - other`.
    ///
    /// # Errors
    /// `BrandMismatch` on differing brands, `InsufficientValue` if the
    /// result (or any bag entry) would be negative.
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.ensure_same_brand(other)?;
        let value = match (&self.value, &other.value) {
            (AmountValue::Nat(a), AmountValue::Nat(b)) => {
                AmountValue::Nat(a.checked_sub(*b).ok_or_else(|| {
                    OfferUpError::InsufficientValue {
                        reason: format!("{a} of {} is less than {b}", self.brand),
                    }
                })?)
            }
            (AmountValue::Bag(a), AmountValue::Bag(b)) => AmountValue::Bag(a.checked_subtract(b)?),
            _ => return Err(self.kind_confusion()),
        };
        Ok(Self {
            brand: self.brand.clone(),
            value,
        })
    }

    /// `self >= other`. For bags: every entry of `other` is covered.
    ///
    /// # Errors
    /// `BrandMismatch` on differing brands.
    pub fn is_gte(&self, other: &Self) -> Result<bool> {
        self.ensure_same_brand(other)?;
        match (&self.value, &other.value) {
            (AmountValue::Nat(a), AmountValue::Nat(b)) => Ok(a >= b),
            (AmountValue::Bag(a), AmountValue::Bag(b)) => Ok(a.contains(b)),
            _ => Err(self.kind_confusion()),
        }
    }

    /// # Errors
    /// `BrandMismatch` if `other` carries a different brand.
    pub fn ensure_same_brand(&self, other: &Self) -> Result<()> {
        self.ensure_brand(&other.brand)
    }

    /// # Errors
    /// `BrandMismatch` if this amount is not of `brand`.
    pub fn ensure_brand(&self, brand: &Brand) -> Result<()> {
        if &self.brand == brand {
            Ok(())
        } else {
            Err(OfferUpError::BrandMismatch {
                expected: brand.to_string(),
                actual: self.brand.to_string(),
            })
        }
    }

    // Unreachable through the public constructors, which pin the value kind
    // to the brand kind.
    fn kind_confusion(&self) -> OfferUpError {
        OfferUpError::Internal(format!("value kind confusion on brand {}", self.brand))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AmountValue::Nat(n) => write!(f, "{n} {}", self.brand),
            AmountValue::Bag(bag) => {
                write!(f, "{{")?;
                for (i, (name, count)) in bag.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {count}")?;
                }
                write!(f, "}} {}", self.brand)
            }
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Amount {
    /// Fungible amount shortcut for tests. Panics on a bag brand.
    #[must_use]
    pub fn nat(brand: &Brand, n: u128) -> Self {
        Self::make_fungible(brand, n).expect("nat brand")
    }

    /// Bag amount shortcut for tests. Panics on a fungible brand.
    #[must_use]
    pub fn bag(brand: &Brand, entries: &[(&str, u64)]) -> Self {
        let bag = Bag::from_entries(entries.iter().copied()).expect("bag entries");
        Self::make_bag(brand, bag).expect("bag brand")
    }
}
