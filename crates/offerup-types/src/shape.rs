//! Proposal shapes: declarative constraints a proposal must satisfy.
//!
//! A shape lists, for each side of a proposal, the keywords it accepts and a
//! pattern per keyword. Keywords the shape does not list are rejected.
//! Shapes are built once at configuration time and never mutated.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Amount, AssetKind, Brand, ExitKind, Keyword};

/// Constraint on a single amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AmountPattern {
    /// Same brand as the bound, and at least as large.
    Gte(Amount),
    /// Any amount of this brand whose value has this kind.
    OfKind { brand: Brand, kind: AssetKind },
}

impl AmountPattern {
    /// The brand every matching amount must carry.
    #[must_use]
    pub fn brand(&self) -> &Brand {
        match self {
            Self::Gte(bound) => bound.brand(),
            Self::OfKind { brand, .. } => brand,
        }
    }
}

/// Whether a keyword must appear, and what its amount must look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRule {
    pub required: bool,
    pub pattern: AmountPattern,
}

impl KeywordRule {
    #[must_use]
    pub fn required(pattern: AmountPattern) -> Self {
        Self {
            required: true,
            pattern,
        }
    }

    #[must_use]
    pub fn optional(pattern: AmountPattern) -> Self {
        Self {
            required: false,
            pattern,
        }
    }
}

/// Constraint on a proposal's exit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitPattern {
    Any,
    Only(ExitKind),
}

/// The full set of constraints for one invitation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalShape {
    pub give: BTreeMap<Keyword, KeywordRule>,
    pub want: BTreeMap<Keyword, KeywordRule>,
    pub exit: ExitPattern,
}

impl ProposalShape {
    /// A shape that accepts only the empty proposal with any exit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            give: BTreeMap::new(),
            want: BTreeMap::new(),
            exit: ExitPattern::Any,
        }
    }

    #[must_use]
    pub fn give(mut self, keyword: Keyword, rule: KeywordRule) -> Self {
        self.give.insert(keyword, rule);
        self
    }

    #[must_use]
    pub fn want(mut self, keyword: Keyword, rule: KeywordRule) -> Self {
        self.want.insert(keyword, rule);
        self
    }

    #[must_use]
    pub fn exit(mut self, exit: ExitPattern) -> Self {
        self.exit = exit;
        self
    }
}

impl Default for ProposalShape {
    fn default() -> Self {
        Self::new()
    }
}
