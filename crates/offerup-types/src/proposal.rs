//! Proposals: what a requester offers, what they want, and how they may exit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Amount, Keyword, KeywordRecord};

/// Discriminant of an [`ExitRule`], used by shapes to constrain exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitKind {
    OnDemand,
    WaiveExit,
    AfterDeadline,
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnDemand => write!(f, "ON_DEMAND"),
            Self::WaiveExit => write!(f, "WAIVE_EXIT"),
            Self::AfterDeadline => write!(f, "AFTER_DEADLINE"),
        }
    }
}

/// How the requester may leave the trade. Enforced by the hosting runtime;
/// the engine only checks it against the shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitRule {
    /// The requester may exit at any time.
    #[default]
    OnDemand,
    /// The requester gives up the right to exit early.
    WaiveExit,
    /// The runtime exits the seat after this deadline.
    AfterDeadline { deadline_ms: u64 },
}

impl ExitRule {
    #[must_use]
    pub fn kind(&self) -> ExitKind {
        match self {
            Self::OnDemand => ExitKind::OnDemand,
            Self::WaiveExit => ExitKind::WaiveExit,
            Self::AfterDeadline { .. } => ExitKind::AfterDeadline,
        }
    }
}

/// A trade request. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub give: KeywordRecord,
    pub want: KeywordRecord,
    pub exit: ExitRule,
}

impl Proposal {
    /// An empty proposal with an on-demand exit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            give: KeywordRecord::new(),
            want: KeywordRecord::new(),
            exit: ExitRule::OnDemand,
        }
    }

    #[must_use]
    pub fn with_give(mut self, keyword: Keyword, amount: Amount) -> Self {
        self.give.insert(keyword, amount);
        self
    }

    #[must_use]
    pub fn with_want(mut self, keyword: Keyword, amount: Amount) -> Self {
        self.want.insert(keyword, amount);
        self
    }

    #[must_use]
    pub fn with_exit(mut self, exit: ExitRule) -> Self {
        self.exit = exit;
        self
    }
}

impl Default for Proposal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Brand;

    #[test]
    fn builder_collects_keywords() {
        let ist = Brand::dummy_nat();
        let item = Brand::dummy_bag();
        let p = Proposal::new()
            .with_give(Keyword::new("Price").unwrap(), Amount::nat(&ist, 5))
            .with_want(
                Keyword::new("Items").unwrap(),
                Amount::bag(&item, &[("map", 1)]),
            )
            .with_exit(ExitRule::WaiveExit);
        assert_eq!(p.give.len(), 1);
        assert_eq!(p.want.len(), 1);
        assert_eq!(p.exit.kind(), ExitKind::WaiveExit);
    }

    #[test]
    fn exit_kinds() {
        assert_eq!(ExitRule::default().kind(), ExitKind::OnDemand);
        assert_eq!(
            ExitRule::AfterDeadline { deadline_ms: 10 }.kind(),
            ExitKind::AfterDeadline
        );
        assert_eq!(format!("{}", ExitKind::AfterDeadline), "AFTER_DEADLINE");
    }
}
