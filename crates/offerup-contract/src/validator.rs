//! Proposal validator: the hard gate in front of all escrow activity.
//!
//! Every proposal is checked against the invitation's shape before any seat,
//! mint, or rearrangement call. Validation is a pure function: a rejected
//! proposal leaves nothing behind.
//!
//! ## Check Order
//!
//! For `give`, then `want`:
//! 1. every required keyword is present
//! 2. no keyword outside the shape is present
//! 3. each amount carries the expected brand
//! 4. each amount satisfies its pattern
//!
//! Then the exit rule. The first failure is returned.

use std::collections::BTreeMap;

use offerup_types::{
    AmountPattern, ExitPattern, Keyword, KeywordRecord, KeywordRule, OfferUpError, Proposal,
    ProposalShape, Result,
};

fn violation(side: &str, keyword: &Keyword, reason: String) -> OfferUpError {
    OfferUpError::ShapeViolation {
        keyword: format!("{side}.{keyword}"),
        reason,
    }
}

fn check_side(
    side: &str,
    record: &KeywordRecord,
    rules: &BTreeMap<Keyword, KeywordRule>,
) -> Result<()> {
    for (keyword, rule) in rules {
        if rule.required && !record.contains_key(keyword) {
            return Err(violation(side, keyword, "required keyword is missing".to_string()));
        }
    }

    for (keyword, amount) in record {
        let Some(rule) = rules.get(keyword) else {
            return Err(violation(side, keyword, "keyword is not allowed by the shape".to_string()));
        };

        let expected = rule.pattern.brand();
        if amount.brand() != expected {
            return Err(violation(
                side,
                keyword,
                format!("expected brand {expected}, got {}", amount.brand()),
            ));
        }

        match &rule.pattern {
            AmountPattern::Gte(minimum) => {
                if !amount.is_gte(minimum)? {
                    return Err(violation(
                        side,
                        keyword,
                        format!("amount {amount} is below the minimum {minimum}"),
                    ));
                }
            }
            AmountPattern::OfKind { kind, .. } => {
                if amount.value().kind() != *kind {
                    return Err(violation(
                        side,
                        keyword,
                        format!("expected a {kind} value, got {}", amount.value().kind()),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Check `proposal` against `shape`.
///
/// # Errors
/// Returns the first [`OfferUpError::ShapeViolation`] found; its `keyword`
/// is qualified by side (`give.Price`, `want.Items`, `exit`).
pub fn validate(proposal: &Proposal, shape: &ProposalShape) -> Result<()> {
    check_side("give", &proposal.give, &shape.give)?;
    check_side("want", &proposal.want, &shape.want)?;

    if let ExitPattern::Only(kind) = shape.exit {
        if proposal.exit.kind() != kind {
            return Err(OfferUpError::ShapeViolation {
                keyword: "exit".to_string(),
                reason: format!("expected a {kind} exit, got {}", proposal.exit.kind()),
            });
        }
    }
    Ok(())
}
