//! # offerup-types
//!
//! Shared types, errors, and configuration for the **OfferUp** exchange engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`SeatId`], [`InvitationHandle`], [`BrandId`]
//! - **Brands**: [`Brand`], [`AssetKind`]
//! - **Amount algebra**: [`Amount`], [`AmountValue`], [`Bag`]
//! - **Keywords**: [`Keyword`], [`KeywordRecord`], [`Allocation`]
//! - **Proposals**: [`Proposal`], [`ExitRule`], [`ExitKind`]
//! - **Shapes**: [`ProposalShape`], [`KeywordRule`], [`AmountPattern`], [`ExitPattern`]
//! - **Receipts**: [`TradeReceipt`]
//! - **Configuration**: [`ContractConfig`], [`TradeTerms`]
//! - **Errors**: [`OfferUpError`] with `OU_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod bag;
pub mod brand;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod keyword;
pub mod proposal;
pub mod receipt;
pub mod shape;

// Re-export all primary types at crate root for ergonomic imports:
//   use offerup_types::{Amount, Bag, Brand, Proposal, ...};

pub use amount::*;
pub use bag::*;
pub use brand::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use keyword::*;
pub use proposal::*;
pub use receipt::*;
pub use shape::*;

// Constants are accessed via `offerup_types::constants::FOO`
// (not re-exported to avoid name collisions).
