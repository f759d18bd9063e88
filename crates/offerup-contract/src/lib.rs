//! # offerup-contract
//!
//! The OfferUp trade contract: buyers pay at least a fixed price and receive
//! freshly minted items of their choosing.
//!
//! ## Flow
//!
//! ```text
//! configure(terms) ──▶ make_trade_invitation() ──▶ redeem(handle, proposal)
//!                                                     │
//!                      validate ─▶ escrow ─▶ mint ─▶ atomic_rearrange ─▶ exit
//! ```
//!
//! - [`validator`]: proposal shape checks, run before any escrow activity
//! - [`invitation`]: one-shot trade invitations
//! - [`contract`]: the contract instance and its inspection accessors
//! - [`handler`]: the per-trade state machine and its outcomes
//! - [`shared`]: a mutex-serialized handle for concurrent hosts
//! - [`telemetry`]: tracing subscriber setup

pub mod contract;
pub mod handler;
pub mod invitation;
pub mod shared;
pub mod telemetry;
pub mod validator;

pub use contract::OfferUpContract;
pub use handler::{TradeOutcome, TradeReport, TradeState};
pub use invitation::{Invitation, InvitationRegistry};
pub use shared::SharedContract;
pub use validator::validate;
