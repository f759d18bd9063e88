//! # offerup-escrow
//!
//! **Escrow Plane**: seat ledger, item mint, supply conservation, and the
//! atomic rearrangement engine.
//!
//! ## Architecture
//!
//! 1. **SeatLedger**: owns every seat's allocation; the only mutable balance state
//! 2. **ItemMint**: the single authority that creates new supply
//! 3. **SupplyConservation**: per-brand flow accounting, checked after each trade
//! 4. **atomic_rearrange**: validate-then-commit multi-leg transfers
//!
//! ## Mutation Paths
//!
//! ```text
//! host → SeatLedger.admit()            (escrow in)
//!      → ItemMint.mint_into()          (new supply)
//!      → atomic_rearrange()            (value moves between seats)
//!      → SeatLedger.exit()             (payout out)
//! ```
//!
//! Nothing else can change an allocation: the ledger's credit primitives
//! are private to this crate.

pub mod ledger;
pub mod mint;
pub mod rearrange;
pub mod supply_conservation;

pub use ledger::{ExitOutcome, Seat, SeatLedger, SeatStatus};
pub use mint::ItemMint;
pub use rearrange::{RearrangeSummary, TransferLeg, atomic_rearrange};
pub use supply_conservation::SupplyConservation;
