//! Error types for the OfferUp exchange engine.
//!
//! All errors use the `OU_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Amount algebra errors
//! - 2xx: Proposal errors
//! - 3xx: Seat / escrow errors
//! - 4xx: Rearrangement errors
//! - 5xx: Invitation errors
//! - 8xx: Safety invariant errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{InvitationHandle, SeatId};

/// Central error enum for all OfferUp operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OfferUpError {
    // =================================================================
    // Amount Errors (1xx)
    // =================================================================
    /// Two amounts of different brands were combined or compared.
    #[error("OU_ERR_100: Brand mismatch: expected {expected}, got {actual}")]
    BrandMismatch { expected: String, actual: String },

    /// A subtraction would drive a value (or a bag entry) negative.
    #[error("OU_ERR_101: Insufficient value: {reason}")]
    InsufficientValue { reason: String },

    /// The amount's value kind disagrees with its brand's asset kind.
    #[error("OU_ERR_102: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Arithmetic overflowed the representable range.
    #[error("OU_ERR_103: Amount overflow")]
    AmountOverflow,

    // =================================================================
    // Proposal Errors (2xx)
    // =================================================================
    /// The proposal does not match the declared shape.
    #[error("OU_ERR_200: Shape violation at {keyword}: {reason}")]
    ShapeViolation { keyword: String, reason: String },

    /// The requested bag holds more items than the contract allows.
    #[error("OU_ERR_201: Item limit exceeded: max {max} items allowed, but got {requested}")]
    ItemLimitExceeded { max: u64, requested: u128 },

    /// A keyword failed the naming rules.
    #[error("OU_ERR_202: Invalid keyword {keyword:?}: {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    // =================================================================
    // Seat Errors (3xx)
    // =================================================================
    /// No seat with this ID exists in the ledger.
    #[error("OU_ERR_300: Seat not found: {0}")]
    SeatNotFound(SeatId),

    /// The seat has exited; its allocation can no longer change.
    #[error("OU_ERR_301: Seat not active: {0}")]
    SeatNotActive(SeatId),

    // =================================================================
    // Rearrangement Errors (4xx)
    // =================================================================
    /// Debits and credits of a brand do not balance across the legs.
    #[error("OU_ERR_400: Conservation violation for brand {brand}: {delta}")]
    ConservationViolation { brand: String, delta: String },

    /// A rearrangement was requested with no legs.
    #[error("OU_ERR_401: Rearrangement has no legs")]
    EmptyRearrangement,

    // =================================================================
    // Invitation Errors (5xx)
    // =================================================================
    /// The invitation was never issued by this contract.
    #[error("OU_ERR_500: Invitation not found: {0}")]
    InvitationNotFound(InvitationHandle),

    /// The invitation has already been redeemed.
    #[error("OU_ERR_501: Invitation already redeemed: {0}")]
    InvitationAlreadyRedeemed(InvitationHandle),

    // =================================================================
    // Safety Errors (8xx)
    // =================================================================
    /// Supply conservation invariant violated. Critical safety alert.
    #[error("OU_ERR_800: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid terms, missing fields, etc.).
    #[error("OU_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("OU_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("OU_ERR_902: Internal error: {0}")]
    Internal(String),
}

impl OfferUpError {
    /// Whether this error is an expected rejection of a requester's input.
    ///
    /// Recoverable errors are reported back with a refund. Everything else
    /// indicates broken wiring or a broken invariant. `AmountOverflow` is
    /// recoverable: a requester can ask for a count the mint cannot add, and
    /// overflow is always caught before anything commits.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ShapeViolation { .. }
                | Self::ItemLimitExceeded { .. }
                | Self::InvalidKeyword { .. }
                | Self::InvitationNotFound(_)
                | Self::InvitationAlreadyRedeemed(_)
                | Self::AmountOverflow
        )
    }

    /// Short, stable name of the variant for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrandMismatch { .. } => "BrandMismatch",
            Self::InsufficientValue { .. } => "InsufficientValue",
            Self::InvalidAmount { .. } => "InvalidAmount",
            Self::AmountOverflow => "AmountOverflow",
            Self::ShapeViolation { .. } => "ShapeViolation",
            Self::ItemLimitExceeded { .. } => "ItemLimitExceeded",
            Self::InvalidKeyword { .. } => "InvalidKeyword",
            Self::SeatNotFound(_) => "SeatNotFound",
            Self::SeatNotActive(_) => "SeatNotActive",
            Self::ConservationViolation { .. } => "ConservationViolation",
            Self::EmptyRearrangement => "EmptyRearrangement",
            Self::InvitationNotFound(_) => "InvitationNotFound",
            Self::InvitationAlreadyRedeemed(_) => "InvitationAlreadyRedeemed",
            Self::SupplyInvariantViolation { .. } => "SupplyInvariantViolation",
            Self::Configuration(_) => "Configuration",
            Self::Serialization(_) => "Serialization",
            Self::Internal(_) => "Internal",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OfferUpError>;

impl From<serde_json::Error> for OfferUpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
