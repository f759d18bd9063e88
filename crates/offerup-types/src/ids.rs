//! Identifiers used throughout OfferUp.
//!
//! Seats are numbered by the ledger that owns them, so their IDs are small
//! monotonically increasing integers. Invitations and brands use UUIDv7 so
//! they cannot be guessed from the outside.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SeatId
// ---------------------------------------------------------------------------

/// Identifier of one escrow seat, assigned by the seat ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SeatId(pub u64);

impl SeatId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// InvitationHandle
// ---------------------------------------------------------------------------

/// Handle of a one-shot trade invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InvitationHandle(pub Uuid);

impl InvitationHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for InvitationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvitationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BrandId
// ---------------------------------------------------------------------------

/// Opaque identity behind a [`crate::Brand`].
///
/// There is no constructor taking caller-chosen bytes: the only way to get
/// one is [`crate::Brand::issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct BrandId(Uuid);

impl BrandId {
    pub(crate) fn fresh() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for BrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_id_next() {
        assert_eq!(SeatId(5).next(), SeatId(6));
        assert_eq!(format!("{}", SeatId(5)), "seat:5");
    }

    #[test]
    fn invitation_handle_uniqueness() {
        let a = InvitationHandle::new();
        let b = InvitationHandle::new();
        assert_ne!(a, b);
        assert!(format!("{a}").starts_with("inv:"));
    }

    #[test]
    fn brand_ids_are_fresh() {
        let a = BrandId::fresh();
        let b = BrandId::fresh();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn seat_id_serde_roundtrip() {
        let id = SeatId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: SeatId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
