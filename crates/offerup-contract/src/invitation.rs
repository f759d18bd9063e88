//! One-shot trade invitations.
//!
//! An invitation is the capability to submit one proposal to the trade
//! handler. Redeeming the same handle twice returns
//! [`OfferUpError::InvitationAlreadyRedeemed`]; handles this contract never
//! issued return [`OfferUpError::InvitationNotFound`].

use std::collections::HashSet;

use offerup_types::{InvitationHandle, OfferUpError, Result, constants};
use serde::Serialize;

/// What a host hands to a prospective buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub handle: InvitationHandle,
    pub description: String,
}

/// Issues invitations and guards against their reuse.
#[derive(Debug)]
pub struct InvitationRegistry {
    /// Issued and not yet redeemed.
    outstanding: HashSet<InvitationHandle>,
    /// Already redeemed.
    redeemed: HashSet<InvitationHandle>,
}

impl InvitationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            outstanding: HashSet::new(),
            redeemed: HashSet::new(),
        }
    }

    /// Issue a fresh trade invitation.
    pub fn issue(&mut self) -> Invitation {
        let handle = InvitationHandle::new();
        self.outstanding.insert(handle);
        Invitation {
            handle,
            description: constants::TRADE_INVITATION_DESCRIPTION.to_string(),
        }
    }

    /// Consume an invitation.
    ///
    /// # Errors
    /// `InvitationAlreadyRedeemed` on reuse, `InvitationNotFound` for a
    /// handle this registry never issued.
    pub fn redeem(&mut self, handle: InvitationHandle) -> Result<()> {
        if self.redeemed.contains(&handle) {
            return Err(OfferUpError::InvitationAlreadyRedeemed(handle));
        }
        if !self.outstanding.remove(&handle) {
            return Err(OfferUpError::InvitationNotFound(handle));
        }
        self.redeemed.insert(handle);
        Ok(())
    }

    #[must_use]
    pub fn is_outstanding(&self, handle: &InvitationHandle) -> bool {
        self.outstanding.contains(handle)
    }

    #[must_use]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    #[must_use]
    pub fn redeemed_count(&self) -> usize {
        self.redeemed.len()
    }
}

impl Default for InvitationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
