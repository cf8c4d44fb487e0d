// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use tracing::debug;

/// Where a device stands in the provisioning handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    AwaitingClaim,
    /// A nonce has been persisted and the credential blob sent out
    ChallengeIssued,
    NonceValidated,
    QuoteValidated,
    Issued,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionEvent {
    ClaimValidated,
    ClaimRejected,
    NonceRedeemed,
    NonceNotFound,
    QuotePassed,
    QuoteFailed,
    CertificatesIssued,
}

impl ProvisionState {
    pub fn advance(self, event: ProvisionEvent) -> Result<Self, Error> {
        use ProvisionEvent::*;
        use ProvisionState::*;

        match (self, event) {
            (AwaitingClaim, ClaimValidated) => Ok(ChallengeIssued),
            (AwaitingClaim, ClaimRejected) => Ok(Rejected),
            (ChallengeIssued, NonceRedeemed) => Ok(NonceValidated),
            (ChallengeIssued, NonceNotFound) => Ok(Rejected),
            (NonceValidated, QuotePassed) => Ok(QuoteValidated),
            (NonceValidated, QuoteFailed) => Ok(Rejected),
            (QuoteValidated, CertificatesIssued) => Ok(Issued),
            (s, e) => Err(Error::InvalidState(format!("{e:?} in state {s:?}"))),
        }
    }

    /// [`advance`](Self::advance), logging the transition
    pub fn record(self, event: ProvisionEvent) -> Result<Self, Error> {
        let next = self.advance(event)?;

        debug!(
            from = ?self,
            event = ?event,
            to = ?next,
            terminal = next.is_terminal(),
            "handshake state"
        );

        Ok(next)
    }

    /// The handshake ends here: no further event is accepted
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisionState::Issued | ProvisionState::Rejected)
    }
}
