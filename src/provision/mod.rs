// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The two-phase provisioning handshake: identity claim in, credential blob
//! out; recovered nonce in, certificates out.

pub use self::claim::IdentityClaimProcessor;
pub use self::errors::Error;
pub use self::issuer::{
    decide, CertificateIssuer, CertificateSubject, Issuance, IssuanceDecision, IssuanceRules,
};
pub use self::outcome::{RedeemResult, ValidationOutcome};
pub use self::request::CertificateRequestProcessor;
pub use self::resolver::{CredentialLookup, CredentialResolver};
pub use self::state::{ProvisionEvent, ProvisionState};

mod claim;
mod errors;
mod issuer;
mod msglog;
mod outcome;
mod request;
mod resolver;
mod state;
