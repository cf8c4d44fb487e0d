// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! TPM 2.0 Attestation Certificate Authority protocol engine.
//!
//! This crate turns a device's identity claim into an attestation identity
//! certificate using the TPM2 make-credential / activate-credential
//! handshake.  The handshake has two phases:
//! * an identity claim carrying the EK and AK public areas (plus whatever
//!   endorsement and platform credentials the device holds) is validated,
//!   and answered with a credential blob that only the genuine TPM can open
//! * a certificate request carrying the nonce recovered from the blob
//!   redeems the pending challenge and obtains the certificate(s)
//!
//! The [provision] module holds the two orchestrators; the remaining modules
//! provide the building blocks and the repository contracts they depend on.

pub mod config;
pub mod credential;
pub mod logging;
pub mod makecred;
pub mod message;
pub mod provision;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod testutil;

/// Seconds since the Unix epoch
pub(crate) fn unix_time() -> i64 {
    unix_time_millis() / 1000
}

pub(crate) fn unix_time_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
