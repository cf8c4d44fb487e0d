// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64::Bytes;
use super::codec::Codec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseStatus::Pass => write!(f, "PASS"),
            ResponseStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Reply to an [`IdentityClaim`](super::IdentityClaim).  On failure the blob
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaimResponse {
    pub credential_blob: Bytes,
    pub pcr_mask: String,
    pub status: ResponseStatus,
}

impl Codec for IdentityClaimResponse {}

impl IdentityClaimResponse {
    pub fn fail() -> Self {
        Self {
            credential_blob: Bytes::new(),
            pcr_mask: String::new(),
            status: ResponseStatus::Fail,
        }
    }
}

/// Second message of the handshake: the nonce recovered with
/// TPM2_ActivateCredential, and optionally a quote over the PCR mask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub nonce: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Bytes>,
}

impl Codec for CertificateRequest {}

/// PEM encoded certificates, absent on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldevid_certificate: Option<String>,
    pub status: ResponseStatus,
}

impl Codec for CertificateResponse {}

impl CertificateResponse {
    pub fn fail() -> Self {
        Self {
            certificate: None,
            ldevid_certificate: None,
            status: ResponseStatus::Fail,
        }
    }
}
