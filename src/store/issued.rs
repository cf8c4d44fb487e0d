// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// A certificate issued by the ACA, together with what it was issued from
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCertificate {
    #[serde_as(as = "Hex")]
    pub der: Vec<u8>,
    pub device_name: String,
    /// `true` for LDevID certificates, `false` for attestation certificates
    pub ldevid: bool,
    pub endorsement_credential: Option<String>,
    pub platform_credentials: Vec<String>,
    /// Unix time, inclusive
    pub not_before: i64,
    /// Unix time, exclusive
    pub not_after: i64,
}

impl IssuedCertificate {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.not_after
    }

    /// Whole days left before expiry
    pub fn days_remaining(&self, now: i64) -> i64 {
        (self.not_after - now) / SECONDS_PER_DAY
    }

    pub fn to_pem(&self) -> Result<String, Error> {
        let x509 =
            openssl::x509::X509::from_der(&self.der).map_err(|e| Error::Sema(e.to_string()))?;
        let pem = x509.to_pem().map_err(|e| Error::Sema(e.to_string()))?;

        String::from_utf8(pem).map_err(|e| Error::Sema(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued(not_before: i64, days: i64) -> IssuedCertificate {
        IssuedCertificate {
            der: vec![],
            device_name: "node".to_string(),
            ldevid: false,
            endorsement_credential: None,
            platform_credentials: vec![],
            not_before,
            not_after: not_before + days * SECONDS_PER_DAY,
        }
    }

    #[test]
    fn remaining_days_truncate() {
        let c = issued(0, 30);

        assert_eq!(c.days_remaining(0), 30);
        assert_eq!(c.days_remaining(SECONDS_PER_DAY / 2), 29);
        assert!(!c.is_expired(30 * SECONDS_PER_DAY - 1));
        assert!(c.is_expired(30 * SECONDS_PER_DAY));
    }
}
