// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! ACA configuration: signing identity, certificate profile and
//! provisioning policy.

use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_VALIDITY_DAYS: u32 = 3652;
pub const DEFAULT_REISSUE_THRESHOLD_DAYS: u32 = 365;

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Syntax(e) | Error::Io(e) | Error::Crypto(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Error::Crypto(e.to_string())
    }
}

/// When to render full protocol messages into the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageLogging {
    #[default]
    Never,
    OnFailedValidation,
    Always,
}

impl MessageLogging {
    pub fn should_log(&self, failed: bool) -> bool {
        match self {
            MessageLogging::Never => false,
            MessageLogging::OnFailedValidation => failed,
            MessageLogging::Always => true,
        }
    }
}

/// Provisioning policy, read-only to the protocol engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub issue_attestation_certificate: bool,
    pub generate_on_expiration: bool,
    pub reissue_threshold: u32,
    pub issue_devid_certificate: bool,
    pub generate_devid_on_expiration: bool,
    pub devid_reissue_threshold: u32,
    /// Leave PCR 10 out of the quote
    pub ignore_ima: bool,
    pub require_endorsement_credential: bool,
    pub message_logging: MessageLogging,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            issue_attestation_certificate: true,
            generate_on_expiration: false,
            reissue_threshold: DEFAULT_REISSUE_THRESHOLD_DAYS,
            issue_devid_certificate: true,
            generate_devid_on_expiration: false,
            devid_reissue_threshold: DEFAULT_REISSUE_THRESHOLD_DAYS,
            ignore_ima: false,
            require_endorsement_credential: false,
            message_logging: MessageLogging::Never,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningDigest {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl SigningDigest {
    pub fn message_digest(&self) -> MessageDigest {
        match self {
            SigningDigest::Sha256 => MessageDigest::sha256(),
            SigningDigest::Sha384 => MessageDigest::sha384(),
            SigningDigest::Sha512 => MessageDigest::sha512(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_validity_days() -> u32 {
    DEFAULT_VALIDITY_DAYS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcaConfig {
    pub aca_key: PathBuf,
    pub aca_certificate: PathBuf,
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
    #[serde(default)]
    pub signing_digest: SigningDigest,
    #[serde(default)]
    pub trust_anchors: Vec<PathBuf>,
    #[serde(default)]
    pub challenge_ttl_secs: Option<u64>,
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub log: LogConfig,
}

impl AcaConfig {
    pub fn load_json(j: &str) -> Result<Self, Error> {
        let c: Self = serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        if c.validity_days == 0 {
            return Err(Error::Syntax("validity_days must be positive".to_string()));
        }

        Ok(c)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let j = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;

        Self::load_json(&j)
    }
}

/// The key pair and certificate the ACA signs with
pub struct AcaIdentity {
    pub key: PKey<Private>,
    pub certificate: X509,
}

impl AcaIdentity {
    pub fn from_pem(key: &[u8], certificate: &[u8]) -> Result<Self, Error> {
        let key = PKey::private_key_from_pem(key)?;
        let certificate = X509::from_pem(certificate)?;

        if !certificate.public_key()?.public_eq(&key) {
            return Err(Error::Crypto(
                "ACA key does not match the ACA certificate".to_string(),
            ));
        }

        Ok(Self { key, certificate })
    }

    pub fn load(config: &AcaConfig) -> Result<Self, Error> {
        let read = |p: &Path| fs::read(p).map_err(|e| Error::Io(format!("{}: {e}", p.display())));

        Self::from_pem(&read(&config.aca_key)?, &read(&config.aca_certificate)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn load_minimal() {
        let c = AcaConfig::load_json(
            r#"{"aca_key": "aca.key", "aca_certificate": "aca.crt"}"#,
        )
        .unwrap();

        assert_eq!(c.validity_days, DEFAULT_VALIDITY_DAYS);
        assert_eq!(c.signing_digest, SigningDigest::Sha256);
        assert_eq!(c.policy, PolicySettings::default());
        assert_eq!(c.challenge_ttl_secs, None);
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn load_full() {
        let c = AcaConfig::load_json(
            r#"{
                "aca_key": "aca.key",
                "aca_certificate": "aca.crt",
                "validity_days": 30,
                "signing_digest": "sha384",
                "trust_anchors": ["ek-ca.pem"],
                "challenge_ttl_secs": 600,
                "policy": {
                    "generate_on_expiration": true,
                    "reissue_threshold": 10,
                    "ignore_ima": true,
                    "message_logging": "on-failed-validation"
                },
                "log": {"level": "debug", "json": true}
            }"#,
        )
        .unwrap();

        assert_eq!(c.validity_days, 30);
        assert_eq!(c.signing_digest, SigningDigest::Sha384);
        assert_eq!(c.trust_anchors, vec![PathBuf::from("ek-ca.pem")]);
        assert_eq!(c.challenge_ttl_secs, Some(600));
        assert!(c.policy.generate_on_expiration);
        assert_eq!(c.policy.reissue_threshold, 10);
        assert!(c.policy.issue_attestation_certificate);
        assert_eq!(c.policy.message_logging, MessageLogging::OnFailedValidation);
        assert!(c.log.json);
    }

    #[test]
    fn load_bad() {
        assert!(AcaConfig::load_json(r#"{"aca_key": "k"}"#).is_err());
        assert!(AcaConfig::load_json(
            r#"{"aca_key": "k", "aca_certificate": "c", "validity_days": 0}"#
        )
        .is_err());
    }

    #[test]
    fn message_logging_policy() {
        assert!(!MessageLogging::Never.should_log(true));
        assert!(MessageLogging::OnFailedValidation.should_log(true));
        assert!(!MessageLogging::OnFailedValidation.should_log(false));
        assert!(MessageLogging::Always.should_log(false));
    }

    #[test]
    fn identity_from_pem() {
        let ca = testutil::ca("ACA");
        let other = testutil::rsa2048();

        let key_pem = ca.key.private_key_to_pem_pkcs8().unwrap();
        let cert_pem = ca.cert.to_pem().unwrap();

        assert!(AcaIdentity::from_pem(&key_pem, &cert_pem).is_ok());

        let r = AcaIdentity::from_pem(&other.private_key_to_pem_pkcs8().unwrap(), &cert_pem);
        assert!(r.is_err());
    }
}
