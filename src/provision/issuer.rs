// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::config::{AcaIdentity, PolicySettings, SigningDigest};
use crate::credential::{self, EndorsementCredential, PlatformCredential, OID_TPM_ID_LABEL};
use crate::store::{ICertificateStore, IssuedCertificate, SECONDS_PER_DAY};
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::BigNum;
use openssl::pkey::{PKeyRef, Public};
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage,
};
use openssl::x509::{X509Builder, X509Extension, X509NameBuilder};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const OID_TCG_KP_AIK_CERTIFICATE: &str = "2.23.133.8.3";

/// What to do about a device that asks for a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceDecision {
    /// No certificate was issued before
    IssueNew,
    /// The previous certificate has expired
    ReplaceExpired,
    /// The previous certificate is within the reissue threshold
    ReissueEarly,
    /// Keep handing out the previous certificate
    Withhold,
    /// Policy forbids issuing this kind of certificate
    Disabled,
}

impl IssuanceDecision {
    pub fn issues(&self) -> bool {
        matches!(
            self,
            IssuanceDecision::IssueNew
                | IssuanceDecision::ReplaceExpired
                | IssuanceDecision::ReissueEarly
        )
    }
}

/// The slice of [`PolicySettings`] that governs one kind of certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceRules {
    pub enabled: bool,
    pub generate_on_expiration: bool,
    pub reissue_threshold_days: u32,
}

impl IssuanceRules {
    pub fn attestation(p: &PolicySettings) -> Self {
        Self {
            enabled: p.issue_attestation_certificate,
            generate_on_expiration: p.generate_on_expiration,
            reissue_threshold_days: p.reissue_threshold,
        }
    }

    pub fn ldevid(p: &PolicySettings) -> Self {
        Self {
            enabled: p.issue_devid_certificate,
            generate_on_expiration: p.generate_devid_on_expiration,
            reissue_threshold_days: p.devid_reissue_threshold,
        }
    }
}

pub fn decide(prev: Option<&IssuedCertificate>, rules: IssuanceRules, now: i64) -> IssuanceDecision {
    if !rules.enabled {
        return IssuanceDecision::Disabled;
    }

    match prev {
        None => IssuanceDecision::IssueNew,
        Some(p) if p.is_expired(now) => IssuanceDecision::ReplaceExpired,
        Some(_) if !rules.generate_on_expiration => IssuanceDecision::Withhold,
        Some(p) if p.days_remaining(now) < rules.reissue_threshold_days as i64 => {
            IssuanceDecision::ReissueEarly
        }
        Some(_) => IssuanceDecision::Withhold,
    }
}

/// Everything the certificate is about
pub struct CertificateSubject<'a> {
    pub key: &'a PKeyRef<Public>,
    pub hostname: &'a str,
    pub ec: Option<&'a EndorsementCredential>,
    pub pcs: &'a [PlatformCredential],
    pub ldevid: bool,
}

/// Outcome of [`CertificateIssuer::issue`]: the decision taken and the
/// certificate to return to the device, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub decision: IssuanceDecision,
    pub certificate: Option<IssuedCertificate>,
}

pub struct CertificateIssuer {
    identity: Arc<AcaIdentity>,
    validity_days: u32,
    digest: SigningDigest,
    certs: Arc<dyn ICertificateStore>,
    last_serial: AtomicI64,
}

impl CertificateIssuer {
    pub fn new(
        identity: Arc<AcaIdentity>,
        validity_days: u32,
        digest: SigningDigest,
        certs: Arc<dyn ICertificateStore>,
    ) -> Self {
        Self {
            identity,
            validity_days,
            digest,
            certs,
            last_serial: AtomicI64::new(0),
        }
    }

    /// Apply the issuance policy for `subject`, issuing and recording a new
    /// certificate when it calls for one
    pub fn issue(
        &self,
        subject: &CertificateSubject<'_>,
        rules: IssuanceRules,
        now: i64,
    ) -> Result<Issuance, Error> {
        let prev = self
            .certs
            .latest_issued_certificate(subject.hostname, subject.ldevid)?;

        let decision = decide(prev.as_ref(), rules, now);

        info!(
            hostname = subject.hostname,
            ldevid = subject.ldevid,
            ?decision,
            "issuance decision"
        );

        let certificate = match decision {
            d if d.issues() => {
                let c = self.generate(subject, now)?;
                self.certs.save_issued_certificate(c.clone())?;
                Some(c)
            }
            IssuanceDecision::Withhold => prev,
            _ => None,
        };

        Ok(Issuance {
            decision,
            certificate,
        })
    }

    /// Build and sign a certificate for `subject` valid from `now`
    pub fn generate(
        &self,
        subject: &CertificateSubject<'_>,
        now: i64,
    ) -> Result<IssuedCertificate, Error> {
        if subject.hostname.is_empty() {
            return Err(Error::Certificate("must provide a hostname".to_string()));
        }

        let not_after = now + self.validity_days as i64 * SECONDS_PER_DAY;
        let serial = self.next_serial();

        let serial_number = BigNum::from_dec_str(&serial.to_string())?.to_asn1_integer()?;
        let empty_subject = X509NameBuilder::new()?.build();
        let not_before = Asn1Time::from_unix(now)?;
        let not_after_time = Asn1Time::from_unix(not_after)?;

        let mut b = X509Builder::new()?;

        b.set_version(2)?;
        b.set_serial_number(&serial_number)?;
        b.set_issuer_name(self.identity.certificate.subject_name())?;
        b.set_subject_name(&empty_subject)?;
        b.set_pubkey(subject.key)?;
        b.set_not_before(&not_before)?;
        b.set_not_after(&not_after_time)?;

        b.append_extension(self.subject_alt_name(subject)?)?;

        if let Some(aki) = self.authority_key_identifier(&b)? {
            b.append_extension(aki)?;
        }

        b.append_extension(
            ExtendedKeyUsage::new()
                .critical()
                .other(OID_TCG_KP_AIK_CERTIFICATE)
                .client_auth()
                .build()?,
        )?;
        b.append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .build()?,
        )?;
        b.append_extension(BasicConstraints::new().critical().build()?)?;

        b.sign(&self.identity.key, self.digest.message_digest())?;

        let der = b.build().to_der()?;

        debug!(serial, hostname = subject.hostname, "certificate signed");

        Ok(IssuedCertificate {
            der,
            device_name: subject.hostname.to_string(),
            ldevid: subject.ldevid,
            endorsement_credential: subject.ec.map(|ec| ec.hash().to_string()),
            platform_credentials: subject.pcs.iter().map(|pc| pc.hash().to_string()).collect(),
            not_before: now,
            not_after,
        })
    }

    /// Current time in milliseconds, bumped if needed so that serials are
    /// strictly increasing within this issuer
    fn next_serial(&self) -> i64 {
        let now = crate::unix_time_millis();

        let mut last = self.last_serial.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last_serial
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Critical SAN holding a single directoryName: the SAN attributes of the
    /// endorsement and platform credentials followed by the TPM ID label
    fn subject_alt_name(&self, subject: &CertificateSubject<'_>) -> Result<X509Extension, Error> {
        let mut nb = X509NameBuilder::new()?;

        let attrs = subject
            .ec
            .map(|ec| ec.san_attributes())
            .unwrap_or_default()
            .iter()
            .chain(subject.pcs.iter().flat_map(|pc| pc.san_attributes()));

        for a in attrs {
            nb.append_entry_by_text(&a.oid, &a.value)?;
        }
        nb.append_entry_by_text(OID_TPM_ID_LABEL, subject.hostname)?;

        let name = nb.build().to_der()?;
        let san = credential::directory_name_san(&name)
            .map_err(|e| Error::Certificate(format!("subjectAltName: {e}")))?;

        let oid = Asn1Object::from_str(credential::OID_SUBJECT_ALT_NAME)?;
        let value = Asn1OctetString::new_from_bytes(&san)?;

        Ok(X509Extension::new_from_der(&oid, true, &value)?)
    }

    /// AKI carrying the ACA certificate's subject key identifier, if it has
    /// one
    fn authority_key_identifier(&self, b: &X509Builder) -> Result<Option<X509Extension>, Error> {
        let aca = &self.identity.certificate;

        if aca.subject_key_id().is_none() {
            return Ok(None);
        }

        let ctx = b.x509v3_context(Some(aca), None);

        Ok(Some(AuthorityKeyIdentifier::new().keyid(true).build(&ctx)?))
    }
}
