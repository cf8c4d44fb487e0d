// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::issuer::{CertificateIssuer, CertificateSubject, IssuanceRules};
use super::msglog::log_message;
use super::outcome::{RedeemResult, ValidationOutcome};
use super::resolver::CredentialResolver;
use super::state::{ProvisionEvent, ProvisionState};
use crate::makecred;
use crate::message::{
    CertificateRequest, CertificateResponse, Codec, IdentityClaim, ResponseStatus, TpmQuote,
};
use crate::store::{Device, IChallengeStore, IDeviceStore, IPolicyStore};
use crate::validation::ISupplyChainValidator;
use std::sync::Arc;
use tracing::{info, warn};

/// Second phase of the handshake: redeem the nonce recovered by the TPM and
/// issue the attestation (and LDevID) certificates.
pub struct CertificateRequestProcessor {
    resolver: CredentialResolver,
    validator: Arc<dyn ISupplyChainValidator>,
    challenges: Arc<dyn IChallengeStore>,
    devices: Arc<dyn IDeviceStore>,
    policy: Arc<dyn IPolicyStore>,
    issuer: Arc<CertificateIssuer>,
}

impl CertificateRequestProcessor {
    pub fn new(
        resolver: CredentialResolver,
        validator: Arc<dyn ISupplyChainValidator>,
        challenges: Arc<dyn IChallengeStore>,
        devices: Arc<dyn IDeviceStore>,
        policy: Arc<dyn IPolicyStore>,
        issuer: Arc<CertificateIssuer>,
    ) -> Self {
        Self {
            resolver,
            validator,
            challenges,
            devices,
            policy,
            issuer,
        }
    }

    /// Process a CBOR encoded [`CertificateRequest`].
    ///
    /// A nonce is redeemable once: unknown, replayed and expired nonces all
    /// get a FAIL response.
    pub fn process(&self, raw: &[u8]) -> Result<CertificateResponse, Error> {
        if raw.is_empty() {
            return Err(Error::Malformed("empty certificate request".to_string()));
        }

        let request =
            CertificateRequest::decode(raw).map_err(|e| Error::Malformed(e.to_string()))?;

        let quote = match request.quote.as_ref().filter(|q| !q.is_empty()) {
            Some(q) => {
                Some(TpmQuote::parse(q.as_slice()).map_err(|e| Error::Malformed(e.to_string()))?)
            }
            None => None,
        };

        let policy = self.policy.policy()?;
        let state = ProvisionState::ChallengeIssued;

        let challenge = match RedeemResult::from(self.challenges.consume(request.nonce.as_slice())?)
        {
            RedeemResult::Redeemed(c) => c,
            RedeemResult::NotFound => {
                let state = state.record(ProvisionEvent::NonceNotFound)?;
                warn!(
                    nonce = %hex::encode(request.nonce.as_slice()),
                    state = ?state,
                    "nonce not found"
                );

                let response = CertificateResponse::fail();
                log_message(policy.message_logging, true, "certificate-response", &response);

                return Ok(response);
            }
        };
        let state = state.record(ProvisionEvent::NonceRedeemed)?;

        // the stored claim was validated when the challenge was issued
        let claim = IdentityClaim::decode(challenge.raw_claim())
            .map_err(|e| Error::Malformed(e.to_string()))?;
        let hostname = claim.device_info.hostname().to_string();

        let ek = makecred::parse_public_area(claim.ek_public_area.as_slice())?;
        let ak = makecred::parse_public_area(claim.ak_public_area.as_slice())?;
        let ldevid = match claim.ldevid_public_area.as_ref().filter(|b| !b.is_empty()) {
            Some(b) => Some(makecred::parse_public_area(b.as_slice())?),
            None => None,
        };

        info!(hostname = %hostname, "nonce redeemed");

        let ec = self.resolver.resolve_endorsement_credential(&claim, &ek)?;
        let pcs = self
            .resolver
            .resolve_platform_credentials(&claim, ec.credential())?;

        let now = crate::unix_time();

        let mut device = match self.devices.find(&hostname)? {
            Some(d) => d,
            None => Device::new(claim.device_info.clone(), now),
        };
        if let Some(q) = quote {
            device.device_info.tpm.quote_hash = Some(q.hash);
            device.device_info.tpm.quote_signature = Some(q.signature);
        }
        device.last_report = now;
        self.devices.save(device.clone())?;

        let outcome = ValidationOutcome::from_optional(self.validator.validate_quote(&device));

        if !outcome.is_pass() {
            let state = state.record(ProvisionEvent::QuoteFailed)?;
            warn!(
                hostname = %hostname,
                status = %outcome.status(),
                state = ?state,
                "quote validation failed"
            );

            let response = CertificateResponse::fail();
            log_message(policy.message_logging, true, "certificate-request", &request);
            log_message(policy.message_logging, true, "certificate-response", &response);

            return Ok(response);
        }
        let state = state.record(ProvisionEvent::QuotePassed)?;

        let attestation = self.issuer.issue(
            &CertificateSubject {
                key: &ak,
                hostname: &hostname,
                ec: ec.credential(),
                pcs: &pcs,
                ldevid: false,
            },
            IssuanceRules::attestation(&policy),
            now,
        )?;

        let ldevid = match ldevid {
            Some(key) => Some(self.issuer.issue(
                &CertificateSubject {
                    key: &key,
                    hostname: &hostname,
                    ec: ec.credential(),
                    pcs: &pcs,
                    ldevid: true,
                },
                IssuanceRules::ldevid(&policy),
                now,
            )?),
            None => None,
        };

        let state = state.record(ProvisionEvent::CertificatesIssued)?;

        let response = CertificateResponse {
            certificate: attestation.certificate.map(|c| c.to_pem()).transpose()?,
            ldevid_certificate: ldevid
                .and_then(|i| i.certificate)
                .map(|c| c.to_pem())
                .transpose()?,
            status: ResponseStatus::Pass,
        };

        info!(
            hostname = %hostname,
            attestation = ?attestation.decision,
            ldevid = response.ldevid_certificate.is_some(),
            state = ?state,
            "certificate request complete"
        );

        log_message(policy.message_logging, false, "certificate-request", &request);
        log_message(policy.message_logging, false, "certificate-response", &response);

        Ok(response)
    }
}
