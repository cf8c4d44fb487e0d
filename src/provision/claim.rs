// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::msglog::log_message;
use super::outcome::ValidationOutcome;
use super::resolver::CredentialResolver;
use super::state::{ProvisionEvent, ProvisionState};
use crate::makecred;
use crate::message::{
    Bytes, Codec, ComponentInfo, IdentityClaim, IdentityClaimResponse, PcrSelection,
    ResponseStatus,
};
use crate::store::{ChallengeState, Device, IChallengeStore, IDeviceStore, IPolicyStore};
use crate::validation::ISupplyChainValidator;
use std::sync::Arc;
use tracing::{info, warn};

/// First phase of the handshake: validate an identity claim and, if the
/// device passes, challenge it with a credential blob.
pub struct IdentityClaimProcessor {
    resolver: CredentialResolver,
    validator: Arc<dyn ISupplyChainValidator>,
    challenges: Arc<dyn IChallengeStore>,
    devices: Arc<dyn IDeviceStore>,
    policy: Arc<dyn IPolicyStore>,
}

impl IdentityClaimProcessor {
    pub fn new(
        resolver: CredentialResolver,
        validator: Arc<dyn ISupplyChainValidator>,
        challenges: Arc<dyn IChallengeStore>,
        devices: Arc<dyn IDeviceStore>,
        policy: Arc<dyn IPolicyStore>,
    ) -> Self {
        Self {
            resolver,
            validator,
            challenges,
            devices,
            policy,
        }
    }

    /// Process a CBOR encoded [`IdentityClaim`].
    ///
    /// Malformed input is an error and changes nothing.  A device failing
    /// validation gets a FAIL response with no credential blob, and no
    /// challenge is recorded for it.
    pub fn process(&self, raw: &[u8]) -> Result<IdentityClaimResponse, Error> {
        if raw.is_empty() {
            return Err(Error::Malformed("empty identity claim".to_string()));
        }

        let claim = IdentityClaim::decode(raw).map_err(|e| Error::Malformed(e.to_string()))?;

        let hostname = claim.device_info.hostname().to_string();
        if hostname.is_empty() {
            return Err(Error::Malformed("identity claim has no hostname".to_string()));
        }

        let ek = makecred::parse_public_area(claim.ek_public_area.as_slice())?;
        let ak = makecred::parse_public_area(claim.ak_public_area.as_slice())?;

        // certified in the second phase, but rejected before any challenge
        if let Some(area) = claim.ldevid_public_area.as_ref().filter(|b| !b.is_empty()) {
            makecred::parse_public_area(area.as_slice())?;
        }

        info!(
            hostname = %hostname,
            client_version = %claim.client_version,
            "identity claim received"
        );

        let policy = self.policy.policy()?;
        let now = crate::unix_time();

        let ec = self.resolver.resolve_endorsement_credential(&claim, &ek)?;
        let pcs = self
            .resolver
            .resolve_platform_credentials(&claim, ec.credential())?;

        let components = ComponentInfo::parse_paccor(&claim.paccor_output).unwrap_or_else(|e| {
            warn!(hostname = %hostname, error = %e, "unparseable component inventory");
            vec![]
        });

        let mut device = match self.devices.find(&hostname)? {
            Some(d) => d,
            None => Device::new(claim.device_info.clone(), now),
        };
        device.device_info = claim.device_info.clone();
        device.last_report = now;

        let outcome = ValidationOutcome::from_summary(self.validator.validate_supply_chain(
            ec.credential(),
            &pcs,
            &device,
            &components,
        ));

        device.supply_chain_status = outcome.status();
        device.summary_id = outcome.summary().map(|s| s.summary_id.clone());
        self.devices.save(device)?;

        info!(hostname = %hostname, status = %outcome.status(), "supply chain validation");

        let state = ProvisionState::AwaitingClaim;

        if !outcome.is_pass() {
            if let Some(s) = outcome.summary() {
                warn!(hostname = %hostname, reasons = ?s.messages, "supply chain validation failed");
            } else if let ValidationOutcome::Errored(e) = &outcome {
                warn!(hostname = %hostname, error = %e, "supply chain validator error");
            }

            let state = state.record(ProvisionEvent::ClaimRejected)?;
            info!(hostname = %hostname, state = ?state, "identity claim rejected");

            let response = IdentityClaimResponse::fail();
            log_message(policy.message_logging, true, "identity-claim", &claim);
            log_message(policy.message_logging, true, "identity-claim-response", &response);

            return Ok(response);
        }

        let nonce = makecred::generate_nonce()?;
        let blob = makecred::make_credential(&ek, &ak, &nonce)?;

        self.challenges
            .save(ChallengeState::new(&nonce, raw, now)?)?;

        let state = state.record(ProvisionEvent::ClaimValidated)?;

        info!(
            hostname = %hostname,
            nonce = %hex::encode(&nonce),
            state = ?state,
            "challenge issued"
        );

        let response = IdentityClaimResponse {
            credential_blob: Bytes::from(blob.to_vec()),
            pcr_mask: PcrSelection::for_policy(policy.ignore_ima).to_mask(),
            status: ResponseStatus::Pass,
        };

        log_message(policy.message_logging, false, "identity-claim", &claim);
        log_message(policy.message_logging, false, "identity-claim-response", &response);

        Ok(response)
    }
}
