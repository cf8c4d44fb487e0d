// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::ivalidator::ISupplyChainValidator;
use super::summary::{AppraisalStatus, ValidationSummary};
use crate::credential::{EndorsementCredential, PlatformCredential};
use crate::message::ComponentInfo;
use crate::store::{Device, IPolicyStore, ITrustAnchorStore};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509StoreContext, X509};
use std::sync::Arc;
use tracing::debug;

/// Supply chain validator checking that the endorsement credential chains
/// to a configured CA and that platform credentials belong to it.
pub struct TrustAnchorValidator {
    anchors: Arc<dyn ITrustAnchorStore>,
    policy: Arc<dyn IPolicyStore>,
}

impl TrustAnchorValidator {
    pub fn new(anchors: Arc<dyn ITrustAnchorStore>, policy: Arc<dyn IPolicyStore>) -> Self {
        Self { anchors, policy }
    }

    fn verify_chain(&self, cert: &X509) -> Result<Option<String>, Error> {
        let mut builder = X509StoreBuilder::new()?;
        for ta in self.anchors.trust_anchors()? {
            builder.add_cert(ta)?;
        }
        let store = builder.build();

        let chain = Stack::new()?;
        let mut ctx = X509StoreContext::new()?;

        let failure = ctx.init(&store, cert, &chain, |c| {
            if c.verify_cert()? {
                Ok(None)
            } else {
                Ok(Some(c.error().error_string().to_string()))
            }
        })?;

        Ok(failure)
    }
}

impl ISupplyChainValidator for TrustAnchorValidator {
    fn validate_supply_chain(
        &self,
        ec: Option<&EndorsementCredential>,
        pcs: &[PlatformCredential],
        device: &Device,
        components: &[ComponentInfo],
    ) -> Result<ValidationSummary, Error> {
        let policy = self.policy.policy()?;
        let mut messages = vec![];

        match ec {
            Some(ec) => {
                let cert = ec.to_x509().map_err(|e| Error::Crypto(e.to_string()))?;

                if let Some(reason) = self.verify_chain(&cert)? {
                    messages.push(format!("endorsement credential: {reason}"));
                }

                for pc in pcs {
                    if pc.holder_serial_number() != ec.serial_number() {
                        messages.push(format!(
                            "platform credential {} is not bound to endorsement credential {}",
                            pc.serial_number(),
                            ec.serial_number()
                        ));
                    }
                }
            }
            None if policy.require_endorsement_credential => {
                messages.push("no endorsement credential".to_string());
            }
            None => {}
        }

        debug!(
            device = %device.name,
            platform_credentials = pcs.len(),
            components = components.len(),
            failures = messages.len(),
            "supply chain validation"
        );

        let overall = if messages.is_empty() {
            AppraisalStatus::Pass
        } else {
            AppraisalStatus::Fail
        };

        ValidationSummary::new(overall, messages)
    }

    fn validate_quote(&self, _device: &Device) -> Result<Option<ValidationSummary>, Error> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicySettings;
    use crate::message::DeviceInfo;
    use crate::store::{MemoPolicyStore, MemoTrustAnchorStore};
    use crate::testutil;

    fn validator(anchor: Option<&X509>, require_ec: bool) -> TrustAnchorValidator {
        let tas = MemoTrustAnchorStore::new();
        if let Some(a) = anchor {
            tas.add(a.clone()).unwrap();
        }

        let policy = MemoPolicyStore::new(PolicySettings {
            require_endorsement_credential: require_ec,
            ..Default::default()
        });

        TrustAnchorValidator::new(Arc::new(tas), Arc::new(policy))
    }

    fn device() -> Device {
        let mut di = DeviceInfo::default();
        di.network.hostname = "node-1".to_string();
        Device::new(di, 0)
    }

    fn ec(ca: &testutil::TestCa) -> EndorsementCredential {
        let ek = testutil::rsa2048();
        let der = testutil::ek_certificate(ca, &ek, 0x1234).to_der().unwrap();
        EndorsementCredential::parse(&der).unwrap()
    }

    #[test]
    fn trusted_ec_passes() {
        let ca = testutil::ca("EK CA");
        let v = validator(Some(&ca.cert), false);

        let s = v
            .validate_supply_chain(Some(&ec(&ca)), &[], &device(), &[])
            .unwrap();

        assert!(s.is_pass(), "{:?}", s.messages);
        assert_eq!(s.summary_id.len(), 32);
    }

    #[test]
    fn untrusted_ec_fails() {
        let ca = testutil::ca("EK CA");
        let other = testutil::ca("Other CA");
        let v = validator(Some(&other.cert), false);

        let s = v
            .validate_supply_chain(Some(&ec(&ca)), &[], &device(), &[])
            .unwrap();

        assert_eq!(s.overall, AppraisalStatus::Fail);
    }

    #[test]
    fn missing_ec_depends_on_policy() {
        let d = device();

        let lax = validator(None, false);
        assert!(lax.validate_supply_chain(None, &[], &d, &[]).unwrap().is_pass());

        let strict = validator(None, true);
        assert!(!strict.validate_supply_chain(None, &[], &d, &[]).unwrap().is_pass());
    }

    #[test]
    fn platform_credential_holder_mismatch() {
        let ca = testutil::ca("EK CA");
        let v = validator(Some(&ca.cert), false);

        let bound = PlatformCredential::parse(&testutil::platform_credential(
            "1234", 1, "BOARD", false,
        ))
        .unwrap();
        let stray = PlatformCredential::parse(&testutil::platform_credential(
            "9999", 2, "BOARD", true,
        ))
        .unwrap();

        let ec = ec(&ca);

        assert!(v
            .validate_supply_chain(Some(&ec), &[bound.clone()], &device(), &[])
            .unwrap()
            .is_pass());

        let s = v
            .validate_supply_chain(Some(&ec), &[bound, stray], &device(), &[])
            .unwrap();
        assert_eq!(s.overall, AppraisalStatus::Fail);
        assert_eq!(s.messages.len(), 1);
    }

    #[test]
    fn quote_validation_is_disabled() {
        let v = validator(None, false);

        assert!(v.validate_quote(&device()).unwrap().is_none());
    }
}
