// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::credential::{EndorsementCredential, PlatformCredential};
use crate::makecred;
use crate::message::IdentityClaim;
use crate::store::{self, ICertificateStore};
use openssl::pkey::{HasPublic, PKeyRef};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialLookup<T> {
    /// Carried in the identity claim (and now persisted)
    Embedded(T),
    /// Found among previously uploaded credentials
    Uploaded(T),
    Missing,
}

impl<T> CredentialLookup<T> {
    pub fn credential(&self) -> Option<&T> {
        match self {
            CredentialLookup::Embedded(c) | CredentialLookup::Uploaded(c) => Some(c),
            CredentialLookup::Missing => None,
        }
    }

    pub fn into_credential(self) -> Option<T> {
        match self {
            CredentialLookup::Embedded(c) | CredentialLookup::Uploaded(c) => Some(c),
            CredentialLookup::Missing => None,
        }
    }
}

/// Finds the endorsement and platform credentials that go with an identity
/// claim, persisting any new ones.
#[derive(Clone)]
pub struct CredentialResolver {
    certs: Arc<dyn ICertificateStore>,
}

impl CredentialResolver {
    pub fn new(certs: Arc<dyn ICertificateStore>) -> Self {
        Self { certs }
    }

    pub fn resolve_endorsement_credential<T: HasPublic>(
        &self,
        claim: &IdentityClaim,
        ek: &PKeyRef<T>,
    ) -> Result<CredentialLookup<EndorsementCredential>, Error> {
        if let Some(raw) = claim.endorsement_credential.as_ref().filter(|b| !b.is_empty()) {
            match EndorsementCredential::parse(raw.as_slice()) {
                Ok(ec) => {
                    if self.certs.save_endorsement_credential(&ec)? {
                        info!(serial = ec.serial_number(), "endorsement credential stored");
                    }
                    return Ok(CredentialLookup::Embedded(ec));
                }
                Err(e) => warn!(error = %e, "unparseable endorsement credential in claim"),
            }
        }

        let modulus = makecred::modulus_hex(ek)?;

        match self.certs.endorsement_credential_by_modulus(&modulus)? {
            Some(ec) => {
                debug!(serial = ec.serial_number(), "using uploaded endorsement credential");
                Ok(CredentialLookup::Uploaded(ec))
            }
            None => {
                warn!("no endorsement credential for this EK");
                Ok(CredentialLookup::Missing)
            }
        }
    }

    pub fn resolve_platform_credentials(
        &self,
        claim: &IdentityClaim,
        ec: Option<&EndorsementCredential>,
    ) -> Result<Vec<PlatformCredential>, Error> {
        let mut pcs = vec![];

        for raw in claim.platform_credentials.iter().filter(|b| !b.is_empty()) {
            let pc = match PlatformCredential::parse(raw.as_slice()) {
                Ok(pc) => pc,
                Err(e) => {
                    warn!(error = %e, "unparseable platform credential in claim");
                    continue;
                }
            };

            match self.certs.save_platform_credential(&pc) {
                Ok(_) => pcs.push(pc),
                Err(store::Error::Conflict(e)) => warn!(error = %e, "platform credential dropped"),
                Err(e) => return Err(e.into()),
            }
        }

        if pcs.is_empty() {
            if let Some(ec) = ec {
                pcs = self
                    .certs
                    .platform_credentials_by_holder_serial(ec.serial_number())?;
            }
        }

        if let [pc] = pcs.as_slice() {
            if let Some(board) = pc.platform_serial().map(str::to_string) {
                for other in self.certs.platform_credentials_by_board_serial(&board)? {
                    if !pcs.iter().any(|p| p.hash() == other.hash()) {
                        pcs.push(other);
                    }
                }
            }
        }

        if pcs.is_empty() {
            warn!("no platform credentials");
        } else {
            debug!(count = pcs.len(), "platform credentials resolved");
        }

        Ok(pcs)
    }
}
