// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::issued::IssuedCertificate;
use super::ICertificateStore;
use crate::credential::{EndorsementCredential, PlatformCredential};
use multimap::MultiMap;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    /// endorsement credentials, indexed by content hash
    ecs: HashMap<String, EndorsementCredential>,

    /// platform credentials, indexed by content hash
    pcs: HashMap<String, PlatformCredential>,

    /// platform credential hashes, indexed by holder serial number
    by_holder: MultiMap<String, String>,

    /// platform credential hashes, indexed by board serial number
    by_board: MultiMap<String, String>,

    issued: Vec<IssuedCertificate>,
}

/// JSON shape of a store snapshot.  Credentials are kept as DER and parsed
/// again on load.
#[serde_as]
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    #[serde_as(as = "Vec<Hex>")]
    endorsement_credentials: Vec<Vec<u8>>,
    #[serde(default)]
    #[serde_as(as = "Vec<Hex>")]
    platform_credentials: Vec<Vec<u8>>,
    #[serde(default)]
    issued_certificates: Vec<IssuedCertificate>,
}

/// The store where credentials and issued certificates are stashed
#[derive(Debug, Default)]
pub struct MemoCertificateStore {
    p: RwLock<Inner>,
}

impl MemoCertificateStore {
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    /// Add to an existing (and possibly empty) store the credentials and
    /// certificates found in the given JSON snapshot.  This is also how
    /// credentials are uploaded ahead of provisioning.
    pub fn load_json(&self, j: &str) -> Result<(), Error> {
        let s: Snapshot = serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        for raw in &s.endorsement_credentials {
            let ec =
                EndorsementCredential::parse(raw).map_err(|e| Error::Syntax(e.to_string()))?;
            self.save_endorsement_credential(&ec)?;
        }

        for raw in &s.platform_credentials {
            let pc = PlatformCredential::parse(raw).map_err(|e| Error::Syntax(e.to_string()))?;
            self.save_platform_credential(&pc)?;
        }

        for c in s.issued_certificates {
            self.save_issued_certificate(c)?;
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, Error> {
        let p = self.p.read()?;

        let mut ecs: Vec<&EndorsementCredential> = p.ecs.values().collect();
        ecs.sort_by(|a, b| a.hash().cmp(b.hash()));
        let mut pcs: Vec<&PlatformCredential> = p.pcs.values().collect();
        pcs.sort_by(|a, b| a.hash().cmp(b.hash()));

        let s = Snapshot {
            endorsement_credentials: ecs.iter().map(|c| c.raw().to_vec()).collect(),
            platform_credentials: pcs.iter().map(|c| c.raw().to_vec()).collect(),
            issued_certificates: p.issued.clone(),
        };

        serde_json::to_string_pretty(&s).map_err(|e| Error::Syntax(e.to_string()))
    }

    fn platform_credentials_by(
        &self,
        index: impl Fn(&Inner) -> Option<&Vec<String>>,
    ) -> Result<Vec<PlatformCredential>, Error> {
        let p = self.p.read()?;

        Ok(index(&*p)
            .map(|hashes| {
                hashes
                    .iter()
                    .filter_map(|h| p.pcs.get(h).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl ICertificateStore for MemoCertificateStore {
    fn save_endorsement_credential(&self, ec: &EndorsementCredential) -> Result<bool, Error> {
        let mut p = self.p.write()?;

        if p.ecs.contains_key(ec.hash()) {
            return Ok(false);
        }

        p.ecs.insert(ec.hash().to_string(), ec.clone());

        Ok(true)
    }

    fn endorsement_credential_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<EndorsementCredential>, Error> {
        Ok(self.p.read()?.ecs.get(hash).cloned())
    }

    fn endorsement_credential_by_modulus(
        &self,
        modulus_hex: &str,
    ) -> Result<Option<EndorsementCredential>, Error> {
        let wanted = modulus_hex.to_lowercase();

        Ok(self
            .p
            .read()?
            .ecs
            .values()
            .find(|ec| ec.modulus_hex() == Some(wanted.as_str()))
            .cloned())
    }

    fn save_platform_credential(&self, pc: &PlatformCredential) -> Result<bool, Error> {
        let mut p = self.p.write()?;

        if p.pcs.contains_key(pc.hash()) {
            return Ok(false);
        }

        if pc.is_base() {
            if let Some(board) = pc.platform_serial() {
                let clash = p
                    .by_board
                    .get_vec(board)
                    .into_iter()
                    .flatten()
                    .filter_map(|h| p.pcs.get(h))
                    .any(|other| other.is_base());

                if clash {
                    return Err(Error::Conflict(format!(
                        "a base platform credential for board {board} already exists"
                    )));
                }
            }
        }

        let hash = pc.hash().to_string();

        p.by_holder
            .insert(pc.holder_serial_number().to_string(), hash.clone());
        if let Some(board) = pc.platform_serial() {
            p.by_board.insert(board.to_string(), hash.clone());
        }
        p.pcs.insert(hash, pc.clone());

        Ok(true)
    }

    fn platform_credentials_by_holder_serial(
        &self,
        serial: &str,
    ) -> Result<Vec<PlatformCredential>, Error> {
        self.platform_credentials_by(|p| p.by_holder.get_vec(serial))
    }

    fn platform_credentials_by_board_serial(
        &self,
        serial: &str,
    ) -> Result<Vec<PlatformCredential>, Error> {
        self.platform_credentials_by(|p| p.by_board.get_vec(serial))
    }

    fn save_issued_certificate(&self, cert: IssuedCertificate) -> Result<(), Error> {
        self.p.write()?.issued.push(cert);

        Ok(())
    }

    fn latest_issued_certificate(
        &self,
        device_name: &str,
        ldevid: bool,
    ) -> Result<Option<IssuedCertificate>, Error> {
        Ok(self
            .p
            .read()?
            .issued
            .iter()
            .filter(|c| c.device_name == device_name && c.ldevid == ldevid)
            .max_by_key(|c| c.not_before)
            .cloned())
    }
}
