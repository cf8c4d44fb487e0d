// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::issued::IssuedCertificate;
use crate::credential::{EndorsementCredential, PlatformCredential};

/// Interface to the store holding endorsement and platform credentials, and
/// the certificates issued from them.
pub trait ICertificateStore: Send + Sync {
    /// Save an endorsement credential, returning `false` if an identical one
    /// was already stored
    fn save_endorsement_credential(&self, ec: &EndorsementCredential) -> Result<bool, Error>;

    fn endorsement_credential_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<EndorsementCredential>, Error>;

    /// Lookup an endorsement credential given the hex encoded modulus of the
    /// EK it certifies
    fn endorsement_credential_by_modulus(
        &self,
        modulus_hex: &str,
    ) -> Result<Option<EndorsementCredential>, Error>;

    /// Save a platform credential, returning `false` if an identical one was
    /// already stored.  A base credential for a board that already has a
    /// different base credential is a [`Error::Conflict`].
    fn save_platform_credential(&self, pc: &PlatformCredential) -> Result<bool, Error>;

    fn platform_credentials_by_holder_serial(
        &self,
        serial: &str,
    ) -> Result<Vec<PlatformCredential>, Error>;

    fn platform_credentials_by_board_serial(
        &self,
        serial: &str,
    ) -> Result<Vec<PlatformCredential>, Error>;

    fn save_issued_certificate(&self, cert: IssuedCertificate) -> Result<(), Error>;

    /// Most recent certificate of the given kind issued to `device_name`
    fn latest_issued_certificate(
        &self,
        device_name: &str,
        ldevid: bool,
    ) -> Result<Option<IssuedCertificate>, Error>;
}
