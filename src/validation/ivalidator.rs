// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::summary::ValidationSummary;
use crate::credential::{EndorsementCredential, PlatformCredential};
use crate::message::ComponentInfo;
use crate::store::Device;

/// Interface to the supply chain validation service
pub trait ISupplyChainValidator: Send + Sync {
    /// Appraise the device's credentials and component inventory
    fn validate_supply_chain(
        &self,
        ec: Option<&EndorsementCredential>,
        pcs: &[PlatformCredential],
        device: &Device,
        components: &[ComponentInfo],
    ) -> Result<ValidationSummary, Error>;

    /// Appraise the quote recorded in the device's TPM info.  `None` means
    /// quote validation is disabled and is not a failure.
    fn validate_quote(&self, device: &Device) -> Result<Option<ValidationSummary>, Error>;
}
