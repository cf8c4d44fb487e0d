// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Supply chain validation contract.

pub use self::errors::Error;
pub use self::ivalidator::ISupplyChainValidator;
pub use self::summary::{AppraisalStatus, ValidationSummary};
pub use self::trustanchor::TrustAnchorValidator;

mod errors;
mod ivalidator;
mod summary;
mod trustanchor;
