// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::config::PolicySettings;

pub trait IPolicyStore: Send + Sync {
    /// The policy currently in force
    fn policy(&self) -> Result<PolicySettings, Error>;
}
