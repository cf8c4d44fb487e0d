// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::IPolicyStore;
use crate::config::PolicySettings;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoPolicyStore {
    p: RwLock<PolicySettings>,
}

impl MemoPolicyStore {
    pub fn new(policy: PolicySettings) -> Self {
        Self {
            p: RwLock::new(policy),
        }
    }

    /// Replace the policy for subsequent requests
    pub fn set(&self, policy: PolicySettings) -> Result<(), Error> {
        *self.p.write()? = policy;
        Ok(())
    }
}

impl IPolicyStore for MemoPolicyStore {
    fn policy(&self) -> Result<PolicySettings, Error> {
        Ok(self.p.read()?.clone())
    }
}
