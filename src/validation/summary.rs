// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppraisalStatus {
    Pass,
    Fail,
    #[default]
    Unknown,
}

impl std::fmt::Display for AppraisalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppraisalStatus::Pass => write!(f, "PASS"),
            AppraisalStatus::Fail => write!(f, "FAIL"),
            AppraisalStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Result of a supply chain validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub overall: AppraisalStatus,
    pub summary_id: String,
    /// Why individual checks failed, if they did
    pub messages: Vec<String>,
}

impl ValidationSummary {
    /// Returns a summary with a fresh random identifier
    pub fn new(overall: AppraisalStatus, messages: Vec<String>) -> Result<Self, Error> {
        let mut id = [0u8; 16];
        openssl::rand::rand_bytes(&mut id)?;

        Ok(Self {
            overall,
            summary_id: hex::encode(id),
            messages,
        })
    }

    pub fn is_pass(&self) -> bool {
        self.overall == AppraisalStatus::Pass
    }
}
