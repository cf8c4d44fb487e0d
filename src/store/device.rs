// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::message::DeviceInfo;
use crate::validation::AppraisalStatus;
use serde::{Deserialize, Serialize};

/// A provisioned (or provisioning) device, keyed by hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub device_info: DeviceInfo,
    pub supply_chain_status: AppraisalStatus,
    pub summary_id: Option<String>,
    /// Unix time of the last identity claim
    pub last_report: i64,
}

impl Device {
    pub fn new(device_info: DeviceInfo, now: i64) -> Self {
        Self {
            name: device_info.hostname().to_string(),
            device_info,
            supply_chain_status: AppraisalStatus::Unknown,
            summary_id: None,
            last_report: now,
        }
    }
}
