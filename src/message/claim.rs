// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64::Bytes;
use super::codec::Codec;
use serde::{Deserialize, Serialize};

/// First message of the provisioning handshake.  Carries the TPM keys, any
/// credentials the client could read locally and a snapshot of the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub ek_public_area: Bytes,
    pub ak_public_area: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldevid_public_area: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorsement_credential: Option<Bytes>,
    #[serde(default)]
    pub platform_credentials: Vec<Bytes>,
    #[serde(default)]
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub log_files: Vec<Bytes>,
    #[serde(default)]
    pub swid_files: Vec<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_log: Option<Bytes>,
    #[serde(default)]
    pub paccor_output: String,
    #[serde(default)]
    pub client_version: String,
}

impl Codec for IdentityClaim {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub network: NetworkInfo,
    pub firmware: FirmwareInfo,
    pub os: OsInfo,
    pub hardware: HardwareInfo,
    pub tpm: TpmInfo,
}

impl DeviceInfo {
    pub fn hostname(&self) -> &str {
        &self.network.hostname
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInfo {
    pub hostname: String,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareInfo {
    pub bios_vendor: String,
    pub bios_version: String,
    pub bios_release_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub distribution: String,
    pub distribution_release: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareInfo {
    pub manufacturer: String,
    pub product_name: String,
    pub version: String,
    pub system_serial_number: String,
    pub chassis_serial_number: String,
    pub baseboard_serial_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TpmInfo {
    pub tpm_make: String,
    pub tpm_version_major: u16,
    pub tpm_version_minor: u16,
    pub tpm_version_rev_major: u16,
    pub tpm_version_rev_minor: u16,
    pub pcr_values: Option<Bytes>,
    pub quote_hash: Option<String>,
    pub quote_signature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Error;

    #[test]
    fn cbor_round_trip() {
        let mut c = IdentityClaim {
            ek_public_area: Bytes::from(vec![0x01; 262]),
            ak_public_area: Bytes::from(vec![0x02; 262]),
            endorsement_credential: Some(Bytes::from(vec![0x30, 0x00])),
            paccor_output: "{}".to_string(),
            client_version: "2.1.0".to_string(),
            ..Default::default()
        };
        c.device_info.network.hostname = "node-1.example".to_string();
        c.device_info.tpm.tpm_make = "STM".to_string();

        let buf = c.encode().unwrap();
        let d = IdentityClaim::decode(&buf).unwrap();

        assert_eq!(d, c);
        assert_eq!(d.device_info.hostname(), "node-1.example");
        assert!(d.ldevid_public_area.is_none());
    }

    #[test]
    fn decode_empty() {
        assert_eq!(
            IdentityClaim::decode(&[]),
            Err(Error::Decode("empty message".to_string()))
        );
    }

    #[test]
    fn decode_garbage() {
        assert!(IdentityClaim::decode(&[0xff, 0x00, 0x13]).is_err());
    }

    #[test]
    fn json_rendering_uses_base64() {
        let c = IdentityClaim {
            ek_public_area: Bytes::from(vec![0xff, 0xff]),
            ..Default::default()
        };

        let j = c.to_json().unwrap();

        assert!(j.contains("\"ek_public_area\":\"//8=\""));
    }
}
