// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::device::Device;
use super::errors::Error;
use super::IDeviceStore;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoDeviceStore {
    p: RwLock<HashMap<String, Device>>,
}

impl MemoDeviceStore {
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    pub fn load_json(&self, j: &str) -> Result<(), Error> {
        let devices: Vec<Device> =
            serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        for d in devices {
            self.save(d)?;
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, Error> {
        let p = self.p.read()?;

        let mut devices: Vec<&Device> = p.values().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        serde_json::to_string_pretty(&devices).map_err(|e| Error::Syntax(e.to_string()))
    }
}

impl IDeviceStore for MemoDeviceStore {
    fn find(&self, name: &str) -> Result<Option<Device>, Error> {
        Ok(self.p.read()?.get(name).cloned())
    }

    fn save(&self, device: Device) -> Result<(), Error> {
        if device.name.is_empty() {
            return Err(Error::Sema("device has no name".to_string()));
        }

        self.p.write()?.insert(device.name.clone(), device);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::DeviceInfo;
    use crate::validation::AppraisalStatus;

    fn device(name: &str) -> Device {
        let mut di = DeviceInfo::default();
        di.network.hostname = name.to_string();
        Device::new(di, 1000)
    }

    #[test]
    fn save_replace_find() {
        let s = MemoDeviceStore::new();

        s.save(device("node-1")).unwrap();

        let mut d = s.find("node-1").unwrap().unwrap();
        assert_eq!(d.supply_chain_status, AppraisalStatus::Unknown);

        d.supply_chain_status = AppraisalStatus::Pass;
        s.save(d).unwrap();

        assert_eq!(
            s.find("node-1").unwrap().unwrap().supply_chain_status,
            AppraisalStatus::Pass
        );
        assert!(s.find("node-2").unwrap().is_none());
    }

    #[test]
    fn nameless_device_is_rejected() {
        let s = MemoDeviceStore::new();

        assert!(s.save(device("")).is_err());
    }

    #[test]
    fn json_snapshot() {
        let s = MemoDeviceStore::new();
        s.save(device("node-1")).unwrap();
        s.save(device("node-2")).unwrap();

        let t = MemoDeviceStore::new();
        t.load_json(&s.to_json().unwrap()).unwrap();

        assert_eq!(t.find("node-2").unwrap(), s.find("node-2").unwrap());
    }
}
