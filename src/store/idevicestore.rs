// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::device::Device;
use super::errors::Error;

pub trait IDeviceStore: Send + Sync {
    fn find(&self, name: &str) -> Result<Option<Device>, Error>;

    /// Insert or replace the device with the same name
    fn save(&self, device: Device) -> Result<(), Error>;
}
