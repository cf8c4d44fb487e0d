// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

pub const PCR_COUNT: u8 = 24;
pub const IMA_PCR: u8 = 10;

/// Set of PCR indices the client is asked to quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcrSelection(u32);

impl PcrSelection {
    pub fn all() -> Self {
        Self((1 << PCR_COUNT) - 1)
    }

    /// All PCRs, minus the IMA one when `ignore_ima` is set
    pub fn for_policy(ignore_ima: bool) -> Self {
        let mut s = Self::all();
        if ignore_ima {
            s.unset(IMA_PCR);
        }
        s
    }

    pub fn unset(&mut self, pcr: u8) {
        if pcr < PCR_COUNT {
            self.0 &= !(1 << pcr);
        }
    }

    pub fn contains(&self, pcr: u8) -> bool {
        pcr < PCR_COUNT && self.0 & (1 << pcr) != 0
    }

    /// Comma separated list of the selected indices, e.g. `0,1,2`
    pub fn to_mask(&self) -> String {
        (0..PCR_COUNT)
            .filter(|i| self.contains(*i))
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
