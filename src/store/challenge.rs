// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

pub const MIN_NONCE_LENGTH: usize = 8;

/// An outstanding challenge: the nonce sent to the client inside the
/// credential blob, and the identity claim it answers.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeState {
    #[serde_as(as = "Hex")]
    nonce: Vec<u8>,
    #[serde_as(as = "Hex")]
    raw_claim: Vec<u8>,
    created_at: i64,
}

impl ChallengeState {
    pub fn new(nonce: &[u8], raw_claim: &[u8], created_at: i64) -> Result<Self, Error> {
        if nonce.len() < MIN_NONCE_LENGTH {
            return Err(Error::Sema(format!(
                "nonce is {} bytes long, at least {MIN_NONCE_LENGTH} required",
                nonce.len()
            )));
        }

        Ok(Self {
            nonce: nonce.to_vec(),
            raw_claim: raw_claim.to_vec(),
            created_at,
        })
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn raw_claim(&self) -> &[u8] {
        &self.raw_claim
    }

    /// Unix time (seconds) the challenge was issued at
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn is_expired(&self, ttl_secs: Option<u64>, now: i64) -> bool {
        match ttl_secs {
            Some(ttl) => now.saturating_sub(self.created_at) > ttl as i64,
            None => false,
        }
    }
}
