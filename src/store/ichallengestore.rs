// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::challenge::ChallengeState;
use super::errors::Error;

/// Interface to the store where outstanding challenges are kept between the
/// two phases of the provisioning handshake.
pub trait IChallengeStore: Send + Sync {
    /// Persist a new challenge.  Saving a nonce that is already outstanding
    /// is an error and leaves the existing state untouched.
    fn save(&self, state: ChallengeState) -> Result<(), Error>;

    /// Atomically look up and remove the challenge for `nonce`.  At most one
    /// caller ever gets a given state back.
    fn consume(&self, nonce: &[u8]) -> Result<Option<ChallengeState>, Error>;
}
