// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Endorsement and platform credential parsing.

pub use self::common::*;
pub use self::endorsement::EndorsementCredential;
pub use self::errors::Error;
pub use self::platform::{PlatformCredential, PlatformCredentialType};

mod common;
mod endorsement;
mod errors;
mod platform;
