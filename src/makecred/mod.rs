// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! TPM2 make-credential: AK names, KDFa and the credential blob that binds a
//! challenge nonce to an attestation key.

pub use self::credential::*;
pub use self::errors::Error;
pub use self::kdfa::kdfa;
pub use self::pubarea::*;

mod credential;
mod errors;
mod kdfa;
mod pubarea;
