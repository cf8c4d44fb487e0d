// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::x509::X509;

/// Interface to the store where the CA certificates that endorsement
/// credentials chain up to are kept.
pub trait ITrustAnchorStore: Send + Sync {
    fn trust_anchors(&self) -> Result<Vec<X509>, Error>;
}
