// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::ITrustAnchorStore;
use openssl::x509::X509;
use std::sync::RwLock;

/// The store where trusted EK and platform CA certificates are stashed
#[derive(Default)]
pub struct MemoTrustAnchorStore {
    p: RwLock<Vec<X509>>,
}

impl MemoTrustAnchorStore {
    /// Returns a new empty TrustAnchorStore
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    pub fn add(&self, ta: X509) -> Result<(), Error> {
        let mut p = self.p.write()?;

        let der = ta.to_der().map_err(|e| Error::Syntax(e.to_string()))?;
        for known in p.iter() {
            if known.to_der().map_err(|e| Error::Syntax(e.to_string()))? == der {
                return Ok(());
            }
        }

        p.push(ta);

        Ok(())
    }

    /// Add to an existing (and possibly empty) TrustAnchorStore every
    /// certificate found in the given PEM bundle
    pub fn load_pem(&self, pem: &[u8]) -> Result<usize, Error> {
        let certs = X509::stack_from_pem(pem).map_err(|e| Error::Syntax(e.to_string()))?;
        let n = certs.len();

        for c in certs {
            self.add(c)?;
        }

        Ok(n)
    }
}

impl ITrustAnchorStore for MemoTrustAnchorStore {
    fn trust_anchors(&self) -> Result<Vec<X509>, Error> {
        Ok(self.p.read()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn load_pem_bundle() {
        let a = testutil::ca("CA one");
        let b = testutil::ca("CA two");

        let mut bundle = a.cert.to_pem().unwrap();
        bundle.extend(b.cert.to_pem().unwrap());
        bundle.extend(a.cert.to_pem().unwrap());

        let s = MemoTrustAnchorStore::new();

        assert_eq!(s.load_pem(&bundle).unwrap(), 3);
        assert_eq!(s.trust_anchors().unwrap().len(), 2);
    }
}
