// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::common::{self, NameAttribute};
use super::errors::Error;
use crate::makecred;
use openssl::x509::X509;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;

/// An EK certificate, either embedded in an identity claim or uploaded ahead
/// of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndorsementCredential {
    raw: Vec<u8>,
    hash: String,
    serial_number: String,
    modulus_hex: Option<String>,
    issuer: Vec<NameAttribute>,
    san_attributes: Vec<NameAttribute>,
}

impl EndorsementCredential {
    /// Parse an EK certificate.  `buf` can be DER, PEM, or DER preceded by
    /// an NV index header.
    pub fn parse(buf: &[u8]) -> Result<Self, Error> {
        let raw = common::extract_der(buf)?;

        let (serial_number, modulus_hex, issuer, san_attributes) = {
            let (_, cert) =
                X509Certificate::from_der(&raw).map_err(|e| Error::Der(e.to_string()))?;

            // EK certificates sometimes carry RSAES-OAEP key identifiers;
            // those are just not indexable by modulus.
            let modulus_hex = match cert.public_key().parsed() {
                Ok(PublicKey::RSA(rsa)) => makecred::public_key_from_modulus(rsa.modulus)
                    .and_then(|k| makecred::modulus_hex(&k))
                    .ok(),
                _ => None,
            };

            let san_attributes = match cert
                .subject_alternative_name()
                .map_err(|e| Error::Der(e.to_string()))?
            {
                Some(san) => common::directory_attributes(&san.value.general_names),
                None => vec![],
            };

            (
                common::unsigned_hex(cert.raw_serial()),
                modulus_hex,
                common::name_attributes(cert.issuer()),
                san_attributes,
            )
        };

        Ok(Self {
            hash: common::content_hash(&raw),
            serial_number,
            modulus_hex,
            issuer,
            san_attributes,
            raw,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// SHA-256 of the DER encoding, used for de-duplication
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Certificate serial number (lowercase hex).  Platform credentials
    /// reference their EK certificate through it.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn modulus_hex(&self) -> Option<&str> {
        self.modulus_hex.as_deref()
    }

    pub fn issuer(&self) -> &[NameAttribute] {
        &self.issuer
    }

    pub fn san_attributes(&self) -> &[NameAttribute] {
        &self.san_attributes
    }

    pub fn tpm_manufacturer(&self) -> Option<&str> {
        common::attribute(&self.san_attributes, common::OID_TPM_MANUFACTURER)
    }

    pub fn tpm_model(&self) -> Option<&str> {
        common::attribute(&self.san_attributes, common::OID_TPM_MODEL)
    }

    pub fn to_x509(&self) -> Result<X509, Error> {
        Ok(X509::from_der(&self.raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn parse_ek_certificate() {
        let ca = testutil::ca("Test EK CA");
        let ek = testutil::rsa2048();
        let cert = testutil::ek_certificate(&ca, &ek, 0x1234);

        let ec = EndorsementCredential::parse(&cert.to_der().unwrap()).unwrap();

        assert_eq!(ec.serial_number(), "1234");
        assert_eq!(ec.tpm_manufacturer(), Some(testutil::TPM_MANUFACTURER));
        assert_eq!(ec.tpm_model(), Some(testutil::TPM_MODEL));
        assert_eq!(
            common::attribute(ec.issuer(), "2.5.4.3"),
            Some("Test EK CA")
        );
        assert_eq!(
            ec.modulus_hex().unwrap(),
            makecred::modulus_hex(&ek).unwrap()
        );
        assert_eq!(ec.hash(), common::content_hash(ec.raw()));
    }

    #[test]
    fn parse_ek_certificate_with_nv_header() {
        let ca = testutil::ca("Test EK CA");
        let ek = testutil::rsa2048();
        let der = testutil::ek_certificate(&ca, &ek, 7).to_der().unwrap();

        let mut nv = vec![0x10, 0x01, 0x00, 0x00, 0x04];
        nv.extend_from_slice(&der);

        let ec = EndorsementCredential::parse(&nv).unwrap();

        assert_eq!(ec.raw(), &der[..]);
        assert_eq!(ec.serial_number(), "7");
    }

    #[test]
    fn parse_pem() {
        let ca = testutil::ca("Test EK CA");
        let ek = testutil::rsa2048();
        let cert = testutil::ek_certificate(&ca, &ek, 99);

        let ec = EndorsementCredential::parse(&cert.to_pem().unwrap()).unwrap();

        assert_eq!(ec.raw(), &cert.to_der().unwrap()[..]);
    }

    #[test]
    fn parse_garbage() {
        assert!(EndorsementCredential::parse(b"not a certificate").is_err());
    }
}
