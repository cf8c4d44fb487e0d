// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::common::{self, NameAttribute};
use super::errors::Error;
use asn1_rs::{Any, Class, FromDer, Oid, Tag};
use x509_parser::extensions::X509Extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCredentialType {
    /// Describes the platform as shipped
    Base,
    /// Records a change to the platform described by a base credential
    Delta,
}

/// A TCG platform attribute certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCredential {
    raw: Vec<u8>,
    hash: String,
    serial_number: String,
    holder_serial_number: String,
    credential_type: PlatformCredentialType,
    san_attributes: Vec<NameAttribute>,
}

impl PlatformCredential {
    pub fn parse(buf: &[u8]) -> Result<Self, Error> {
        let raw = common::extract_der(buf)?;

        let (serial_number, holder_serial_number, credential_type, san_attributes) = {
            let mut r: &[u8] = &raw;
            let mut ac = take(&mut r, Class::Universal, Tag::Sequence, "certificate")?.data;

            let mut info = take(&mut ac, Class::Universal, Tag::Sequence, "acinfo")?.data;

            take(&mut info, Class::Universal, Tag::Integer, "version")?;

            let mut holder = take(&mut info, Class::Universal, Tag::Sequence, "holder")?.data;
            let mut base_cert_id =
                take(&mut holder, Class::ContextSpecific, Tag(0), "baseCertificateID")?.data;
            take(&mut base_cert_id, Class::Universal, Tag::Sequence, "holder issuer")?;
            let holder_serial =
                take(&mut base_cert_id, Class::Universal, Tag::Integer, "holder serial")?;

            // AttCertIssuer: v2Form [0] or GeneralNames
            next(&mut info, "issuer")?;
            take(&mut info, Class::Universal, Tag::Sequence, "signature")?;
            let serial = take(&mut info, Class::Universal, Tag::Integer, "serialNumber")?;
            take(&mut info, Class::Universal, Tag::Sequence, "validity")?;

            let attributes = take(&mut info, Class::Universal, Tag::Sequence, "attributes")?;
            let credential_type = credential_type(attributes.data)?;

            // optional issuerUniqueID, then optional extensions
            let mut san_attributes = vec![];
            while !info.is_empty() {
                let any = next(&mut info, "acinfo")?;
                if any.header.tag() == Tag::Sequence {
                    san_attributes = extension_san_attributes(any.data)?;
                }
            }

            (
                common::unsigned_hex(serial.data),
                common::unsigned_hex(holder_serial.data),
                credential_type,
                san_attributes,
            )
        };

        Ok(Self {
            hash: common::content_hash(&raw),
            serial_number,
            holder_serial_number,
            credential_type,
            san_attributes,
            raw,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Serial number of the EK certificate this credential is bound to
    pub fn holder_serial_number(&self) -> &str {
        &self.holder_serial_number
    }

    pub fn credential_type(&self) -> PlatformCredentialType {
        self.credential_type
    }

    pub fn is_base(&self) -> bool {
        self.credential_type == PlatformCredentialType::Base
    }

    /// Board serial number (TCG platformSerial); shared by a base credential
    /// and all of its deltas
    pub fn platform_serial(&self) -> Option<&str> {
        common::attribute(&self.san_attributes, common::OID_PLATFORM_SERIAL)
    }

    pub fn san_attributes(&self) -> &[NameAttribute] {
        &self.san_attributes
    }
}

fn next<'a>(input: &mut &'a [u8], what: &str) -> Result<Any<'a>, Error> {
    let (rem, any) = Any::from_der(input).map_err(|e| Error::Der(format!("{what}: {e}")))?;
    *input = rem;

    Ok(any)
}

/// Next element of `input`, which must be `class`/`tag`
fn take<'a>(input: &mut &'a [u8], class: Class, tag: Tag, what: &str) -> Result<Any<'a>, Error> {
    let any = next(input, what)?;

    if any.header.class() != class || any.header.tag() != tag {
        return Err(Error::Syntax(format!(
            "{what}: unexpected {:?} {:?}",
            any.header.class(),
            any.header.tag()
        )));
    }

    Ok(any)
}

fn oid(any: Any<'_>, what: &str) -> Result<String, Error> {
    let oid = Oid::try_from(any).map_err(|e| Error::Der(format!("{what}: {e}")))?;

    Ok(oid.to_id_string())
}

fn credential_type(mut attributes: &[u8]) -> Result<PlatformCredentialType, Error> {
    while !attributes.is_empty() {
        let mut attr = take(&mut attributes, Class::Universal, Tag::Sequence, "attribute")?.data;

        let id = oid(next(&mut attr, "attribute type")?, "attribute type")?;
        if id != common::OID_CREDENTIAL_TYPE {
            continue;
        }

        let mut values = take(&mut attr, Class::Universal, Tag::Set, "attribute values")?.data;
        let mut ct = take(&mut values, Class::Universal, Tag::Sequence, "tcgCredentialType")?.data;

        return match oid(next(&mut ct, "credential type")?, "credential type")?.as_str() {
            common::OID_PLATFORM_CERTIFICATE => Ok(PlatformCredentialType::Base),
            common::OID_DELTA_CERTIFICATE => Ok(PlatformCredentialType::Delta),
            other => Err(Error::Syntax(format!("unknown credential type {other}"))),
        };
    }

    Ok(PlatformCredentialType::Base)
}

fn extension_san_attributes(mut extensions: &[u8]) -> Result<Vec<NameAttribute>, Error> {
    while !extensions.is_empty() {
        let (rem, ext) =
            X509Extension::from_der(extensions).map_err(|e| Error::Der(e.to_string()))?;
        extensions = rem;

        if ext.oid.to_id_string() == common::OID_SUBJECT_ALT_NAME {
            return common::san_directory_attributes(&ext);
        }
    }

    Ok(vec![])
}
