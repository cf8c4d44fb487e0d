// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use asn1_rs::{Any, Class, FromDer, Header, Length, Tag, ToDer};
use serde::{Deserialize, Serialize};
use x509_parser::extensions::{GeneralName, ParsedExtension, X509Extension};
use x509_parser::pem::parse_x509_pem;
use x509_parser::x509::X509Name;

pub const OID_SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const OID_TPM_MANUFACTURER: &str = "2.23.133.2.1";
pub const OID_TPM_MODEL: &str = "2.23.133.2.2";
pub const OID_TPM_VERSION: &str = "2.23.133.2.3";
pub const OID_TPM_ID_LABEL: &str = "2.23.133.2.15";
pub const OID_PLATFORM_MANUFACTURER: &str = "2.23.133.2.4";
pub const OID_PLATFORM_MODEL: &str = "2.23.133.2.5";
pub const OID_PLATFORM_VERSION: &str = "2.23.133.2.6";
pub const OID_PLATFORM_SERIAL: &str = "2.23.133.5.1.6";
pub const OID_CREDENTIAL_TYPE: &str = "2.23.133.2.25";
pub const OID_PLATFORM_CERTIFICATE: &str = "2.23.133.8.2";
pub const OID_DELTA_CERTIFICATE: &str = "2.23.133.8.5";

/// One `AttributeTypeAndValue` taken from a directoryName
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAttribute {
    pub oid: String,
    pub value: String,
}

/// Lowercase hex SHA-256 of the raw credential bytes
pub fn content_hash(raw: &[u8]) -> String {
    hex::encode(openssl::sha::sha256(raw))
}

/// Lowercase hex of an unsigned big-endian integer, without leading zeros
pub fn unsigned_hex(bytes: &[u8]) -> String {
    let h = hex::encode(bytes);

    match h.trim_start_matches('0') {
        "" => "0".to_string(),
        digits => digits.to_string(),
    }
}

/// Locate the DER structure in `buf`.  Credentials read from TPM NV indices
/// may carry a vendor header in front of the certificate (and padding after
/// it), and uploaded ones may be PEM encoded.
pub fn extract_der(buf: &[u8]) -> Result<Vec<u8>, Error> {
    if buf.starts_with(b"-----BEGIN") {
        let (_, pem) =
            parse_x509_pem(buf).map_err(|e| Error::Syntax(format!("bad PEM: {e}")))?;
        return Ok(pem.contents);
    }

    if let Some(der) = leading_sequence(buf) {
        return Ok(der.to_vec());
    }

    let start = buf
        .windows(2)
        .position(|w| w == [0x30, 0x82])
        .ok_or_else(|| Error::Syntax("no DER structure found".to_string()))?;

    leading_sequence(&buf[start..])
        .map(<[u8]>::to_vec)
        .ok_or_else(|| Error::Der("truncated DER structure".to_string()))
}

/// The SEQUENCE at the start of `buf`, without whatever follows it
fn leading_sequence(buf: &[u8]) -> Option<&[u8]> {
    let (rem, any) = Any::from_der(buf).ok()?;

    if any.header.class() != Class::Universal
        || any.header.tag() != Tag::Sequence
        || !any.header.is_constructed()
    {
        return None;
    }

    Some(&buf[..buf.len() - rem.len()])
}

/// Collect the attributes of every directoryName in a SubjectAltName
/// extension.  Other GeneralName choices are skipped.
pub fn san_directory_attributes(ext: &X509Extension<'_>) -> Result<Vec<NameAttribute>, Error> {
    match ext.parsed_extension() {
        ParsedExtension::SubjectAlternativeName(san) => {
            Ok(directory_attributes(&san.general_names))
        }
        _ => Err(Error::Der("malformed subjectAltName".to_string())),
    }
}

pub(crate) fn directory_attributes(names: &[GeneralName<'_>]) -> Vec<NameAttribute> {
    names
        .iter()
        .filter_map(|gn| match gn {
            GeneralName::DirectoryName(name) => Some(name_attributes(name)),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Flatten an X.501 `Name` into its string valued attributes, in order
pub fn name_attributes(name: &X509Name<'_>) -> Vec<NameAttribute> {
    name.iter_attributes()
        .filter_map(|atv| {
            Some(NameAttribute {
                oid: atv.attr_type().to_id_string(),
                value: atv.as_str().ok()?.to_string(),
            })
        })
        .collect()
}

/// `GeneralNames` value holding one directoryName, `name` being a DER
/// encoded X.501 `Name`
pub fn directory_name_san(name: &[u8]) -> Result<Vec<u8>, Error> {
    let dir_name = constructed(Class::ContextSpecific, Tag(4), name)?;

    constructed(Class::Universal, Tag::Sequence, &dir_name)
}

fn constructed(class: Class, tag: Tag, content: &[u8]) -> Result<Vec<u8>, Error> {
    let header = Header::new(class, true, tag, Length::Definite(content.len()));

    Any::new(header, content)
        .to_der_vec()
        .map_err(|e| Error::Der(e.to_string()))
}

pub fn attribute<'a>(attrs: &'a [NameAttribute], oid: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.oid == oid)
        .map(|a| a.value.as_str())
}
