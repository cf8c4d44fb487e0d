// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures: keys, a throwaway CA, EK certificates, platform
//! attribute certificates, identity claims and a wired up ACA.

use crate::config::{AcaIdentity, PolicySettings, SigningDigest};
use crate::credential::{
    self, OID_CREDENTIAL_TYPE, OID_DELTA_CERTIFICATE, OID_PLATFORM_CERTIFICATE,
    OID_PLATFORM_MANUFACTURER, OID_PLATFORM_MODEL, OID_PLATFORM_SERIAL, OID_SUBJECT_ALT_NAME,
    OID_TPM_MANUFACTURER, OID_TPM_MODEL, OID_TPM_VERSION,
};
use crate::makecred;
use crate::message::{Bytes, IdentityClaim};
use crate::provision::{
    CertificateIssuer, CertificateRequestProcessor, CredentialResolver, IdentityClaimProcessor,
};
use crate::store::{
    MemoCertificateStore, MemoChallengeStore, MemoDeviceStore, MemoPolicyStore,
    MemoTrustAnchorStore,
};
use crate::validation::{ISupplyChainValidator, TrustAnchorValidator};
use asn1_rs::{Any, Class, Header, Length, Oid, Tag, ToDer};
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{HasPublic, PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, KeyUsage, SubjectKeyIdentifier};
use openssl::x509::{X509Builder, X509Extension, X509NameBuilder, X509};
use std::sync::Arc;

pub const TPM_MANUFACTURER: &str = "id:53544D20";
pub const TPM_MODEL: &str = "ST33HTPHAHD4";
pub const TPM_VERSION: &str = "id:00010102";
pub const PLATFORM_MANUFACTURER: &str = "Example Corp";
pub const PLATFORM_MODEL: &str = "Example Server";
pub const HOSTNAME: &str = "node-1.example";

pub struct TestCa {
    pub key: PKey<Private>,
    pub cert: X509,
}

pub fn rsa2048() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn validity(b: &mut X509Builder) {
    let now = crate::unix_time();
    b.set_not_before(&Asn1Time::from_unix(now - 3600).unwrap())
        .unwrap();
    b.set_not_after(&Asn1Time::from_unix(now + 365 * 86_400).unwrap())
        .unwrap();
}

/// A self-signed CA with a subject key identifier
pub fn ca(cn: &str) -> TestCa {
    let key = rsa2048();

    let mut nb = X509NameBuilder::new().unwrap();
    nb.append_entry_by_text("CN", cn).unwrap();
    let name = nb.build();

    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();
    b.set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    b.set_subject_name(&name).unwrap();
    b.set_issuer_name(&name).unwrap();
    b.set_pubkey(&key).unwrap();
    validity(&mut b);

    b.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    b.append_extension(
        KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()
            .unwrap(),
    )
    .unwrap();
    let ski = SubjectKeyIdentifier::new()
        .build(&b.x509v3_context(None, None))
        .unwrap();
    b.append_extension(ski).unwrap();

    b.sign(&key, MessageDigest::sha256()).unwrap();

    TestCa {
        key,
        cert: b.build(),
    }
}

/// An EK certificate with an empty subject and the TPM identity in a
/// critical SAN directoryName
pub fn ek_certificate<T: HasPublic>(ca: &TestCa, ek: &PKeyRef<T>, serial: u32) -> X509 {
    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();
    b.set_serial_number(
        &BigNum::from_u32(serial)
            .unwrap()
            .to_asn1_integer()
            .unwrap(),
    )
    .unwrap();
    b.set_issuer_name(ca.cert.subject_name()).unwrap();
    b.set_subject_name(&X509NameBuilder::new().unwrap().build())
        .unwrap();
    b.set_pubkey(ek).unwrap();
    validity(&mut b);

    let mut tpm = X509NameBuilder::new().unwrap();
    tpm.append_entry_by_text(OID_TPM_MANUFACTURER, TPM_MANUFACTURER)
        .unwrap();
    tpm.append_entry_by_text(OID_TPM_MODEL, TPM_MODEL).unwrap();
    tpm.append_entry_by_text(OID_TPM_VERSION, TPM_VERSION).unwrap();
    let tpm = tpm.build().to_der().unwrap();

    let san = credential::directory_name_san(&tpm).unwrap();
    let ext = X509Extension::new_from_der(
        &Asn1Object::from_str(OID_SUBJECT_ALT_NAME).unwrap(),
        true,
        &Asn1OctetString::new_from_bytes(&san).unwrap(),
    )
    .unwrap();
    b.append_extension(ext).unwrap();

    b.sign(&ca.key, MessageDigest::sha256()).unwrap();

    b.build()
}

/// A single DER TLV
pub fn der_tlv(class: Class, tag: u32, constructed: bool, content: &[u8]) -> Vec<u8> {
    let header = Header::new(class, constructed, Tag(tag), Length::Definite(content.len()));
    Any::new(header, content).to_der_vec().unwrap()
}

pub fn der_seq(parts: &[&[u8]]) -> Vec<u8> {
    der_tlv(Class::Universal, Tag::Sequence.0, true, &parts.concat())
}

fn der_set(parts: &[&[u8]]) -> Vec<u8> {
    der_tlv(Class::Universal, Tag::Set.0, true, &parts.concat())
}

pub fn der_oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted.split('.').map(|a| a.parse().unwrap()).collect();
    let oid = Oid::from(&arcs).unwrap();
    der_tlv(Class::Universal, Tag::Oid.0, false, oid.as_bytes())
}

fn der_integer(hex_value: &str) -> Vec<u8> {
    let mut h = hex_value.to_string();
    if h.len() % 2 == 1 {
        h.insert(0, '0');
    }
    let mut v = hex::decode(h).unwrap();
    if v[0] & 0x80 != 0 {
        v.insert(0, 0);
    }
    der_tlv(Class::Universal, Tag::Integer.0, false, &v)
}

fn der_time(t: &str) -> Vec<u8> {
    der_tlv(Class::Universal, Tag::GeneralizedTime.0, false, t.as_bytes())
}

/// A relative distinguished name holding one UTF8String attribute
pub fn rdn(oid: &str, value: &str) -> Vec<u8> {
    let value = der_tlv(Class::Universal, Tag::Utf8String.0, false, value.as_bytes());
    der_set(&[&der_seq(&[&der_oid(oid), &value])])
}

/// A (structurally valid, unsigned) TCG platform attribute certificate bound
/// to the EK certificate with serial `holder_serial`
pub fn platform_credential(holder_serial: &str, serial: u32, board: &str, delta: bool) -> Vec<u8> {
    let issuer_name = der_seq(&[&rdn("2.5.4.3", "Platform CA")]);
    let general_names = der_seq(&[&der_tlv(Class::ContextSpecific, 4, true, &issuer_name)]);

    let holder = der_seq(&[&der_tlv(
        Class::ContextSpecific,
        0,
        true,
        &[general_names.as_slice(), &der_integer(holder_serial)].concat(),
    )]);
    let issuer = der_tlv(Class::ContextSpecific, 0, true, &general_names);

    let null = der_tlv(Class::Universal, Tag::Null.0, false, &[]);
    let sig_alg = der_seq(&[&der_oid("1.2.840.113549.1.1.11"), &null]);

    let validity = der_seq(&[
        &der_time("20250101000000Z"),
        &der_time("20350101000000Z"),
    ]);

    let kind = if delta {
        OID_DELTA_CERTIFICATE
    } else {
        OID_PLATFORM_CERTIFICATE
    };
    let credential_type = der_seq(&[
        &der_oid(OID_CREDENTIAL_TYPE),
        &der_set(&[&der_seq(&[&der_oid(kind)])]),
    ]);
    let attributes = der_seq(&[&credential_type]);

    let platform = der_seq(&[
        &rdn(OID_PLATFORM_MANUFACTURER, PLATFORM_MANUFACTURER),
        &rdn(OID_PLATFORM_MODEL, PLATFORM_MODEL),
        &rdn(OID_PLATFORM_SERIAL, board),
    ]);
    let san = credential::directory_name_san(&platform).unwrap();
    let ext = der_seq(&[
        &der_oid(OID_SUBJECT_ALT_NAME),
        &der_tlv(Class::Universal, Tag::OctetString.0, false, &san),
    ]);
    let extensions = der_seq(&[&ext]);

    let info = der_seq(&[
        &der_integer("1"),
        &holder,
        &issuer,
        &sig_alg,
        &der_integer(&format!("{serial:x}")),
        &validity,
        &attributes,
        &extensions,
    ]);

    let signature = der_tlv(Class::Universal, Tag::BitString.0, false, &[0u8; 17]);

    der_seq(&[&info, &sig_alg, &signature])
}

/// TPM public area for an RSA-2048 key
pub fn public_area<T: HasPublic>(key: &PKeyRef<T>) -> Vec<u8> {
    let mut area = makecred::AK_NAME_HASH_PREFIX.to_vec();
    area.extend(makecred::fixed_modulus(key).unwrap());
    area
}

pub fn identity_claim<E: HasPublic, A: HasPublic>(
    ek: &PKeyRef<E>,
    ak: &PKeyRef<A>,
    ec: Option<&X509>,
) -> IdentityClaim {
    let mut claim = IdentityClaim {
        ek_public_area: Bytes::from(public_area(ek)),
        ak_public_area: Bytes::from(public_area(ak)),
        endorsement_credential: ec.map(|c| Bytes::from(c.to_der().unwrap())),
        client_version: "3.0.0".to_string(),
        ..Default::default()
    };
    claim.device_info.network.hostname = HOSTNAME.to_string();

    claim
}

/// A fully wired ACA backed by in-memory stores
pub struct Harness {
    pub aca: TestCa,
    pub ek_ca: TestCa,
    pub certs: Arc<MemoCertificateStore>,
    pub challenges: Arc<MemoChallengeStore>,
    pub devices: Arc<MemoDeviceStore>,
    pub claims: IdentityClaimProcessor,
    pub requests: CertificateRequestProcessor,
}

/// Wire up an ACA; with `trust_ek_ca` the EK certificate CA is a trust anchor
pub fn harness(trust_ek_ca: bool, policy: PolicySettings) -> Harness {
    harness_with(trust_ek_ca, policy, |v| v)
}

/// [`harness`] with the supply chain validator replaced by `wrap(validator)`
pub fn harness_with<F>(trust_ek_ca: bool, policy: PolicySettings, wrap: F) -> Harness
where
    F: FnOnce(Arc<dyn ISupplyChainValidator>) -> Arc<dyn ISupplyChainValidator>,
{
    let aca = ca("Test ACA");
    let ek_ca = ca("Test EK CA");

    let certs = Arc::new(MemoCertificateStore::new());
    let challenges = Arc::new(MemoChallengeStore::new());
    let devices = Arc::new(MemoDeviceStore::new());
    let policy = Arc::new(MemoPolicyStore::new(policy));

    let anchors = Arc::new(MemoTrustAnchorStore::new());
    if trust_ek_ca {
        anchors.add(ek_ca.cert.clone()).unwrap();
    }
    let validator: Arc<dyn ISupplyChainValidator> =
        Arc::new(TrustAnchorValidator::new(anchors, policy.clone()));
    let validator = wrap(validator);

    let identity = AcaIdentity::from_pem(
        &aca.key.private_key_to_pem_pkcs8().unwrap(),
        &aca.cert.to_pem().unwrap(),
    )
    .unwrap();
    let issuer = Arc::new(CertificateIssuer::new(
        Arc::new(identity),
        365,
        SigningDigest::Sha256,
        certs.clone(),
    ));

    let resolver = CredentialResolver::new(certs.clone());

    let claims = IdentityClaimProcessor::new(
        resolver.clone(),
        validator.clone(),
        challenges.clone(),
        devices.clone(),
        policy.clone(),
    );
    let requests = CertificateRequestProcessor::new(
        resolver,
        validator,
        challenges.clone(),
        devices.clone(),
        policy,
        issuer,
    );

    Harness {
        aca,
        ek_ca,
        certs,
        challenges,
        devices,
        claims,
        requests,
    }
}
