// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::kdfa::{hmac_sha256, kdfa};
use super::pubarea::{fixed_modulus, RSA_MODULUS_LEN};
use openssl::encrypt::{Decrypter, Encrypter};
use openssl::hash::MessageDigest;
use openssl::pkey::{HasPrivate, HasPublic, PKeyRef};
use openssl::rsa::Padding;
use openssl::symm::{self, Cipher};

/// TPM_ALG_SHA256 prefix of a TPM object name
pub const AK_NAME_PREFIX: [u8; 2] = [0x00, 0x0b];

/// Serialized TPMT_PUBLIC header of an RSA-2048 restricted signing key, as
/// hashed in front of the modulus when computing the AK name
pub const AK_NAME_HASH_PREFIX: [u8; 24] = [
    0x00, 0x01, 0x00, 0x0b, 0x00, 0x05, 0x00, 0x72, 0x00, 0x00, 0x00, 0x10, 0x00, 0x14, 0x00, 0x0b,
    0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
];

pub const NONCE_LENGTH: usize = 20;
pub const SEED_LENGTH: usize = 32;
pub const MAX_SECRET_LENGTH: usize = 32;
pub const CREDENTIAL_BLOB_LEN: usize = 392;

const AES_KEY_LENGTH: usize = 16;
const HMAC_KEY_LENGTH: usize = 32;
const INTEGRITY_LENGTH: usize = 32;
const EK_BITS: u32 = 2048;

const OAEP_LABEL: &[u8] = b"IDENTITY\0";
const STORAGE_LABEL: &str = "STORAGE";
const INTEGRITY_LABEL: &str = "INTEGRITY";

const INTEGRITY_SIZE_MARKER: [u8; 2] = [0x00, 0x20];
const SEED_SIZE_MARKER: [u8; 2] = [0x00, 0x01];

const INTEGRITY_OFFSET: usize = 4;
const SECRET_OFFSET: usize = 36;
const SECRET_REGION_LEN: usize = 98;
const SEED_MARKER_OFFSET: usize = 134;
const SEED_OFFSET: usize = 136;

/// The make-credential output handed back to the client.  Only the holder
/// of the EK private key can recover the seed, and therefore the secret.
///
/// Layout:
///
/// | offset  | content                                        |
/// |---------|------------------------------------------------|
/// | 0..2    | little-endian size of integrity + encSecret + 2 |
/// | 2..4    | `00 20`                                        |
/// | 4..36   | integrity HMAC                                 |
/// | 36..134 | encSecret, zero padded                         |
/// | 134..136| `00 01`                                        |
/// | 136..392| encrypted seed                                 |
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBlob([u8; CREDENTIAL_BLOB_LEN]);

impl CredentialBlob {
    fn assemble(integrity: &[u8], enc_secret: &[u8], enc_seed: &[u8]) -> Result<Self, Error> {
        if integrity.len() != INTEGRITY_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "integrity is {} bytes long, expecting {INTEGRITY_LENGTH}",
                integrity.len()
            )));
        }
        if enc_secret.len() > SECRET_REGION_LEN {
            return Err(Error::InvalidArgument(format!(
                "encrypted secret is {} bytes long, at most {SECRET_REGION_LEN} allowed",
                enc_secret.len()
            )));
        }
        if enc_seed.len() != CREDENTIAL_BLOB_LEN - SEED_OFFSET {
            return Err(Error::InvalidArgument(format!(
                "encrypted seed is {} bytes long, expecting {}",
                enc_seed.len(),
                CREDENTIAL_BLOB_LEN - SEED_OFFSET
            )));
        }

        let top_size = (2 + INTEGRITY_LENGTH + enc_secret.len()) as u16;

        let mut b = [0u8; CREDENTIAL_BLOB_LEN];

        b[0..2].copy_from_slice(&top_size.to_le_bytes());
        b[2..INTEGRITY_OFFSET].copy_from_slice(&INTEGRITY_SIZE_MARKER);
        b[INTEGRITY_OFFSET..SECRET_OFFSET].copy_from_slice(integrity);
        b[SECRET_OFFSET..SEED_MARKER_OFFSET].fill(0);
        b[SECRET_OFFSET..SECRET_OFFSET + enc_secret.len()].copy_from_slice(enc_secret);
        b[SEED_MARKER_OFFSET..SEED_OFFSET].copy_from_slice(&SEED_SIZE_MARKER);
        b[SEED_OFFSET..].copy_from_slice(enc_seed);

        Ok(Self(b))
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        let b: [u8; CREDENTIAL_BLOB_LEN] = buf.try_into().map_err(|_| {
            Error::InvalidArgument(format!(
                "credential blob is {} bytes long, expecting {CREDENTIAL_BLOB_LEN}",
                buf.len()
            ))
        })?;

        let blob = Self(b);

        let secret_len = blob.top_size() as usize;
        if !(2 + INTEGRITY_LENGTH..=2 + INTEGRITY_LENGTH + SECRET_REGION_LEN).contains(&secret_len)
        {
            return Err(Error::InvalidArgument(format!(
                "credential blob declares an invalid size {secret_len}"
            )));
        }

        Ok(blob)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn top_size(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    pub fn integrity(&self) -> &[u8] {
        &self.0[INTEGRITY_OFFSET..SECRET_OFFSET]
    }

    pub fn encrypted_secret(&self) -> &[u8] {
        let n = (self.top_size() as usize).saturating_sub(2 + INTEGRITY_LENGTH);
        &self.0[SECRET_OFFSET..SECRET_OFFSET + n.min(SECRET_REGION_LEN)]
    }

    pub fn encrypted_seed(&self) -> &[u8] {
        &self.0[SEED_OFFSET..]
    }
}

impl std::fmt::Debug for CredentialBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialBlob({})", hex::encode(self.0))
    }
}

/// TPM name of an RSA-2048 AK given its 256-byte modulus
pub fn ak_name(modulus: &[u8]) -> Vec<u8> {
    let mut hashed = Vec::with_capacity(AK_NAME_HASH_PREFIX.len() + modulus.len());
    hashed.extend_from_slice(&AK_NAME_HASH_PREFIX);
    hashed.extend_from_slice(modulus);

    let mut name = AK_NAME_PREFIX.to_vec();
    name.extend_from_slice(&openssl::sha::sha256(&hashed));

    name
}

/// TPM name of the supplied AK public key
pub fn compute_ak_name<T: HasPublic>(ak: &PKeyRef<T>) -> Result<Vec<u8>, Error> {
    Ok(ak_name(&fixed_modulus(ak)?))
}

/// Fresh random challenge nonce
pub fn generate_nonce() -> Result<Vec<u8>, Error> {
    random_bytes(NONCE_LENGTH)
}

fn random_bytes(n: usize) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; n];
    openssl::rand::rand_bytes(&mut buf)?;
    Ok(buf)
}

/// Bind `secret` to `ak`, so that only the TPM holding the private half of
/// `ek` (and the AK) can recover it via TPM2_ActivateCredential.
pub fn make_credential<E, A>(
    ek: &PKeyRef<E>,
    ak: &PKeyRef<A>,
    secret: &[u8],
) -> Result<CredentialBlob, Error>
where
    E: HasPublic,
    A: HasPublic,
{
    let seed = random_bytes(SEED_LENGTH)?;

    make_credential_with_seed(ek, ak, secret, &seed)
}

/// As [`make_credential`], with a caller-supplied seed
pub fn make_credential_with_seed<E, A>(
    ek: &PKeyRef<E>,
    ak: &PKeyRef<A>,
    secret: &[u8],
    seed: &[u8],
) -> Result<CredentialBlob, Error>
where
    E: HasPublic,
    A: HasPublic,
{
    if secret.len() > MAX_SECRET_LENGTH {
        return Err(Error::InvalidArgument(format!(
            "secret is {} bytes long, at most {MAX_SECRET_LENGTH} allowed",
            secret.len()
        )));
    }

    if seed.len() != SEED_LENGTH {
        return Err(Error::InvalidArgument(format!(
            "seed is {} bytes long, expecting {SEED_LENGTH}",
            seed.len()
        )));
    }

    if ek.bits() != EK_BITS {
        return Err(Error::InvalidArgument(format!(
            "EK is a {}-bit key, expecting RSA-{EK_BITS}",
            ek.bits()
        )));
    }

    let enc_seed = encrypt_seed(ek, seed)?;

    let name = compute_ak_name(ak)?;

    let aes_key = kdfa(seed, STORAGE_LABEL, Some(&name), AES_KEY_LENGTH)?;
    let hmac_key = kdfa(seed, INTEGRITY_LABEL, None, HMAC_KEY_LENGTH)?;

    let mut sized_secret = Vec::with_capacity(2 + secret.len());
    sized_secret.extend_from_slice(&(secret.len() as u16).to_be_bytes());
    sized_secret.extend_from_slice(secret);

    let enc_secret = symm::encrypt(
        Cipher::aes_128_cfb128(),
        &aes_key,
        Some(&[0u8; 16]),
        &sized_secret,
    )?;

    let integrity = hmac_sha256(&hmac_key, &[&enc_secret, &name])?;

    CredentialBlob::assemble(&integrity, &enc_secret, &enc_seed)
}

/// Software counterpart of TPM2_ActivateCredential: recover the secret from
/// `blob` using the EK private key, after checking the integrity HMAC.
pub fn activate_credential<E, A>(
    ek: &PKeyRef<E>,
    ak: &PKeyRef<A>,
    blob: &CredentialBlob,
) -> Result<Vec<u8>, Error>
where
    E: HasPrivate,
    A: HasPublic,
{
    let seed = decrypt_seed(ek, blob.encrypted_seed())?;

    let name = compute_ak_name(ak)?;

    let aes_key = kdfa(&seed, STORAGE_LABEL, Some(&name), AES_KEY_LENGTH)?;
    let hmac_key = kdfa(&seed, INTEGRITY_LABEL, None, HMAC_KEY_LENGTH)?;

    let expected = hmac_sha256(&hmac_key, &[blob.encrypted_secret(), &name])?;
    if !openssl::memcmp::eq(&expected, blob.integrity()) {
        return Err(Error::Crypto("credential integrity check failed".to_string()));
    }

    let sized_secret = symm::decrypt(
        Cipher::aes_128_cfb128(),
        &aes_key,
        Some(&[0u8; 16]),
        blob.encrypted_secret(),
    )?;

    if sized_secret.len() < 2 {
        return Err(Error::Crypto("truncated credential secret".to_string()));
    }

    let n = u16::from_be_bytes([sized_secret[0], sized_secret[1]]) as usize;
    if n != sized_secret.len() - 2 {
        return Err(Error::Crypto(format!(
            "credential secret declares {n} bytes, found {}",
            sized_secret.len() - 2
        )));
    }

    Ok(sized_secret[2..].to_vec())
}

fn encrypt_seed<T: HasPublic>(ek: &PKeyRef<T>, seed: &[u8]) -> Result<Vec<u8>, Error> {
    let mut enc = Encrypter::new(ek)?;
    enc.set_rsa_padding(Padding::PKCS1_OAEP)?;
    enc.set_rsa_oaep_md(MessageDigest::sha256())?;
    enc.set_rsa_mgf1_md(MessageDigest::sha256())?;
    enc.set_rsa_oaep_label(OAEP_LABEL)?;

    let mut out = vec![0u8; enc.encrypt_len(seed)?];
    let n = enc.encrypt(seed, &mut out)?;
    out.truncate(n);

    if out.len() != RSA_MODULUS_LEN {
        return Err(Error::Crypto(format!(
            "encrypted seed is {} bytes long, expecting {RSA_MODULUS_LEN}",
            out.len()
        )));
    }

    Ok(out)
}

fn decrypt_seed<T: HasPrivate>(ek: &PKeyRef<T>, enc_seed: &[u8]) -> Result<Vec<u8>, Error> {
    let mut dec = Decrypter::new(ek)?;
    dec.set_rsa_padding(Padding::PKCS1_OAEP)?;
    dec.set_rsa_oaep_md(MessageDigest::sha256())?;
    dec.set_rsa_mgf1_md(MessageDigest::sha256())?;
    dec.set_rsa_oaep_label(OAEP_LABEL)?;

    let mut out = vec![0u8; dec.decrypt_len(enc_seed)?];
    let n = dec.decrypt(enc_seed, &mut out)?;
    out.truncate(n);

    Ok(out)
}
