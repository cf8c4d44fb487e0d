// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;

const SHA256_LEN: usize = 32;
const KDF_COUNTER: u32 = 1;

/// Single-block TPM 2.0 KDFa with HMAC-SHA256.
///
/// The HMAC key is `seed` and the message is
/// `counter(=1) || label || 0x00 || context || bits`, where `counter` and
/// `bits` are 32-bit big-endian integers.  A trailing NUL is appended to the
/// label only if it does not already end with one.  Since only one block is
/// computed, keys longer than a SHA-256 digest cannot be derived.
pub fn kdfa(
    seed: &[u8],
    label: &str,
    context: Option<&[u8]>,
    size: usize,
) -> Result<Vec<u8>, Error> {
    if size == 0 || size > SHA256_LEN {
        return Err(Error::InvalidArgument(format!(
            "KDFa output size must be between 1 and {SHA256_LEN} bytes, got {size}"
        )));
    }

    let mut msg = Vec::with_capacity(4 + label.len() + 1 + 4);

    msg.extend_from_slice(&KDF_COUNTER.to_be_bytes());
    msg.extend_from_slice(label.as_bytes());
    if !label.ends_with('\0') {
        msg.push(0);
    }
    if let Some(ctx) = context {
        msg.extend_from_slice(ctx);
    }
    msg.extend_from_slice(&((size * 8) as u32).to_be_bytes());

    let mut out = hmac_sha256(seed, &[&msg])?;
    out.truncate(size);

    Ok(out)
}

/// HMAC-SHA256 over the concatenation of `parts`
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, Error> {
    let pkey = PKey::hmac(key)?;
    let mut signer = Signer::new(MessageDigest::sha256(), &pkey)?;

    for p in parts {
        signer.update(p)?;
    }

    Ok(signer.sign_to_vec()?)
}
