// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::bn::BigNum;
use openssl::pkey::{HasPublic, PKey, PKeyRef, Public};
use openssl::rsa::Rsa;

/// Size of an RSA-2048 modulus, which is how the TPM public area of both EK
/// and AK ends.
pub const RSA_MODULUS_LEN: usize = 256;

const RSA_EXPONENT: u32 = 65537;

/// Extract the RSA public key from a TPM 2.0 public area.  The key is
/// rebuilt from the trailing 256-byte modulus (the `unique` field of the
/// TPMT_PUBLIC) and the default exponent.
pub fn parse_public_area(area: &[u8]) -> Result<PKey<Public>, Error> {
    if area.len() < RSA_MODULUS_LEN {
        return Err(Error::InvalidArgument(format!(
            "public area is {} bytes long, expecting at least {RSA_MODULUS_LEN}",
            area.len()
        )));
    }

    public_key_from_modulus(&area[area.len() - RSA_MODULUS_LEN..])
}

/// Assemble an RSA public key from a raw big-endian modulus
pub fn public_key_from_modulus(modulus: &[u8]) -> Result<PKey<Public>, Error> {
    let n = BigNum::from_slice(modulus)?;
    let e = BigNum::from_u32(RSA_EXPONENT)?;

    let rsa = Rsa::from_public_components(n, e)?;

    Ok(PKey::from_rsa(rsa)?)
}

/// Return the modulus of `key` as exactly [`RSA_MODULUS_LEN`] bytes,
/// left-padded with zeroes when the leading byte of the modulus is zero.
pub fn fixed_modulus<T: HasPublic>(key: &PKeyRef<T>) -> Result<Vec<u8>, Error> {
    let rsa = key.rsa()?;
    let n = rsa.n();

    if n.num_bytes() as usize > RSA_MODULUS_LEN {
        return Err(Error::InvalidArgument(format!(
            "RSA modulus is {} bytes long, expecting at most {RSA_MODULUS_LEN}",
            n.num_bytes()
        )));
    }

    Ok(n.to_vec_padded(RSA_MODULUS_LEN as i32)?)
}

/// Lowercase hex rendering of the modulus without leading zeroes.  This is
/// the key used to look up previously uploaded endorsement credentials.
pub fn modulus_hex<T: HasPublic>(key: &PKeyRef<T>) -> Result<String, Error> {
    Ok(hex::encode(key.rsa()?.n().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_short_area_is_rejected() {
        let r = parse_public_area(&[0u8; 255]);

        assert!(matches!(r, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn parse_area_uses_trailing_modulus() {
        let key = Rsa::generate(2048).unwrap();
        let modulus = key.n().to_vec_padded(256).unwrap();

        let mut area = vec![0x01, 0x16, 0x00, 0x01, 0x00, 0x0b];
        area.extend_from_slice(&modulus);

        let pkey = parse_public_area(&area).unwrap();

        assert_eq!(pkey.bits(), 2048);
        assert_eq!(fixed_modulus(&pkey).unwrap(), modulus);
        assert_eq!(pkey.rsa().unwrap().e().to_vec(), vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn fixed_modulus_pads_short_values() {
        let pkey = public_key_from_modulus(&[0x7f; 255]).unwrap();

        let m = fixed_modulus(&pkey).unwrap();

        assert_eq!(m.len(), RSA_MODULUS_LEN);
        assert_eq!(m[0], 0x00);
        assert_eq!(&m[1..], &[0x7f; 255][..]);
    }

    #[test]
    fn modulus_hex_has_no_leading_zeroes() {
        let mut modulus = vec![0x00];
        modulus.extend_from_slice(&[0xc3; 255]);

        let pkey = public_key_from_modulus(&modulus).unwrap();

        let h = modulus_hex(&pkey).unwrap();
        assert_eq!(h.len(), 510);
        assert!(h.starts_with("c3c3"));
    }
}
