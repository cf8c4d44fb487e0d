// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{de::DeserializeOwned, Serialize};

/// Largest accepted encoded message.  Identity claims carry measurement logs
/// and credentials, so this is generous.
pub const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

/// Wire encoding shared by all protocol messages: CBOR on the wire, JSON for
/// the message log.
pub trait Codec: Serialize + DeserializeOwned {
    fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.is_empty() {
            return Err(Error::Decode("empty message".to_string()));
        }

        if buf.len() > MAX_MESSAGE_LEN {
            return Err(Error::Decode(format!(
                "message is {} bytes long, at most {MAX_MESSAGE_LEN} allowed",
                buf.len()
            )));
        }

        ciborium::de::from_reader(buf).map_err(|e| Error::Decode(e.to_string()))
    }

    fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();

        ciborium::ser::into_writer(self, &mut buf).map_err(|e| Error::Encode(e.to_string()))?;

        Ok(buf)
    }

    fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CertificateRequest;

    #[test]
    fn empty_and_oversized() {
        assert!(CertificateRequest::decode(&[]).is_err());
        assert!(CertificateRequest::decode(&vec![0u8; MAX_MESSAGE_LEN + 1]).is_err());
    }
}
