// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;

/// The quote text produced by the provisioning client, in the form
/// `quote: <hash> signature: <signature>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmQuote {
    pub hash: String,
    pub signature: String,
}

impl TpmQuote {
    pub fn parse(buf: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(buf).map_err(|e| Error::Parse(e.to_string()))?;

        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() < 3 {
            return Err(Error::Parse(format!(
                "quote has {} fields, expecting at least 3",
                parts.len()
            )));
        }

        let hash = parts[1].replace("signature", "").trim().to_string();
        let signature = parts[2].trim().to_string();

        if hash.is_empty() || signature.is_empty() {
            return Err(Error::Parse("quote hash or signature is empty".to_string()));
        }

        Ok(Self { hash, signature })
    }
}
