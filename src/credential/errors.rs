// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("DER decoding error: {0}")]
    Der(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Der(e) | Error::Syntax(e) | Error::Crypto(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Error::Crypto(e.to_string())
    }
}
