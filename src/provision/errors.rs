// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::{makecred, store};

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Invalid state transition: {0}")]
    InvalidState(String),
    #[error("Certificate error: {0}")]
    Certificate(String),
    #[error("Make credential error: {0}")]
    MakeCredential(#[from] makecred::Error),
    #[error("Store error: {0}")]
    Store(#[from] store::Error),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Malformed(e) | Error::InvalidState(e) | Error::Certificate(e) => {
                write!(f, "{}", e)
            }
            Error::MakeCredential(e) => write!(f, "{}", e),
            Error::Store(e) => write!(f, "{}", e),
        }
    }
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Error::Certificate(e.to_string())
    }
}
