// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Provisioning protocol messages.

pub use self::base64::Bytes;
pub use self::claim::*;
pub use self::codec::{Codec, MAX_MESSAGE_LEN};
pub use self::errors::Error;
pub use self::paccor::ComponentInfo;
pub use self::pcr::PcrSelection;
pub use self::protocol::*;
pub use self::quote::TpmQuote;

mod base64;
mod claim;
mod codec;
mod errors;
mod paccor;
mod pcr;
mod protocol;
mod quote;
