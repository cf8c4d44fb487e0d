// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Repository contracts used by the protocol engine, and in-memory
//! implementations of them.

pub use self::challenge::{ChallengeState, MIN_NONCE_LENGTH};
pub use self::device::Device;
pub use self::errors::Error;
pub use self::icertificatestore::ICertificateStore;
pub use self::ichallengestore::IChallengeStore;
pub use self::idevicestore::IDeviceStore;
pub use self::ipolicystore::IPolicyStore;
pub use self::issued::{IssuedCertificate, SECONDS_PER_DAY};
pub use self::itrustanchorstore::ITrustAnchorStore;
pub use self::memo_certificatestore::MemoCertificateStore;
pub use self::memo_challengestore::MemoChallengeStore;
pub use self::memo_devicestore::MemoDeviceStore;
pub use self::memo_policystore::MemoPolicyStore;
pub use self::memo_trustanchorstore::MemoTrustAnchorStore;

mod challenge;
mod device;
mod errors;
mod icertificatestore;
mod ichallengestore;
mod idevicestore;
mod ipolicystore;
mod issued;
mod itrustanchorstore;
mod memo_certificatestore;
mod memo_challengestore;
mod memo_devicestore;
mod memo_policystore;
mod memo_trustanchorstore;
