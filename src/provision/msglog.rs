// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::config::MessageLogging;
use crate::message::Codec;
use tracing::{info, warn};

/// Render `msg` into the log if the message logging policy asks for it
pub(crate) fn log_message<M: Codec>(policy: MessageLogging, failed: bool, kind: &str, msg: &M) {
    if !policy.should_log(failed) {
        return;
    }

    match msg.to_json() {
        Ok(j) => info!(kind, failed, message = %j, "protocol message"),
        Err(e) => warn!(kind, error = %e, "protocol message not loggable"),
    }
}
