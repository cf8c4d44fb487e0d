// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.  With `json` set, events are
/// emitted as one JSON object per line.  Calling this more than once is
/// harmless: only the first subscriber is kept.
pub fn init(level: &str, json: bool) {
    let registry = tracing_subscriber::registry().with(filter(level));

    let _ = if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice() {
        init("debug", false);
        init("warn", true);

        tracing::info!(component = "logging", "initialised");
    }

    #[test]
    fn bad_level_falls_back() {
        let _ = filter("not a level=+");
    }
}
