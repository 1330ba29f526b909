// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for binaries embedding the engine.

use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured log level applies.
/// Safe to call more than once, later calls are no-ops.
pub fn init(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
