// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memvault.toml` > `~/.config/memvault/memvault.toml`
//! > `/etc/memvault/memvault.toml` with environment variable overrides via
//! the `MEMVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MemvaultConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memvault/memvault.toml` (system-wide)
/// 3. `~/.config/memvault/memvault.toml` (user XDG config)
/// 4. `./memvault.toml` (local directory)
/// 5. `MEMVAULT_*` environment variables
pub fn load_config() -> Result<MemvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemvaultConfig::default()))
        .merge(Toml::file("/etc/memvault/memvault.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("memvault/memvault.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("memvault.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MemvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` instead of `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MEMVAULT_LEDGER_RPC_URL` must map to
/// `ledger.rpc_url`, not `ledger.rpc.url`.
fn env_provider() -> Env {
    Env::prefixed("MEMVAULT_").map(|key| {
        // `key` is the env var name with prefix stripped, in its original
        // case (figment lowercases only after mapping), so normalize first.
        // Example: MEMVAULT_LEDGER_RPC_URL -> "ledger_rpc_url"
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("embedding_", "embedding.", 1)
            .replacen("blob_", "blob.", 1)
            .replacen("ledger_", "ledger.", 1)
            .replacen("index_", "index.", 1);
        mapped.into()
    })
}
