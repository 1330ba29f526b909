// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Memvault memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Memvault configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemvaultConfig {
    /// Agent identity settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Blob storage network settings.
    #[serde(default)]
    pub blob: BlobConfig,

    /// On-chain registry settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Local index settings.
    #[serde(default)]
    pub index: IndexSettings,
}

/// Agent identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Identifier recorded as the owner of created memories.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_id() -> String {
    "memvault-agent".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Inference API endpoint for embedding requests.
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Bearer token for the inference API.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Fixed vector dimension for this deployment. Model output of a
    /// different length is zero-padded or truncated to this size.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

/// Blob storage configuration: a primary network and a fallback network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlobConfig {
    /// Primary erasure-coded blob network.
    #[serde(default = "default_mesh_endpoints")]
    pub mesh_endpoints: Vec<String>,

    /// Fallback chain-oriented storage network.
    #[serde(default = "default_chain_store_endpoints")]
    pub chain_store_endpoints: Vec<String>,

    /// Reachability probe timeout in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Upload/download request timeout in seconds.
    #[serde(default = "default_blob_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            mesh_endpoints: default_mesh_endpoints(),
            chain_store_endpoints: default_chain_store_endpoints(),
            probe_timeout_secs: default_probe_timeout_secs(),
            request_timeout_secs: default_blob_timeout_secs(),
        }
    }
}

fn default_mesh_endpoints() -> Vec<String> {
    vec!["https://mesh.memvault.network".to_string()]
}

fn default_chain_store_endpoints() -> Vec<String> {
    vec!["https://chainstore.memvault.network".to_string()]
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_blob_timeout_secs() -> u64 {
    60
}

/// On-chain registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Enable the on-chain tier. When false the registry client starts
    /// degraded and the engine runs on local tiers only.
    #[serde(default = "default_ledger_enabled")]
    pub enabled: bool,

    /// JSON-RPC endpoint of the registry.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Address of the registry contract.
    #[serde(default)]
    pub contract_address: String,

    /// Base URL for building transaction explorer links.
    #[serde(default = "default_explorer_base_url")]
    pub explorer_base_url: String,

    /// Connect timeout in seconds before declaring degraded mode.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-request timeout in seconds once connected.
    #[serde(default = "default_ledger_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum records per batch commit. Oversized batches are rejected
    /// before submission, never silently truncated.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: default_ledger_enabled(),
            rpc_url: default_rpc_url(),
            contract_address: String::new(),
            explorer_base_url: default_explorer_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_ledger_request_timeout_secs(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_ledger_enabled() -> bool {
    true
}

fn default_rpc_url() -> String {
    "https://rpc.memvault.network".to_string()
}

fn default_explorer_base_url() -> String {
    "https://explorer.memvault.network".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_ledger_request_timeout_secs() -> u64 {
    30
}

fn default_max_batch_size() -> usize {
    50
}

/// Local index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSettings {
    /// Directory for persisted index state. When unset, the platform data
    /// directory is used; when neither resolves the index runs in memory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Maximum results returned from a similarity search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    50
}
