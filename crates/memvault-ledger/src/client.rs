// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC client for the on-chain memory-hash registry.
//!
//! Degraded mode is decided once, at [`RegistryClient::connect`], and is
//! sticky for the client's lifetime so behavior stays predictable for
//! callers. No silent mid-session reconnects; reinitialization happens
//! through [`crate::SharedRegistry`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use memvault_config::model::LedgerConfig;
use memvault_core::MemvaultError;
use memvault_core::types::{OnChainMemoryHash, RegistryStats};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::rpc::{CODE_DUPLICATE_HASH, CODE_NOT_COMMITTER, RpcRequest, RpcResponse};

/// One record to commit to the registry.
#[derive(Debug, Clone, Serialize)]
pub struct CommitRequest {
    /// Content hash; the on-chain identity key.
    pub hash: String,
    /// Opaque metadata string stored alongside the hash.
    pub metadata: String,
    /// Blob store identifier; the join key back to local records.
    pub storage_id: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub tags: Vec<String>,
}

impl CommitRequest {
    fn validate(&self) -> Result<(), MemvaultError> {
        if self.hash.is_empty() {
            return Err(MemvaultError::Validation(
                "commit rejected: empty content hash".to_string(),
            ));
        }
        if self.storage_id.is_empty() {
            return Err(MemvaultError::Validation(
                "commit rejected: empty storage id".to_string(),
            ));
        }
        Ok(())
    }
}

/// Client for the registry contract, reached over JSON-RPC.
pub struct RegistryClient {
    client: reqwest::Client,
    rpc_url: String,
    contract_address: String,
    agent_id: String,
    max_batch_size: usize,
    degraded: bool,
    next_id: AtomicU64,
}

impl RegistryClient {
    /// Connect to the registry, probing reachability once.
    ///
    /// Never fails: an unreachable (or disabled) ledger yields a client in
    /// degraded mode, and the engine continues on local tiers.
    pub async fn connect(config: &LedgerConfig, agent_id: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        let mut registry = Self {
            client,
            rpc_url: config.rpc_url.clone(),
            contract_address: config.contract_address.clone(),
            agent_id: agent_id.to_string(),
            max_batch_size: config.max_batch_size,
            degraded: true,
            next_id: AtomicU64::new(1),
        };

        if !config.enabled {
            info!("ledger tier disabled by configuration, registry starts degraded");
            return registry;
        }

        let probe = registry
            .call::<Value>("registry_stats", json!([registry.contract_address.clone()]))
            .await;
        match probe {
            Ok(_) => {
                debug!(rpc_url = %registry.rpc_url, "registry reachable");
                registry.degraded = false;
            }
            Err(e) => {
                warn!(rpc_url = %registry.rpc_url, error = %e, "registry unreachable, entering degraded mode");
            }
        }

        registry
    }

    /// Whether the client was constructed in degraded mode.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Maximum records accepted by a single batch commit.
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// The agent identity used for commits and revocations.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn degraded_error(&self) -> MemvaultError {
        MemvaultError::BackendUnavailable {
            backend: "ledger",
            message: "registry is degraded for this session; reinitialize explicitly to retry"
                .to_string(),
        }
    }

    /// Commit one memory hash. Rejects (idempotent-reject) when the hash
    /// already exists; callers treat that as non-fatal for re-indexing.
    pub async fn commit(&self, request: &CommitRequest) -> Result<String, MemvaultError> {
        request.validate()?;
        if self.degraded {
            return Err(self.degraded_error());
        }

        let params = json!([self.contract_address, self.agent_id, request]);
        match self.call::<String>("registry_commit", params).await {
            Err(MemvaultError::DuplicateOnChain { hash }) if hash.is_empty() => {
                Err(MemvaultError::DuplicateOnChain {
                    hash: request.hash.clone(),
                })
            }
            other => other,
        }
    }

    /// Commit a batch of records in one transaction.
    ///
    /// Bounded to [`max_batch_size`](Self::max_batch_size); oversized
    /// batches are rejected before submission, never silently truncated.
    pub async fn batch_commit(&self, requests: &[CommitRequest]) -> Result<String, MemvaultError> {
        if requests.is_empty() {
            return Err(MemvaultError::Validation(
                "batch commit rejected: empty batch".to_string(),
            ));
        }
        if requests.len() > self.max_batch_size {
            return Err(MemvaultError::Validation(format!(
                "batch commit rejected: {} records exceeds the maximum of {}",
                requests.len(),
                self.max_batch_size
            )));
        }
        for request in requests {
            request.validate()?;
        }
        if self.degraded {
            return Err(self.degraded_error());
        }

        let params = json!([self.contract_address, self.agent_id, requests]);
        self.call("registry_batchCommit", params).await
    }

    /// Mark a committed hash as cross-agent verified. Idempotent.
    pub async fn verify(&self, hash: &str) -> Result<(), MemvaultError> {
        if hash.is_empty() {
            return Err(MemvaultError::Validation(
                "verify rejected: empty content hash".to_string(),
            ));
        }
        if self.degraded {
            return Err(self.degraded_error());
        }

        self.call::<Value>(
            "registry_verify",
            json!([self.contract_address, self.agent_id, hash]),
        )
        .await
        .map(|_| ())
    }

    /// Revoke a committed hash (`is_active = false`). Only the original
    /// committing agent may revoke; records are never deleted.
    pub async fn revoke(&self, hash: &str) -> Result<(), MemvaultError> {
        if hash.is_empty() {
            return Err(MemvaultError::Validation(
                "revoke rejected: empty content hash".to_string(),
            ));
        }
        if self.degraded {
            return Err(self.degraded_error());
        }

        self.call::<Value>(
            "registry_revoke",
            json!([self.contract_address, self.agent_id, hash]),
        )
        .await
        .map(|_| ())
    }

    /// Records carrying the given tag. Empty in degraded mode.
    pub async fn query_by_tag(&self, tag: &str) -> Result<Vec<OnChainMemoryHash>, MemvaultError> {
        if self.degraded {
            return Ok(Vec::new());
        }
        self.call("registry_queryByTag", json!([self.contract_address, tag]))
            .await
    }

    /// Records of the given content type. Empty in degraded mode.
    pub async fn query_by_content_type(
        &self,
        content_type: &str,
    ) -> Result<Vec<OnChainMemoryHash>, MemvaultError> {
        if self.degraded {
            return Ok(Vec::new());
        }
        self.call(
            "registry_queryByContentType",
            json!([self.contract_address, content_type]),
        )
        .await
    }

    /// Records committed by the given agent. Empty in degraded mode.
    pub async fn query_by_agent(
        &self,
        agent: &str,
    ) -> Result<Vec<OnChainMemoryHash>, MemvaultError> {
        if self.degraded {
            return Ok(Vec::new());
        }
        self.call("registry_queryByAgent", json!([self.contract_address, agent]))
            .await
    }

    /// The record joined to the given storage id, if committed. `None` in
    /// degraded mode.
    pub async fn query_by_storage_id(
        &self,
        storage_id: &str,
    ) -> Result<Option<OnChainMemoryHash>, MemvaultError> {
        if self.degraded {
            return Ok(None);
        }
        self.call(
            "registry_queryByStorageId",
            json!([self.contract_address, storage_id]),
        )
        .await
    }

    /// Whether the registry already holds a content hash. Used as the
    /// idempotency pre-check for batch flows. `false` in degraded mode.
    pub async fn has_hash(&self, hash: &str) -> Result<bool, MemvaultError> {
        if self.degraded {
            return Ok(false);
        }
        self.call("registry_hasHash", json!([self.contract_address, hash]))
            .await
    }

    /// All tags observed on-chain. Empty in degraded mode.
    pub async fn list_tags(&self) -> Result<Vec<String>, MemvaultError> {
        if self.degraded {
            return Ok(Vec::new());
        }
        self.call("registry_listTags", json!([self.contract_address]))
            .await
    }

    /// Aggregate registry counters.
    ///
    /// Errs in degraded mode so callers can omit (not zero-fill) the
    /// on-chain stats section.
    pub async fn stats(&self) -> Result<RegistryStats, MemvaultError> {
        if self.degraded {
            return Err(self.degraded_error());
        }
        self.call("registry_stats", json!([self.contract_address]))
            .await
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, MemvaultError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "ledger",
                message: format!("rpc transport failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemvaultError::BackendUnavailable {
                backend: "ledger",
                message: format!("rpc endpoint returned {status}: {body}"),
            });
        }

        let envelope: RpcResponse =
            response.json().await.map_err(|e| MemvaultError::Internal(format!(
                "malformed rpc response for {method}: {e}"
            )))?;

        if let Some(error) = envelope.error {
            return Err(match error.code {
                CODE_DUPLICATE_HASH => MemvaultError::DuplicateOnChain {
                    hash: error.data.unwrap_or_default(),
                },
                CODE_NOT_COMMITTER => MemvaultError::Validation(format!(
                    "revoke rejected by registry: {}",
                    error.message
                )),
                code => MemvaultError::Internal(format!(
                    "registry rpc error {code} for {method}: {}",
                    error.message
                )),
            });
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null)).map_err(|e| {
            MemvaultError::Internal(format!("unexpected rpc result for {method}: {e}"))
        })
    }
}
