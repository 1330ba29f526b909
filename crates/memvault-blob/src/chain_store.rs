// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback blob backend: a chain-oriented storage network.
//!
//! Blobs are posted as storage transactions and addressed by the resulting
//! object id. Wire shape differs from the mesh network; the two share only
//! the [`BlobBackend`] contract.

use std::time::Duration;

use async_trait::async_trait;
use memvault_core::types::UploadReceipt;
use memvault_core::{BlobBackend, MemvaultError};
use serde::Deserialize;
use tracing::{debug, warn};

/// Upload response from a chain-store gateway.
#[derive(Debug, Deserialize)]
struct ChainStoreUploadResponse {
    id: String,
    size: u64,
    #[serde(default)]
    block: Option<u64>,
}

/// Client for one chain-store gateway.
pub struct ChainStoreBackend {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl ChainStoreBackend {
    /// Probe `endpoints` in order and connect to the first reachable one.
    pub async fn connect(
        endpoints: &[String],
        probe_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, MemvaultError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MemvaultError::Internal(format!("failed to build HTTP client: {e}")))?;

        for endpoint in endpoints {
            let base_url = endpoint.trim_end_matches('/').to_string();
            match reachability_check(&client, &base_url, probe_timeout).await {
                Ok(()) => {
                    debug!(endpoint = %base_url, "chain-store endpoint selected");
                    return Ok(Self {
                        client,
                        base_url,
                        probe_timeout,
                    });
                }
                Err(e) => {
                    warn!(endpoint = %base_url, error = %e, "chain-store endpoint unreachable, trying next");
                }
            }
        }

        Err(MemvaultError::BackendUnavailable {
            backend: "chain-store",
            message: format!("no reachable endpoint among {} configured", endpoints.len()),
        })
    }
}

async fn reachability_check(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
) -> Result<(), MemvaultError> {
    client
        .get(format!("{base_url}/info"))
        .timeout(timeout)
        .send()
        .await
        .map(|_| ())
        .map_err(|e| MemvaultError::BackendUnavailable {
            backend: "chain-store",
            message: format!("info probe failed: {e}"),
        })
}

#[async_trait]
impl BlobBackend for ChainStoreBackend {
    fn name(&self) -> &'static str {
        "chain-store"
    }

    async fn probe(&self) -> Result<(), MemvaultError> {
        reachability_check(&self.client, &self.base_url, self.probe_timeout).await
    }

    async fn upload(&self, bytes: &[u8]) -> Result<UploadReceipt, MemvaultError> {
        let response = self
            .client
            .post(format!("{}/tx", self.base_url))
            .header("content-type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "chain-store",
                message: format!("upload failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemvaultError::BackendUnavailable {
                backend: "chain-store",
                message: format!("upload rejected with {status}: {body}"),
            });
        }

        let parsed: ChainStoreUploadResponse =
            response.json().await.map_err(|e| MemvaultError::Storage {
                source: Box::new(e),
            })?;

        Ok(UploadReceipt {
            blob_id: parsed.id,
            size_bytes: parsed.size,
            provider: self.name().to_string(),
            provider_ref: parsed.block.map(|b| b.to_string()),
        })
    }

    async fn download(&self, blob_id: &str) -> Result<Vec<u8>, MemvaultError> {
        let response = self
            .client
            .get(format!("{}/tx/{blob_id}/data", self.base_url))
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "chain-store",
                message: format!("download failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MemvaultError::Storage {
                source: format!("chain-store blob {blob_id} not retrievable: {status}").into(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| MemvaultError::Storage {
            source: Box::new(e),
        })?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, blob_id: &str) -> Result<bool, MemvaultError> {
        let response = self
            .client
            .get(format!("{}/tx/{blob_id}/status", self.base_url))
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "chain-store",
                message: format!("existence check failed: {e}"),
            })?;

        Ok(response.status().is_success())
    }
}
