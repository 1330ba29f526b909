// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primary blob backend: an erasure-coded mesh storage network.
//!
//! Uploads return a content-derived root hash plus an optional settlement
//! sequence number, which the indexer uses for explorer links.

use std::time::Duration;

use async_trait::async_trait;
use memvault_core::types::UploadReceipt;
use memvault_core::{BlobBackend, MemvaultError};
use serde::Deserialize;
use tracing::{debug, warn};

/// Upload response from a mesh storage node.
#[derive(Debug, Deserialize)]
struct MeshUploadResponse {
    root_hash: String,
    size: u64,
    #[serde(default)]
    tx_seq: Option<u64>,
}

/// Client for one mesh storage endpoint.
///
/// Construction probes the configured endpoints in order and binds to the
/// first reachable one; any HTTP response counts as reachable, only
/// transport errors and timeouts do not.
pub struct MeshBackend {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl MeshBackend {
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
                    debug!(endpoint = %base_url, "mesh endpoint selected");
                    return Ok(Self {
                        client,
                        base_url,
                        probe_timeout,
                    });
                }
                Err(e) => {
                    warn!(endpoint = %base_url, error = %e, "mesh endpoint unreachable, trying next");
                }
            }
        }

        Err(MemvaultError::BackendUnavailable {
            backend: "mesh",
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
        .get(format!("{base_url}/v1/status"))
        .timeout(timeout)
        .send()
        .await
        .map(|_| ())
        .map_err(|e| MemvaultError::BackendUnavailable {
            backend: "mesh",
            message: format!("status probe failed: {e}"),
        })
}

#[async_trait]
impl BlobBackend for MeshBackend {
    fn name(&self) -> &'static str {
        "mesh"
    }

    async fn probe(&self) -> Result<(), MemvaultError> {
        reachability_check(&self.client, &self.base_url, self.probe_timeout).await
    }

    async fn upload(&self, bytes: &[u8]) -> Result<UploadReceipt, MemvaultError> {
        let response = self
            .client
            .post(format!("{}/v1/blobs", self.base_url))
            .header("content-type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "mesh",
                message: format!("upload failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemvaultError::BackendUnavailable {
                backend: "mesh",
                message: format!("upload rejected with {status}: {body}"),
            });
        }

        let parsed: MeshUploadResponse =
            response.json().await.map_err(|e| MemvaultError::Storage {
                source: Box::new(e),
            })?;

        Ok(UploadReceipt {
            blob_id: parsed.root_hash,
            size_bytes: parsed.size,
            provider: self.name().to_string(),
            provider_ref: parsed.tx_seq.map(|seq| seq.to_string()),
        })
    }

    async fn download(&self, blob_id: &str) -> Result<Vec<u8>, MemvaultError> {
        let response = self
            .client
            .get(format!("{}/v1/blobs/{blob_id}", self.base_url))
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "mesh",
                message: format!("download failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MemvaultError::Storage {
                source: format!("mesh blob {blob_id} not retrievable: {status}").into(),
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
            .get(format!("{}/v1/blobs/{blob_id}/status", self.base_url))
            .send()
            .await
            .map_err(|e| MemvaultError::BackendUnavailable {
                backend: "mesh",
                message: format!("existence check failed: {e}"),
            })?;

        Ok(response.status().is_success())
    }
}
