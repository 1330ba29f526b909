// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store adapter with transparent upload fallback.
//!
//! Uploads try each configured backend in order (primary mesh first, then
//! the chain-store fallback) and log which backend ultimately served the
//! request. Downloads do not retry across backends: a blob id only
//! resolves at the backend that produced it, so callers route by the
//! provider recorded in the upload receipt.

use std::sync::Arc;
use std::time::Duration;

use memvault_config::model::BlobConfig;
use memvault_core::types::UploadReceipt;
use memvault_core::{BlobBackend, MemvaultError};
use tracing::{info, warn};

use crate::chain_store::ChainStoreBackend;
use crate::mesh::MeshBackend;

/// Adapter over the configured blob backends, in fallback order.
pub struct BlobAdapter {
    backends: Vec<Arc<dyn BlobBackend>>,
}

impl BlobAdapter {
    /// Build an adapter from explicit backends, in fallback order.
    pub fn new(backends: Vec<Arc<dyn BlobBackend>>) -> Self {
        Self { backends }
    }

    /// Probe the configured networks and keep every reachable backend.
    ///
    /// A backend with no reachable endpoint is dropped with a warning; an
    /// adapter with zero backends is still valid and fails uploads with
    /// `BackendUnavailable`, so the local tiers keep functioning.
    pub async fn connect(config: &BlobConfig) -> Self {
        let probe_timeout = Duration::from_secs(config.probe_timeout_secs);
        let request_timeout = Duration::from_secs(config.request_timeout_secs);

        let mut backends: Vec<Arc<dyn BlobBackend>> = Vec::new();

        match MeshBackend::connect(&config.mesh_endpoints, probe_timeout, request_timeout).await {
            Ok(backend) => backends.push(Arc::new(backend)),
            Err(e) => warn!(error = %e, "mesh network unavailable"),
        }

        match ChainStoreBackend::connect(
            &config.chain_store_endpoints,
            probe_timeout,
            request_timeout,
        )
        .await
        {
            Ok(backend) => backends.push(Arc::new(backend)),
            Err(e) => warn!(error = %e, "chain-store network unavailable"),
        }

        Self { backends }
    }

    /// Names of the reachable backends, in fallback order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Whether any backend survived connection probing.
    pub fn has_backends(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Upload bytes, falling back across backends on any failure.
    pub async fn upload(&self, bytes: &[u8]) -> Result<UploadReceipt, MemvaultError> {
        let mut last_error: Option<MemvaultError> = None;

        for backend in &self.backends {
            match backend.upload(bytes).await {
                Ok(receipt) => {
                    info!(
                        provider = backend.name(),
                        blob_id = %receipt.blob_id,
                        size = receipt.size_bytes,
                        "blob upload served"
                    );
                    return Ok(receipt);
                }
                Err(e) => {
                    warn!(provider = backend.name(), error = %e, "blob upload failed, trying fallback");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => e,
            None => MemvaultError::BackendUnavailable {
                backend: "blob",
                message: "no blob backend available".to_string(),
            },
        })
    }

    /// Download a blob from the backend that produced its id.
    pub async fn download(&self, provider: &str, blob_id: &str) -> Result<Vec<u8>, MemvaultError> {
        self.backend(provider)?.download(blob_id).await
    }

    /// Check whether the named backend still holds a blob.
    pub async fn exists(&self, provider: &str, blob_id: &str) -> Result<bool, MemvaultError> {
        self.backend(provider)?.exists(blob_id).await
    }

    fn backend(&self, provider: &str) -> Result<&Arc<dyn BlobBackend>, MemvaultError> {
        self.backends
            .iter()
            .find(|b| b.name() == provider)
            .ok_or_else(|| {
                MemvaultError::Validation(format!("unknown or unreachable blob provider: {provider}"))
            })
    }
}
