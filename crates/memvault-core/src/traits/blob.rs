// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob backend trait for content-addressed storage networks.

use async_trait::async_trait;

use crate::error::MemvaultError;
use crate::types::UploadReceipt;

/// One content-addressed blob storage network.
///
/// Blob ids are backend-scoped: only the backend that produced an id can
/// resolve it. The adapter layer above this trait decides fallback order
/// for uploads; downloads go to the backend recorded in the receipt.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Short stable name, recorded in receipts as the storage provider.
    fn name(&self) -> &'static str;

    /// Lightweight reachability check with a short timeout.
    async fn probe(&self) -> Result<(), MemvaultError>;

    /// Upload opaque bytes, returning the content identifier.
    async fn upload(&self, bytes: &[u8]) -> Result<UploadReceipt, MemvaultError>;

    /// Download the bytes behind a previously returned blob id.
    async fn download(&self, blob_id: &str) -> Result<Vec<u8>, MemvaultError>;

    /// Whether the backend still holds the given blob.
    async fn exists(&self, blob_id: &str) -> Result<bool, MemvaultError>;
}
