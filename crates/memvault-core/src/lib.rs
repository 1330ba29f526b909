// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Memvault memory indexing engine.
//!
//! This crate provides the foundational error type, domain types
//! (records, vector entries, on-chain hash records), the content hasher,
//! and the collaborator traits implemented by the adapter crates.

pub mod error;
pub mod hash;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MemvaultError;
pub use hash::{content_hash, verify_content};
pub use traits::{BlobBackend, Cipher, EmbeddingProvider, LocalStore, PassthroughCipher};
pub use types::{
    IndexConfigEntry, IndexStats, IndexStatus, MemoryRecord, OnChainMemoryHash, QueryCriteria,
    RecordMetadata, RegistryStats, ScoredSummary, UploadReceipt, VectorEntry, VectorSummary,
};
