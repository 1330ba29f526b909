// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Memvault memory engine.

use thiserror::Error;

/// The primary error type used across all Memvault adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MemvaultError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Computed content hash does not match the stored checksum.
    ///
    /// Surfaced only from explicit verification, never from normal reads.
    #[error("integrity failure: checksum mismatch (expected {expected}, got {actual})")]
    Integrity { expected: String, actual: String },

    /// A blob backend or the ledger could not be reached within its timeout.
    ///
    /// Recovered locally: the blob tier falls back to the next backend, the
    /// ledger tier enters degraded mode. Never crashes the process.
    #[error("{backend} unavailable: {message}")]
    BackendUnavailable {
        backend: &'static str,
        message: String,
    },

    /// Commit rejected because the content hash already exists on-chain.
    ///
    /// Treated as success-equivalent ("already indexed") in batch flows.
    #[error("hash already indexed on-chain: {hash}")]
    DuplicateOnChain { hash: String },

    /// The embedding provider failed or returned malformed output.
    ///
    /// Aborts the single store operation that requested it.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input (empty hash, oversized batch, mismatched array lengths).
    ///
    /// Rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Local store errors (serialization, filesystem I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemvaultError {
    /// True when this error is the idempotent-reject from an on-chain commit.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, MemvaultError::DuplicateOnChain { .. })
    }

    /// True when this error marks an unreachable or degraded backend tier.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            MemvaultError::BackendUnavailable { .. } | MemvaultError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_construct() {
        let _config = MemvaultError::Config("test".into());
        let _integrity = MemvaultError::Integrity {
            expected: "abc".into(),
            actual: "def".into(),
        };
        let _unavailable = MemvaultError::BackendUnavailable {
            backend: "ledger",
            message: "connection refused".into(),
        };
        let _duplicate = MemvaultError::DuplicateOnChain { hash: "ff".into() };
        let _embedding = MemvaultError::Embedding {
            message: "rate limited".into(),
            source: None,
        };
        let _validation = MemvaultError::Validation("empty hash".into());
        let _storage = MemvaultError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = MemvaultError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        let _internal = MemvaultError::Internal("test".into());
    }

    #[test]
    fn duplicate_is_success_equivalent_marker() {
        let err = MemvaultError::DuplicateOnChain { hash: "aa".into() };
        assert!(err.is_duplicate());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn unavailable_covers_timeout() {
        let err = MemvaultError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        assert!(err.is_unavailable());
    }

    #[test]
    fn display_names_the_backend() {
        let err = MemvaultError::BackendUnavailable {
            backend: "blob",
            message: "all endpoints failed".into(),
        };
        assert!(err.to_string().contains("blob unavailable"));
    }
}
