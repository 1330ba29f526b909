// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the memory indexing engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single memory stored and indexed by the engine.
///
/// Records are created locally first and queryable immediately; on-chain
/// anchoring only ever adds corroborating metadata, it never retracts or
/// blocks local availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable identifier assigned at creation (UUID v4).
    pub id: String,
    /// Plaintext or ciphertext body. Encryption is applied by an external
    /// collaborator before the blob tier sees content; this engine treats
    /// the body as opaque.
    pub content: String,
    /// Content type classification (e.g. "text/plain", "conversation").
    pub content_type: String,
    /// Coarse category label.
    pub category: String,
    /// Free-form tags; may be empty.
    pub tags: Vec<String>,
    /// Creation timestamp; immutable after creation.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Agent identifier that created the record. An ownership/filter key,
    /// not an enforcement mechanism.
    pub owner: String,
    /// Storage metadata (size, checksum, blob identity).
    pub metadata: RecordMetadata,
    /// Explorer link built from the provider reference; populated only
    /// after a successful on-chain commit.
    #[serde(default)]
    pub explorer_url: Option<String>,
    /// Ledger transaction reference; absence means "not yet anchored",
    /// not "invalid".
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// Storage metadata attached to a [`MemoryRecord`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Content size in bytes.
    pub size: u64,
    /// SHA-256 checksum of the stored content.
    pub checksum: String,
    /// Identifier returned by the blob store; the join key between local
    /// records and on-chain records.
    #[serde(default)]
    pub blob_id: Option<String>,
    /// Which blob backend produced `blob_id`.
    #[serde(default)]
    pub storage_provider: Option<String>,
}

impl MemoryRecord {
    /// The storage id used to join this record against on-chain entries.
    ///
    /// Returns `None` when content was never actually put in the blob
    /// store (no blob id, or the blob id still equals the ephemeral
    /// local id).
    pub fn storage_id(&self) -> Option<&str> {
        match self.metadata.blob_id.as_deref() {
            Some(blob_id) if blob_id != self.id => Some(blob_id),
            _ => None,
        }
    }
}

/// A vector-index entry keyed by the same id as its [`MemoryRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Id of the matching metadata record.
    pub id: String,
    /// Embedding vector, normalized to the deployment dimension.
    pub vector: Vec<f32>,
    /// Lightweight summary returned from similarity search.
    pub summary: VectorSummary,
}

/// Summary metadata carried alongside a vector, so similarity search can
/// rank and present results without a metadata-index round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorSummary {
    pub content_type: String,
    pub category: String,
    pub tags: Vec<String>,
    /// First characters of the content, for display.
    pub preview: String,
}

/// A similarity-search hit.
#[derive(Debug, Clone)]
pub struct ScoredSummary {
    pub id: String,
    /// Cosine similarity against the query vector, in [-1, 1].
    pub score: f32,
    pub summary: VectorSummary,
}

/// A memory-hash record as reported by the on-chain registry.
///
/// Owned by the external ledger and read-only to this engine. Identity is
/// the content hash, which differs from the local record id; the two sides
/// reconcile via `storage_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnChainMemoryHash {
    pub hash: String,
    #[serde(default)]
    pub metadata: String,
    pub agent: String,
    pub timestamp: i64,
    pub is_active: bool,
    pub storage_id: String,
    pub content_type: String,
    pub size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Aggregate counters reported by the on-chain registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: u64,
    pub active: u64,
    pub verified: u64,
    pub total_tags: u64,
    pub total_size_bytes: u64,
}

/// Indexing status of a single record.
///
/// `LocalOnly` is always immediately reachable; later states only add
/// corroborating metadata. `OnChainFailed` is sticky: the orchestrator
/// never auto-retries, a caller must explicitly reindex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexStatus {
    /// Present in the local tiers only.
    LocalOnly,
    /// Content persisted in the blob store, commit not yet attempted.
    BlobUploaded,
    /// On-chain commit in flight.
    OnChainPending,
    /// Hash committed to the ledger.
    OnChainCommitted,
    /// Commit attempt failed; awaiting an explicit reindex.
    OnChainFailed,
    /// Cross-agent verified on the ledger.
    Verified,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::LocalOnly => "local-only",
            IndexStatus::BlobUploaded => "blob-uploaded",
            IndexStatus::OnChainPending => "on-chain-pending",
            IndexStatus::OnChainCommitted => "on-chain-committed",
            IndexStatus::OnChainFailed => "on-chain-failed",
            IndexStatus::Verified => "verified",
        }
    }

    pub fn from_str_value(s: &str) -> Self {
        match s {
            "blob-uploaded" => IndexStatus::BlobUploaded,
            "on-chain-pending" => IndexStatus::OnChainPending,
            "on-chain-committed" => IndexStatus::OnChainCommitted,
            "on-chain-failed" => IndexStatus::OnChainFailed,
            "verified" => IndexStatus::Verified,
            _ => IndexStatus::LocalOnly,
        }
    }
}

/// Per-record indexing state persisted in the side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfigEntry {
    /// Whether the record's hash is known to be committed on-chain.
    pub on_chain: bool,
    /// Ledger transaction reference for the commit, when known.
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// The content hash committed to the contract. Required for later
    /// verification; verify is never attempted with a fabricated hash.
    #[serde(default)]
    pub contract_hash: Option<String>,
    /// When the commit succeeded.
    #[serde(default)]
    pub indexed_at: Option<DateTime<Utc>>,
    /// Whether an explicit verify step against the ledger succeeded.
    /// Committing and verifying are distinct states.
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    /// Current position in the indexing state machine.
    pub status: IndexStatus,
}

impl Default for IndexConfigEntry {
    fn default() -> Self {
        Self {
            on_chain: false,
            tx_hash: None,
            contract_hash: None,
            indexed_at: None,
            verified: false,
            verified_at: None,
            status: IndexStatus::LocalOnly,
        }
    }
}

/// Filter criteria for `query_memories`.
#[derive(Debug, Clone, Default)]
pub struct QueryCriteria {
    /// Case-insensitive substring match against record tags.
    pub tag: Option<String>,
    /// Case-insensitive exact match against the content type.
    pub content_type: Option<String>,
    /// Exact match against the owning agent.
    pub agent: Option<String>,
    /// Restrict results to records whose storage id appears on-chain.
    pub on_chain_only: bool,
}

/// Merged local and on-chain statistics.
///
/// The on-chain section is omitted (not zero-filled) when the registry is
/// unreachable, so callers can distinguish "zero memories" from "stats
/// unavailable".
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub metadata_count: usize,
    pub vector_count: usize,
    pub total_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_chain: Option<RegistryStats>,
}

/// Receipt returned by a blob backend after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Content identifier within the backend that served the upload.
    pub blob_id: String,
    pub size_bytes: u64,
    /// Name of the backend that ultimately served the request.
    pub provider: String,
    /// Optional secondary ledger reference (e.g. a settlement-chain
    /// object id), used to build explorer links.
    #[serde(default)]
    pub provider_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_blob(id: &str, blob_id: Option<&str>) -> MemoryRecord {
        MemoryRecord {
            id: id.to_string(),
            content: "User prefers dark mode".to_string(),
            content_type: "text/plain".to_string(),
            category: "preference".to_string(),
            tags: vec!["ui".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner: "agent-1".to_string(),
            metadata: RecordMetadata {
                size: 22,
                checksum: "abc".to_string(),
                blob_id: blob_id.map(str::to_string),
                storage_provider: None,
            },
            explorer_url: None,
            transaction_hash: None,
        }
    }

    #[test]
    fn storage_id_absent_without_blob() {
        let record = record_with_blob("mem-1", None);
        assert_eq!(record.storage_id(), None);
    }

    #[test]
    fn storage_id_absent_when_blob_equals_local_id() {
        // The ephemeral local id means content never reached the blob store.
        let record = record_with_blob("mem-1", Some("mem-1"));
        assert_eq!(record.storage_id(), None);
    }

    #[test]
    fn storage_id_present_after_upload() {
        let record = record_with_blob("mem-1", Some("0xroot"));
        assert_eq!(record.storage_id(), Some("0xroot"));
    }

    #[test]
    fn index_status_round_trips_through_strings() {
        for status in [
            IndexStatus::LocalOnly,
            IndexStatus::BlobUploaded,
            IndexStatus::OnChainPending,
            IndexStatus::OnChainCommitted,
            IndexStatus::OnChainFailed,
            IndexStatus::Verified,
        ] {
            assert_eq!(IndexStatus::from_str_value(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_string_defaults_to_local_only() {
        assert_eq!(IndexStatus::from_str_value("???"), IndexStatus::LocalOnly);
    }

    #[test]
    fn record_serde_round_trip() {
        let record = record_with_blob("mem-1", Some("0xroot"));
        let json = serde_json::to_string(&record).unwrap();
        let back: MemoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "mem-1");
        assert_eq!(back.metadata.blob_id.as_deref(), Some("0xroot"));
        assert_eq!(back.tags, vec!["ui"]);
    }

    #[test]
    fn index_config_entry_defaults_local_only() {
        let entry = IndexConfigEntry::default();
        assert!(!entry.on_chain);
        assert!(!entry.verified);
        assert_eq!(entry.status, IndexStatus::LocalOnly);
    }
}
