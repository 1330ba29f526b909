// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted per-record indexing state and the join maps that reconcile
//! local ids with on-chain records.
//!
//! Local record ids, blob storage ids, and contract content hashes are
//! three distinct id spaces. The side table holds the explicit mappings
//! between them (`storage_id -> memory_id`, `storage_id -> contract_hash`)
//! so cross-space joins are never inferred from heuristics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use memvault_core::types::{IndexConfigEntry, IndexStatus};
use memvault_core::{LocalStore, MemvaultError};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

const STORE_KEY: &str = "index-config";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SideTableState {
    /// memory_id -> indexing state.
    #[serde(default)]
    entries: HashMap<String, IndexConfigEntry>,
    /// storage_id -> memory_id.
    #[serde(default)]
    storage_to_memory: HashMap<String, String>,
    /// storage_id -> contract content hash.
    #[serde(default)]
    storage_to_hash: HashMap<String, String>,
}

/// Durable record of where each memory stands in the indexing state
/// machine, kept separate from the metadata records themselves.
pub struct IndexSideTable {
    store: Arc<dyn LocalStore>,
    state: RwLock<SideTableState>,
}

impl IndexSideTable {
    /// Open the side table, loading any persisted state. Corrupt state is
    /// logged and treated as empty.
    pub async fn open(store: Arc<dyn LocalStore>) -> Self {
        let state = match store.load(STORE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "corrupt side-table entry, starting empty");
                    SideTableState::default()
                }
            },
            Ok(None) => SideTableState::default(),
            Err(e) => {
                warn!(error = %e, "side-table entry unreadable, starting empty");
                SideTableState::default()
            }
        };
        Self {
            store,
            state: RwLock::new(state),
        }
    }

    /// Indexing state for a record; `LocalOnly` defaults when untracked.
    pub async fn entry(&self, memory_id: &str) -> IndexConfigEntry {
        self.state
            .read()
            .await
            .entries
            .get(memory_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Mark a commit attempt as in flight.
    pub async fn record_pending(&self, memory_id: &str) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            let entry = state.entries.entry(memory_id.to_string()).or_default();
            entry.status = IndexStatus::OnChainPending;
        }
        self.persist().await
    }

    /// Mark content as persisted in the blob store, commit not yet done.
    pub async fn record_blob_uploaded(&self, memory_id: &str) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            let entry = state.entries.entry(memory_id.to_string()).or_default();
            // Don't regress a record that already made it further.
            if matches!(
                entry.status,
                IndexStatus::LocalOnly | IndexStatus::OnChainPending
            ) {
                entry.status = IndexStatus::BlobUploaded;
            }
        }
        self.persist().await
    }

    /// Record a successful (or duplicate-confirmed) on-chain commit and
    /// install both join-map entries for `storage_id`.
    ///
    /// A storage id already mapped to a *different* contract hash is
    /// rejected: remapping would silently corrupt every later join, so the
    /// caller must resolve the collision first.
    pub async fn record_committed(
        &self,
        memory_id: &str,
        contract_hash: &str,
        storage_id: &str,
        tx_hash: Option<String>,
    ) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            if let Some(existing) = state.storage_to_hash.get(storage_id) {
                if existing != contract_hash {
                    return Err(MemvaultError::Validation(format!(
                        "storage id {storage_id} already mapped to a different contract hash"
                    )));
                }
            }
            state
                .storage_to_memory
                .insert(storage_id.to_string(), memory_id.to_string());
            state
                .storage_to_hash
                .insert(storage_id.to_string(), contract_hash.to_string());

            let entry = state.entries.entry(memory_id.to_string()).or_default();
            entry.on_chain = true;
            entry.contract_hash = Some(contract_hash.to_string());
            entry.indexed_at = Some(Utc::now());
            entry.status = IndexStatus::OnChainCommitted;
            if tx_hash.is_some() {
                entry.tx_hash = tx_hash;
            }
        }
        self.persist().await
    }

    /// Record a commit the ledger accepted whose storage id is already
    /// mapped to a different hash.
    ///
    /// The entry is marked committed (the hash IS on-chain, retrying
    /// would only produce duplicate rejections) but neither join map is
    /// touched; the existing mapping keeps ownership of the storage id.
    pub async fn record_collision(
        &self,
        memory_id: &str,
        contract_hash: &str,
        tx_hash: Option<String>,
    ) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            let entry = state.entries.entry(memory_id.to_string()).or_default();
            entry.on_chain = true;
            entry.contract_hash = Some(contract_hash.to_string());
            entry.indexed_at = Some(Utc::now());
            entry.status = IndexStatus::OnChainCommitted;
            if tx_hash.is_some() {
                entry.tx_hash = tx_hash;
            }
        }
        self.persist().await
    }

    /// Mark a commit attempt as failed. Failure is sticky: nothing in the
    /// orchestrator retries it, only an explicit reindex.
    pub async fn record_failed(&self, memory_id: &str) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            let entry = state.entries.entry(memory_id.to_string()).or_default();
            entry.on_chain = false;
            entry.status = IndexStatus::OnChainFailed;
        }
        self.persist().await
    }

    /// Record a successful cross-agent verification.
    pub async fn record_verified(&self, memory_id: &str) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            let entry = state.entries.entry(memory_id.to_string()).or_default();
            entry.verified = true;
            entry.verified_at = Some(Utc::now());
            entry.status = IndexStatus::Verified;
        }
        self.persist().await
    }

    /// Record an on-chain revocation. The contract hash is kept so the
    /// history of what was committed survives the deactivation.
    pub async fn record_revoked(&self, memory_id: &str) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            let entry = state.entries.entry(memory_id.to_string()).or_default();
            entry.on_chain = false;
            entry.verified = false;
            entry.verified_at = None;
            entry.status = IndexStatus::LocalOnly;
        }
        self.persist().await
    }

    /// Drop a record's state and any join-map entries pointing at it.
    pub async fn remove(&self, memory_id: &str) -> Result<(), MemvaultError> {
        {
            let mut state = self.state.write().await;
            state.entries.remove(memory_id);
            let orphaned: Vec<String> = state
                .storage_to_memory
                .iter()
                .filter(|(_, mem)| mem.as_str() == memory_id)
                .map(|(storage, _)| storage.clone())
                .collect();
            for storage_id in orphaned {
                state.storage_to_memory.remove(&storage_id);
                state.storage_to_hash.remove(&storage_id);
            }
        }
        self.persist().await
    }

    /// Contract hash committed for a record, if any.
    pub async fn contract_hash_for(&self, memory_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .entries
            .get(memory_id)
            .and_then(|e| e.contract_hash.clone())
    }

    /// Local record id owning a storage id, if one committed it.
    pub async fn memory_for_storage(&self, storage_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .storage_to_memory
            .get(storage_id)
            .cloned()
    }

    async fn persist(&self) -> Result<(), MemvaultError> {
        let json = {
            let state = self.state.read().await;
            serde_json::to_string(&*state).map_err(|e| MemvaultError::Storage {
                source: Box::new(e),
            })?
        };
        self.store.save(STORE_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, JsonFileStore};

    #[tokio::test]
    async fn untracked_record_is_local_only() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        let entry = table.entry("mem-1").await;
        assert_eq!(entry.status, IndexStatus::LocalOnly);
        assert!(!entry.on_chain);
    }

    #[tokio::test]
    async fn commit_installs_join_maps_and_state() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash", "0xroot", Some("0xtx".to_string()))
            .await
            .unwrap();

        let entry = table.entry("mem-1").await;
        assert!(entry.on_chain);
        assert_eq!(entry.status, IndexStatus::OnChainCommitted);
        assert_eq!(entry.tx_hash.as_deref(), Some("0xtx"));
        assert!(entry.indexed_at.is_some());

        assert_eq!(
            table.memory_for_storage("0xroot").await.as_deref(),
            Some("mem-1")
        );
        assert_eq!(
            table.contract_hash_for("mem-1").await.as_deref(),
            Some("0xhash")
        );
    }

    #[tokio::test]
    async fn duplicate_commit_without_tx_keeps_existing_tx() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash", "0xroot", Some("0xtx".to_string()))
            .await
            .unwrap();
        // A duplicate-confirmed commit carries no fresh transaction.
        table
            .record_committed("mem-1", "0xhash", "0xroot", None)
            .await
            .unwrap();

        assert_eq!(table.entry("mem-1").await.tx_hash.as_deref(), Some("0xtx"));
    }

    #[tokio::test]
    async fn remapping_a_storage_id_is_rejected() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash-a", "0xroot", None)
            .await
            .unwrap();

        let err = table
            .record_committed("mem-2", "0xhash-b", "0xroot", None)
            .await
            .unwrap_err();
        assert!(matches!(err, MemvaultError::Validation(_)));

        // The original mapping is untouched.
        assert_eq!(
            table.memory_for_storage("0xroot").await.as_deref(),
            Some("mem-1")
        );
    }

    #[tokio::test]
    async fn collision_marks_committed_without_join_mapping() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash-a", "0xroot", None)
            .await
            .unwrap();
        table
            .record_collision("mem-2", "0xhash-b", Some("0xtx".to_string()))
            .await
            .unwrap();

        let entry = table.entry("mem-2").await;
        assert!(entry.on_chain);
        assert_eq!(entry.status, IndexStatus::OnChainCommitted);
        assert_eq!(entry.contract_hash.as_deref(), Some("0xhash-b"));

        // The original owner of the storage id is untouched.
        assert_eq!(
            table.memory_for_storage("0xroot").await.as_deref(),
            Some("mem-1")
        );
    }

    #[tokio::test]
    async fn failure_is_recorded_sticky() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table.record_pending("mem-1").await.unwrap();
        table.record_failed("mem-1").await.unwrap();

        let entry = table.entry("mem-1").await;
        assert_eq!(entry.status, IndexStatus::OnChainFailed);
        assert!(!entry.on_chain);
    }

    #[tokio::test]
    async fn blob_upload_does_not_regress_committed_state() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash", "0xroot", None)
            .await
            .unwrap();
        table.record_blob_uploaded("mem-1").await.unwrap();

        assert_eq!(table.entry("mem-1").await.status, IndexStatus::OnChainCommitted);
    }

    #[tokio::test]
    async fn verify_marks_verified() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash", "0xroot", None)
            .await
            .unwrap();
        table.record_verified("mem-1").await.unwrap();

        let entry = table.entry("mem-1").await;
        assert!(entry.verified);
        assert!(entry.verified_at.is_some());
        assert_eq!(entry.status, IndexStatus::Verified);
    }

    #[tokio::test]
    async fn revoke_clears_active_state_but_keeps_hash() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash", "0xroot", Some("0xtx".to_string()))
            .await
            .unwrap();
        table.record_verified("mem-1").await.unwrap();
        table.record_revoked("mem-1").await.unwrap();

        let entry = table.entry("mem-1").await;
        assert!(!entry.on_chain);
        assert!(!entry.verified);
        assert_eq!(entry.status, IndexStatus::LocalOnly);
        assert_eq!(entry.contract_hash.as_deref(), Some("0xhash"));
    }

    #[tokio::test]
    async fn remove_cleans_join_maps() {
        let table = IndexSideTable::open(Arc::new(InMemoryStore::new())).await;
        table
            .record_committed("mem-1", "0xhash", "0xroot", None)
            .await
            .unwrap();
        table.remove("mem-1").await.unwrap();

        assert!(table.memory_for_storage("0xroot").await.is_none());
        assert_eq!(table.entry("mem-1").await.status, IndexStatus::LocalOnly);

        // The freed storage id can now be mapped elsewhere.
        table
            .record_committed("mem-2", "0xother", "0xroot", None)
            .await
            .unwrap();
        assert_eq!(
            table.memory_for_storage("0xroot").await.as_deref(),
            Some("mem-2")
        );
    }

    #[tokio::test]
    async fn state_survives_reopen_with_durable_store() {
        let dir = tempfile::tempdir().unwrap();
        {
            let table = IndexSideTable::open(Arc::new(JsonFileStore::new(dir.path()))).await;
            table
                .record_committed("mem-1", "0xhash", "0xroot", Some("0xtx".to_string()))
                .await
                .unwrap();
        }
        let table = IndexSideTable::open(Arc::new(JsonFileStore::new(dir.path()))).await;
        assert!(table.entry("mem-1").await.on_chain);
        assert_eq!(
            table.memory_for_storage("0xroot").await.as_deref(),
            Some("mem-1")
        );
    }
}
