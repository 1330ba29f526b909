// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local metadata index: an ordered, persisted list of memory records.
//!
//! Authoritative for fast listing and filtering, independent of network
//! availability. Ordering is most-recently-added first; updates keep a
//! record's position.

use std::sync::Arc;

use memvault_core::types::MemoryRecord;
use memvault_core::{LocalStore, MemvaultError};
use tokio::sync::RwLock;
use tracing::warn;

const STORE_KEY: &str = "metadata";

/// Persisted, ordered record list with an in-memory working copy.
pub struct MetadataIndex {
    store: Arc<dyn LocalStore>,
    records: RwLock<Vec<MemoryRecord>>,
}

impl MetadataIndex {
    /// Open the index, loading any persisted state.
    ///
    /// A corrupt or unreadable entry is logged and treated as empty; the
    /// metadata list is rebuildable from the blob/ledger tiers, so losing
    /// it must never block startup.
    pub async fn open(store: Arc<dyn LocalStore>) -> Self {
        let records = match store.load(STORE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "corrupt metadata entry, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "metadata entry unreadable, starting empty");
                Vec::new()
            }
        };
        Self {
            store,
            records: RwLock::new(records),
        }
    }

    /// Insert or replace a record. New records go to the front.
    pub async fn upsert(&self, record: MemoryRecord) -> Result<(), MemvaultError> {
        {
            let mut records = self.records.write().await;
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => records.insert(0, record),
            }
        }
        self.persist().await
    }

    /// Remove a record. Returns whether it was present.
    pub async fn remove(&self, id: &str) -> Result<bool, MemvaultError> {
        let removed = {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|r| r.id != id);
            records.len() != before
        };
        self.persist().await?;
        Ok(removed)
    }

    /// Look up a record by id.
    pub async fn get(&self, id: &str) -> Option<MemoryRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// All records, most-recently-added first.
    pub async fn list(&self) -> Vec<MemoryRecord> {
        self.records.read().await.clone()
    }

    /// Records matching a predicate, preserving list order.
    pub async fn filter<F>(&self, predicate: F) -> Vec<MemoryRecord>
    where
        F: Fn(&MemoryRecord) -> bool,
    {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn persist(&self) -> Result<(), MemvaultError> {
        let json = {
            let records = self.records.read().await;
            serde_json::to_string(&*records).map_err(|e| MemvaultError::Storage {
                source: Box::new(e),
            })?
        };
        self.store.save(STORE_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, JsonFileStore, NullStore};
    use chrono::Utc;
    use memvault_core::types::RecordMetadata;

    fn make_record(id: &str, owner: &str) -> MemoryRecord {
        MemoryRecord {
            id: id.to_string(),
            content: "User prefers dark mode".to_string(),
            content_type: "text/plain".to_string(),
            category: "preference".to_string(),
            tags: vec!["ui".to_string(), "preference".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            owner: owner.to_string(),
            metadata: RecordMetadata {
                size: 22,
                checksum: "abc".to_string(),
                blob_id: None,
                storage_provider: None,
            },
            explorer_url: None,
            transaction_hash: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let index = MetadataIndex::open(Arc::new(InMemoryStore::new())).await;
        index.upsert(make_record("mem-1", "agent-1")).await.unwrap();

        let record = index.get("mem-1").await.unwrap();
        assert_eq!(record.owner, "agent-1");
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn list_is_most_recently_added_first() {
        let index = MetadataIndex::open(Arc::new(InMemoryStore::new())).await;
        index.upsert(make_record("mem-1", "agent-1")).await.unwrap();
        index.upsert(make_record("mem-2", "agent-1")).await.unwrap();
        index.upsert(make_record("mem-3", "agent-1")).await.unwrap();

        let ids: Vec<String> = index.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["mem-3", "mem-2", "mem-1"]);
    }

    #[tokio::test]
    async fn upsert_existing_replaces_in_place() {
        let index = MetadataIndex::open(Arc::new(InMemoryStore::new())).await;
        index.upsert(make_record("mem-1", "agent-1")).await.unwrap();
        index.upsert(make_record("mem-2", "agent-1")).await.unwrap();

        let mut updated = make_record("mem-1", "agent-1");
        updated.transaction_hash = Some("0xtx".to_string());
        index.upsert(updated).await.unwrap();

        assert_eq!(index.len().await, 2);
        let record = index.get("mem-1").await.unwrap();
        assert_eq!(record.transaction_hash.as_deref(), Some("0xtx"));
        // Position preserved: mem-2 still newest.
        assert_eq!(index.list().await[0].id, "mem-2");
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let index = MetadataIndex::open(Arc::new(InMemoryStore::new())).await;
        index.upsert(make_record("mem-1", "agent-1")).await.unwrap();

        assert!(index.remove("mem-1").await.unwrap());
        assert!(!index.remove("mem-1").await.unwrap());
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn filter_by_owner() {
        let index = MetadataIndex::open(Arc::new(InMemoryStore::new())).await;
        index.upsert(make_record("mem-1", "agent-1")).await.unwrap();
        index.upsert(make_record("mem-2", "agent-2")).await.unwrap();

        let mine = index.filter(|r| r.owner == "agent-1").await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "mem-1");
    }

    #[tokio::test]
    async fn state_survives_reopen_with_durable_store() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = MetadataIndex::open(Arc::new(JsonFileStore::new(dir.path()))).await;
            index.upsert(make_record("mem-1", "agent-1")).await.unwrap();
        }
        let index = MetadataIndex::open(Arc::new(JsonFileStore::new(dir.path()))).await;
        assert!(index.get("mem-1").await.is_some());
    }

    #[tokio::test]
    async fn corrupt_persisted_state_starts_empty() {
        let store = Arc::new(InMemoryStore::new());
        store.save("metadata", "{not json").await.unwrap();

        let index = MetadataIndex::open(store).await;
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn null_store_degrades_to_empty_listings() {
        let index = MetadataIndex::open(Arc::new(NullStore)).await;
        // Writes are accepted no-ops against the backing store; the
        // working copy still serves reads within this session.
        index.upsert(make_record("mem-1", "agent-1")).await.unwrap();
        assert_eq!(index.len().await, 1);

        // A fresh open sees nothing, as headless contexts expect.
        let reopened = MetadataIndex::open(Arc::new(NullStore)).await;
        assert!(reopened.is_empty().await);
    }
}
