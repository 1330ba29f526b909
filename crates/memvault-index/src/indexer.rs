// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory indexing orchestrator.
//!
//! `add_to_index` writes the local tiers synchronously and returns; blob
//! upload and the on-chain commit run as detached background work tracked
//! by a [`TaskTracker`]. A background failure is recorded in the side
//! table and left there: the orchestrator never auto-retries, callers
//! re-anchor through [`MemoryIndexer::reindex`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use memvault_blob::BlobAdapter;
use memvault_core::content_hash;
use memvault_core::types::{
    IndexStats, MemoryRecord, QueryCriteria, VectorEntry, VectorSummary,
};
use memvault_core::MemvaultError;
use memvault_ledger::{CommitRequest, SharedRegistry};
use metrics::counter;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::metadata::MetadataIndex;
use crate::side_table::IndexSideTable;
use crate::vector::VectorIndex;

const PREVIEW_CHARS: usize = 120;

/// Result of one on-chain anchoring attempt.
#[derive(Debug, Clone)]
pub struct OnChainOutcome {
    pub memory_id: String,
    pub contract_hash: String,
    pub storage_id: String,
    /// Absent when the hash was already on-chain (duplicate commit).
    pub tx_hash: Option<String>,
    pub already_indexed: bool,
}

/// Per-record result of a batch anchoring run, in input order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub memory_id: String,
    pub on_chain: bool,
    pub already_indexed: bool,
    pub tx_hash: Option<String>,
}

/// Secondary lookup views rebuilt from the metadata index.
#[derive(Debug, Clone, Default)]
pub struct SecondaryViews {
    pub by_tag: BTreeMap<String, Vec<String>>,
    pub by_content_type: BTreeMap<String, Vec<String>>,
}

/// Orchestrator over the local tiers, the blob store, and the registry.
#[derive(Clone)]
pub struct MemoryIndexer {
    metadata: Arc<MetadataIndex>,
    vectors: Arc<VectorIndex>,
    side: Arc<IndexSideTable>,
    blob: Arc<BlobAdapter>,
    registry: Arc<SharedRegistry>,
    tracker: TaskTracker,
    agent_id: String,
    explorer_base_url: String,
}

fn preview_of(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

fn matches_criteria(record: &MemoryRecord, criteria: &QueryCriteria) -> bool {
    if let Some(tag) = &criteria.tag {
        let needle = tag.to_lowercase();
        if !record
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    if let Some(content_type) = &criteria.content_type {
        if !record.content_type.eq_ignore_ascii_case(content_type) {
            return false;
        }
    }
    if let Some(agent) = &criteria.agent {
        if record.owner != *agent {
            return false;
        }
    }
    true
}

impl MemoryIndexer {
    pub fn new(
        metadata: Arc<MetadataIndex>,
        vectors: Arc<VectorIndex>,
        side: Arc<IndexSideTable>,
        blob: Arc<BlobAdapter>,
        registry: Arc<SharedRegistry>,
        agent_id: String,
        explorer_base_url: String,
    ) -> Self {
        Self {
            metadata,
            vectors,
            side,
            blob,
            registry,
            tracker: TaskTracker::new(),
            agent_id,
            explorer_base_url,
        }
    }

    fn explorer_url_for(&self, tx_hash: &str) -> String {
        format!(
            "{}/tx/{}",
            self.explorer_base_url.trim_end_matches('/'),
            tx_hash
        )
    }

    /// Index a record into the local tiers and kick off on-chain anchoring.
    ///
    /// Returns once the metadata and vector writes land; the record is
    /// queryable from that point regardless of what the background work
    /// does. Only a genuine local persistence failure propagates.
    pub async fn add_to_index(
        &self,
        record: MemoryRecord,
        vector: Vec<f32>,
    ) -> Result<(), MemvaultError> {
        let entry = VectorEntry {
            id: record.id.clone(),
            vector,
            summary: VectorSummary {
                content_type: record.content_type.clone(),
                category: record.category.clone(),
                tags: record.tags.clone(),
                preview: preview_of(&record.content),
            },
        };

        self.metadata.upsert(record.clone()).await?;
        self.vectors.upsert(entry).await?;
        counter!("memvault_memories_indexed_total").increment(1);

        // The side table is advisory; a failed status write must not undo
        // an ingest that already succeeded.
        if let Err(e) = self.side.record_pending(&record.id).await {
            warn!(memory_id = %record.id, error = %e, "failed to persist pending status");
        }

        let worker = self.clone();
        self.tracker.spawn(async move {
            worker.run_detached(record).await;
        });

        Ok(())
    }

    async fn run_detached(&self, record: MemoryRecord) {
        let memory_id = record.id.clone();
        match self.attempt_on_chain(record).await {
            Ok(outcome) => {
                counter!("memvault_on_chain_commits_total").increment(1);
                info!(
                    memory_id = %outcome.memory_id,
                    storage_id = %outcome.storage_id,
                    already_indexed = outcome.already_indexed,
                    "memory anchored on-chain"
                );
            }
            Err(e) => {
                counter!("memvault_on_chain_failures_total").increment(1);
                warn!(memory_id = %memory_id, error = %e, "on-chain anchoring failed");
                if let Err(e) = self.side.record_failed(&memory_id).await {
                    warn!(memory_id = %memory_id, error = %e, "failed to persist failed status");
                }
            }
        }
    }

    /// Record a successful commit, tolerating a storage-id collision.
    ///
    /// If the storage id already belongs to a different hash the join
    /// maps stay with their current owner, but the record is still
    /// marked committed: the ledger holds its hash, and a failure mark
    /// would invite a pointless reindex.
    async fn mark_committed(
        &self,
        memory_id: &str,
        contract_hash: &str,
        storage_id: &str,
        tx_hash: Option<String>,
    ) -> Result<(), MemvaultError> {
        match self
            .side
            .record_committed(memory_id, contract_hash, storage_id, tx_hash.clone())
            .await
        {
            Err(MemvaultError::Validation(message)) => {
                warn!(
                    memory_id = %memory_id,
                    storage_id = %storage_id,
                    %message,
                    "storage id collision, keeping commit without join mapping"
                );
                self.side
                    .record_collision(memory_id, contract_hash, tx_hash)
                    .await
            }
            other => other,
        }
    }

    /// One full anchoring attempt: ensure the content is in the blob
    /// store, then commit its hash to the registry.
    async fn attempt_on_chain(
        &self,
        mut record: MemoryRecord,
    ) -> Result<OnChainOutcome, MemvaultError> {
        if record.storage_id().is_none() {
            let receipt = self.blob.upload(record.content.as_bytes()).await?;
            record.metadata.blob_id = Some(receipt.blob_id);
            record.metadata.storage_provider = Some(receipt.provider);
            self.metadata.upsert(record.clone()).await?;
            self.side.record_blob_uploaded(&record.id).await?;
        }

        let storage_id = record
            .storage_id()
            .ok_or_else(|| {
                MemvaultError::Internal("blob upload produced no usable storage id".to_string())
            })?
            .to_string();

        let contract_hash = if record.metadata.checksum.is_empty() {
            content_hash(record.content.as_bytes())
        } else {
            record.metadata.checksum.clone()
        };

        let request = CommitRequest {
            hash: contract_hash.clone(),
            metadata: serde_json::json!({
                "category": record.category,
                "preview": preview_of(&record.content),
            })
            .to_string(),
            storage_id: storage_id.clone(),
            content_type: record.content_type.clone(),
            size_bytes: record.metadata.size,
            tags: record.tags.clone(),
        };

        let registry = self.registry.get().await;
        match registry.commit(&request).await {
            Ok(tx_hash) => {
                self.mark_committed(&record.id, &contract_hash, &storage_id, Some(tx_hash.clone()))
                    .await?;
                record.explorer_url = Some(self.explorer_url_for(&tx_hash));
                record.transaction_hash = Some(tx_hash.clone());
                self.metadata.upsert(record.clone()).await?;
                Ok(OnChainOutcome {
                    memory_id: record.id,
                    contract_hash,
                    storage_id,
                    tx_hash: Some(tx_hash),
                    already_indexed: false,
                })
            }
            Err(e) if e.is_duplicate() => {
                debug!(memory_id = %record.id, hash = %contract_hash, "hash already on-chain");
                self.mark_committed(&record.id, &contract_hash, &storage_id, None)
                    .await?;
                Ok(OnChainOutcome {
                    memory_id: record.id,
                    contract_hash,
                    storage_id,
                    tx_hash: None,
                    already_indexed: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Explicitly retry anchoring for a record, typically after a sticky
    /// `OnChainFailed`. This is the only retry path.
    pub async fn reindex(&self, memory_id: &str) -> Result<OnChainOutcome, MemvaultError> {
        let record = self.metadata.get(memory_id).await.ok_or_else(|| {
            MemvaultError::Validation(format!("unknown memory id: {memory_id}"))
        })?;
        self.side.record_pending(memory_id).await?;
        match self.attempt_on_chain(record).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(pe) = self.side.record_failed(memory_id).await {
                    warn!(memory_id, error = %pe, "failed to persist failed status");
                }
                Err(e)
            }
        }
    }

    /// Query memories, merging the local view with the on-chain view.
    ///
    /// Local filtering always runs first and is sufficient on its own:
    /// a degraded or erroring ledger reduces the result to the local set
    /// (or to nothing under `on_chain_only`), never to an error.
    pub async fn query_memories(
        &self,
        criteria: &QueryCriteria,
    ) -> Result<Vec<MemoryRecord>, MemvaultError> {
        let local = self.metadata.filter(|r| matches_criteria(r, criteria)).await;

        let registry = self.registry.get().await;
        if registry.is_degraded() {
            return Ok(if criteria.on_chain_only { Vec::new() } else { local });
        }

        let on_chain = if let Some(tag) = &criteria.tag {
            registry.query_by_tag(tag).await
        } else if let Some(content_type) = &criteria.content_type {
            registry.query_by_content_type(content_type).await
        } else if let Some(agent) = &criteria.agent {
            registry.query_by_agent(agent).await
        } else {
            registry.query_by_agent(&self.agent_id).await
        };

        let on_chain = match on_chain {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "on-chain query failed, serving local results");
                return Ok(if criteria.on_chain_only { Vec::new() } else { local });
            }
        };
        let on_chain: Vec<_> = on_chain.into_iter().filter(|e| e.is_active).collect();

        if criteria.on_chain_only {
            let results = local
                .into_iter()
                .filter(|record| {
                    on_chain.iter().any(|entry| {
                        record.storage_id() == Some(entry.storage_id.as_str())
                            || record.metadata.checksum == entry.hash
                    })
                })
                .collect();
            return Ok(results);
        }

        // Union: on-chain hits can point at local records the local filter
        // missed; join them back through the side table.
        let mut results = local;
        for entry in &on_chain {
            let Some(memory_id) = self.side.memory_for_storage(&entry.storage_id).await else {
                continue;
            };
            if results.iter().any(|r| r.id == memory_id) {
                continue;
            }
            if let Some(record) = self.metadata.get(&memory_id).await {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Verify a record's hash on the ledger.
    ///
    /// Returns `Ok(false)` without network traffic when no contract hash
    /// was ever committed; a hash is never fabricated for verification.
    pub async fn verify_memory(&self, memory_id: &str) -> Result<bool, MemvaultError> {
        let Some(contract_hash) = self.side.contract_hash_for(memory_id).await else {
            return Ok(false);
        };

        let registry = self.registry.get().await;
        registry.verify(&contract_hash).await?;
        self.side.record_verified(memory_id).await?;
        Ok(true)
    }

    /// Merged local and on-chain statistics.
    ///
    /// The on-chain section is omitted when the registry cannot report,
    /// so "zero" and "unknown" stay distinguishable.
    pub async fn get_index_stats(&self) -> Result<IndexStats, MemvaultError> {
        let records = self.metadata.list().await;
        let total_size_bytes = records.iter().map(|r| r.metadata.size).sum();

        let registry = self.registry.get().await;
        let on_chain = if registry.is_degraded() {
            None
        } else {
            match registry.stats().await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!(error = %e, "registry stats unavailable");
                    None
                }
            }
        };

        Ok(IndexStats {
            metadata_count: records.len(),
            vector_count: self.vectors.len().await,
            total_size_bytes,
            on_chain,
        })
    }

    /// Anchor a batch of records in one registry transaction.
    ///
    /// Hashes already on-chain are pre-checked and skipped as
    /// already-indexed; a duplicate rejection of the whole batch falls
    /// back to individual commits so one stale entry cannot block the
    /// rest. Outcomes come back in input order.
    pub async fn batch_index_on_chain(
        &self,
        records: &[MemoryRecord],
    ) -> Result<Vec<BatchOutcome>, MemvaultError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let registry = self.registry.get().await;
        if records.len() > registry.max_batch_size() {
            return Err(MemvaultError::Validation(format!(
                "batch of {} records exceeds the maximum of {}",
                records.len(),
                registry.max_batch_size()
            )));
        }

        let mut outcomes: Vec<Option<BatchOutcome>> = vec![None; records.len()];
        // (input position, request, memory_id) for records still to commit.
        let mut pending: Vec<(usize, CommitRequest, String)> = Vec::new();

        for (position, record) in records.iter().enumerate() {
            let mut record = record.clone();
            if record.storage_id().is_none() {
                let receipt = self.blob.upload(record.content.as_bytes()).await?;
                record.metadata.blob_id = Some(receipt.blob_id);
                record.metadata.storage_provider = Some(receipt.provider);
                self.metadata.upsert(record.clone()).await?;
                self.side.record_blob_uploaded(&record.id).await?;
            }
            let storage_id = record
                .storage_id()
                .ok_or_else(|| {
                    MemvaultError::Internal(
                        "blob upload produced no usable storage id".to_string(),
                    )
                })?
                .to_string();

            let contract_hash = if record.metadata.checksum.is_empty() {
                content_hash(record.content.as_bytes())
            } else {
                record.metadata.checksum.clone()
            };

            if registry.has_hash(&contract_hash).await.unwrap_or(false) {
                self.mark_committed(&record.id, &contract_hash, &storage_id, None)
                    .await?;
                outcomes[position] = Some(BatchOutcome {
                    memory_id: record.id.clone(),
                    on_chain: true,
                    already_indexed: true,
                    tx_hash: None,
                });
                continue;
            }

            pending.push((
                position,
                CommitRequest {
                    hash: contract_hash,
                    metadata: serde_json::json!({"category": record.category}).to_string(),
                    storage_id,
                    content_type: record.content_type.clone(),
                    size_bytes: record.metadata.size,
                    tags: record.tags.clone(),
                },
                record.id.clone(),
            ));
        }

        if !pending.is_empty() {
            let requests: Vec<CommitRequest> =
                pending.iter().map(|(_, req, _)| req.clone()).collect();
            match registry.batch_commit(&requests).await {
                Ok(tx_hash) => {
                    for (position, request, memory_id) in &pending {
                        self.mark_committed(
                            memory_id,
                            &request.hash,
                            &request.storage_id,
                            Some(tx_hash.clone()),
                        )
                        .await?;
                        outcomes[*position] = Some(BatchOutcome {
                            memory_id: memory_id.clone(),
                            on_chain: true,
                            already_indexed: false,
                            tx_hash: Some(tx_hash.clone()),
                        });
                    }
                }
                Err(e) if e.is_duplicate() => {
                    debug!("batch rejected as duplicate, retrying individually");
                    for (position, request, memory_id) in &pending {
                        let outcome = match registry.commit(request).await {
                            Ok(tx_hash) => {
                                self.mark_committed(
                                    memory_id,
                                    &request.hash,
                                    &request.storage_id,
                                    Some(tx_hash.clone()),
                                )
                                .await?;
                                BatchOutcome {
                                    memory_id: memory_id.clone(),
                                    on_chain: true,
                                    already_indexed: false,
                                    tx_hash: Some(tx_hash),
                                }
                            }
                            Err(e) if e.is_duplicate() => {
                                self.mark_committed(
                                    memory_id,
                                    &request.hash,
                                    &request.storage_id,
                                    None,
                                )
                                .await?;
                                BatchOutcome {
                                    memory_id: memory_id.clone(),
                                    on_chain: true,
                                    already_indexed: true,
                                    tx_hash: None,
                                }
                            }
                            Err(e) => {
                                warn!(memory_id = %memory_id, error = %e, "individual commit failed");
                                self.side.record_failed(memory_id).await?;
                                BatchOutcome {
                                    memory_id: memory_id.clone(),
                                    on_chain: false,
                                    already_indexed: false,
                                    tx_hash: None,
                                }
                            }
                        };
                        outcomes[*position] = Some(outcome);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "batch commit failed");
                    for (position, _, memory_id) in &pending {
                        self.side.record_failed(memory_id).await?;
                        outcomes[*position] = Some(BatchOutcome {
                            memory_id: memory_id.clone(),
                            on_chain: false,
                            already_indexed: false,
                            tx_hash: None,
                        });
                    }
                }
            }
        }

        Ok(outcomes.into_iter().flatten().collect())
    }

    /// All tags, merging the local and on-chain sets, sorted.
    pub async fn get_all_tags(&self) -> Result<Vec<String>, MemvaultError> {
        let mut tags: BTreeSet<String> = BTreeSet::new();
        for record in self.metadata.list().await {
            tags.extend(record.tags);
        }

        let registry = self.registry.get().await;
        match registry.list_tags().await {
            Ok(remote) => tags.extend(remote),
            Err(e) => warn!(error = %e, "on-chain tag listing unavailable"),
        }

        Ok(tags.into_iter().collect())
    }

    /// Remove a record from every local tier. Returns whether anything
    /// was removed. On-chain state is untouched; use
    /// [`revoke_on_chain`](Self::revoke_on_chain) for that.
    pub async fn remove_from_index(&self, memory_id: &str) -> Result<bool, MemvaultError> {
        let metadata_removed = self.metadata.remove(memory_id).await?;
        let vectors_removed = self.vectors.remove(memory_id).await?;
        self.side.remove(memory_id).await?;
        Ok(metadata_removed || vectors_removed)
    }

    /// Deactivate a record's hash on the ledger. Fails when the record
    /// was never committed; revocation needs a real contract hash.
    pub async fn revoke_on_chain(&self, memory_id: &str) -> Result<(), MemvaultError> {
        let contract_hash = self.side.contract_hash_for(memory_id).await.ok_or_else(|| {
            MemvaultError::Validation(format!(
                "memory {memory_id} has no on-chain commitment to revoke"
            ))
        })?;

        let registry = self.registry.get().await;
        registry.revoke(&contract_hash).await?;
        self.side.record_revoked(memory_id).await
    }

    /// Rebuild the tag and content-type lookup views from the metadata
    /// index. Derived data only; safe to call at any time.
    pub async fn rebuild_secondary_views(&self) -> SecondaryViews {
        let mut views = SecondaryViews::default();
        for record in self.metadata.list().await {
            for tag in &record.tags {
                views
                    .by_tag
                    .entry(tag.clone())
                    .or_default()
                    .push(record.id.clone());
            }
            views
                .by_content_type
                .entry(record.content_type.clone())
                .or_default()
                .push(record.id.clone());
        }
        views
    }

    /// Stop accepting background work and wait for in-flight anchoring
    /// tasks to finish.
    pub async fn close(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn metadata(&self) -> &Arc<MetadataIndex> {
        &self.metadata
    }

    pub fn vectors(&self) -> &Arc<VectorIndex> {
        &self.vectors
    }

    pub fn side_table(&self) -> &Arc<IndexSideTable> {
        &self.side
    }

    pub fn registry(&self) -> &Arc<SharedRegistry> {
        &self.registry
    }

    pub fn blob(&self) -> &Arc<BlobAdapter> {
        &self.blob
    }
}
