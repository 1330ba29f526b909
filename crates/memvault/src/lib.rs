// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memvault: a local-first memory indexing and verification engine.
//!
//! Four tiers cooperate behind one facade: a local metadata index, a
//! local vector index, a content-addressed blob store, and an on-chain
//! hash registry. The local tiers are authoritative for availability; the
//! blob and ledger tiers add durability and cross-agent verifiability,
//! eventually. Every network dependency degrades gracefully: an engine
//! with no reachable network at all still stores, recalls, and queries.
//!
//! ```no_run
//! use memvault::Memvault;
//!
//! # async fn demo() -> Result<(), memvault::MemvaultError> {
//! let config = memvault::load_config().map_err(|e| memvault::MemvaultError::Config(e.to_string()))?;
//! let vault = Memvault::from_config(config).await?;
//!
//! let record = vault
//!     .remember("User prefers dark mode", "text/plain", "preference", vec!["ui".into()])
//!     .await?;
//! let hits = vault.recall("what theme does the user like?", 5).await?;
//! # let _ = (record, hits);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;
use memvault_blob::BlobAdapter;
use memvault_core::types::RecordMetadata;
use memvault_embed::HttpEmbedder;
use memvault_index::{
    IndexSideTable, InMemoryStore, JsonFileStore, MemoryIndexer, MetadataIndex, VectorIndex,
};
use memvault_ledger::SharedRegistry;
use tracing::info;
use uuid::Uuid;

pub use memvault_config::loader::{load_config, load_config_from_path, load_config_from_str};
pub use memvault_config::model::MemvaultConfig;
pub use memvault_core::types::{
    IndexConfigEntry, IndexStats, IndexStatus, MemoryRecord, QueryCriteria, ScoredSummary,
};
pub use memvault_core::{
    Cipher, EmbeddingProvider, LocalStore, MemvaultError, PassthroughCipher, content_hash,
    verify_content,
};
pub use memvault_index::indexer::{BatchOutcome, OnChainOutcome};

pub mod telemetry;

/// The assembled memory engine.
pub struct Memvault {
    config: MemvaultConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    cipher: Arc<dyn Cipher>,
    indexer: MemoryIndexer,
}

impl Memvault {
    /// Assemble the engine from configuration.
    ///
    /// Probes the blob networks up front; the ledger connects lazily on
    /// first use. Construction only fails on local problems (bad config,
    /// unbuildable HTTP client), never on unreachable networks.
    pub async fn from_config(config: MemvaultConfig) -> Result<Self, MemvaultError> {
        let embedder = Arc::new(HttpEmbedder::new(&config.embedding)?);
        let blob = Arc::new(BlobAdapter::connect(&config.blob).await);
        let registry = Arc::new(SharedRegistry::new(
            config.ledger.clone(),
            config.agent.agent_id.clone(),
        ));

        // The storage decision is made once, here: explicit data dir, then
        // the platform data dir, then in-memory as the last resort.
        let store: Arc<dyn LocalStore> = match config
            .index
            .data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("memvault")))
        {
            Some(dir) => {
                info!(dir = %dir.display(), "using durable index storage");
                Arc::new(JsonFileStore::new(dir))
            }
            None => {
                info!("no data directory available, index state is in-memory");
                Arc::new(InMemoryStore::new())
            }
        };

        let indexer = MemoryIndexer::new(
            Arc::new(MetadataIndex::open(Arc::clone(&store)).await),
            Arc::new(VectorIndex::open(Arc::clone(&store)).await),
            Arc::new(IndexSideTable::open(Arc::clone(&store)).await),
            blob,
            registry,
            config.agent.agent_id.clone(),
            config.ledger.explorer_base_url.clone(),
        );

        Ok(Self {
            config,
            embedder,
            cipher: Arc::new(PassthroughCipher),
            indexer,
        })
    }

    /// Replace the content cipher. The default passes content through
    /// unchanged; callers owning key material install their own.
    pub fn with_cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    /// Store a memory: embed, seal, checksum, and index it.
    ///
    /// The returned record is the locally-indexed snapshot; transaction
    /// and explorer fields fill in later as background anchoring lands.
    /// An embedding failure aborts the store, a zero vector is never
    /// substituted for a real one.
    pub async fn remember(
        &self,
        content: &str,
        content_type: &str,
        category: &str,
        tags: Vec<String>,
    ) -> Result<MemoryRecord, MemvaultError> {
        let vector = self.embedder.embed(content).await?;
        let sealed = self.cipher.encrypt(content)?;

        let now = Utc::now();
        let record = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            content_type: content_type.to_string(),
            category: category.to_string(),
            tags,
            created_at: now,
            updated_at: now,
            owner: self.config.agent.agent_id.clone(),
            metadata: RecordMetadata {
                size: sealed.len() as u64,
                checksum: content_hash(sealed.as_bytes()),
                blob_id: None,
                storage_provider: None,
            },
            content: sealed,
            explorer_url: None,
            transaction_hash: None,
        };

        self.indexer.add_to_index(record.clone(), vector).await?;
        Ok(record)
    }

    /// Similarity search over stored memories.
    ///
    /// `top_k` is capped at the configured maximum result count.
    pub async fn recall(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredSummary>, MemvaultError> {
        let vector = self.embedder.embed(query).await?;
        let top_k = top_k.min(self.config.index.max_results);
        Ok(self
            .indexer
            .vectors()
            .search_by_similarity(&vector, top_k)
            .await)
    }

    /// Retrieve and unseal a memory's content.
    ///
    /// Content that made it to the blob store is fetched from the backend
    /// that holds it and integrity-checked against the recorded checksum
    /// before decryption; content that never left the local tier is
    /// served from the record itself.
    pub async fn fetch_content(&self, memory_id: &str) -> Result<String, MemvaultError> {
        let record = self.indexer.metadata().get(memory_id).await.ok_or_else(|| {
            MemvaultError::Validation(format!("unknown memory id: {memory_id}"))
        })?;

        let sealed = match (record.storage_id(), record.metadata.storage_provider.as_deref()) {
            (Some(blob_id), Some(provider)) => {
                let bytes = self.indexer.blob().download(provider, blob_id).await?;
                verify_content(&bytes, &record.metadata.checksum)?;
                String::from_utf8(bytes).map_err(|e| {
                    MemvaultError::Internal(format!("blob content is not valid UTF-8: {e}"))
                })?
            }
            _ => record.content.clone(),
        };

        self.cipher.decrypt(&sealed)
    }

    /// Query memories by tag, content type, agent, or on-chain presence.
    pub async fn query_memories(
        &self,
        criteria: &QueryCriteria,
    ) -> Result<Vec<MemoryRecord>, MemvaultError> {
        self.indexer.query_memories(criteria).await
    }

    /// Verify a memory's committed hash on the ledger. `Ok(false)` when
    /// it was never committed.
    pub async fn verify_memory(&self, memory_id: &str) -> Result<bool, MemvaultError> {
        self.indexer.verify_memory(memory_id).await
    }

    /// Merged local and on-chain statistics.
    pub async fn get_index_stats(&self) -> Result<IndexStats, MemvaultError> {
        self.indexer.get_index_stats().await
    }

    /// All known tags across the local and on-chain views.
    pub async fn get_all_tags(&self) -> Result<Vec<String>, MemvaultError> {
        self.indexer.get_all_tags().await
    }

    /// Remove a memory from the local tiers.
    pub async fn forget(&self, memory_id: &str) -> Result<bool, MemvaultError> {
        self.indexer.remove_from_index(memory_id).await
    }

    /// Drain in-flight background anchoring work.
    pub async fn close(&self) {
        self.indexer.close().await;
    }

    /// The underlying orchestrator, for batch anchoring, reindexing,
    /// revocation, and direct tier access.
    pub fn indexer(&self) -> &MemoryIndexer {
        &self.indexer
    }

    pub fn config(&self) -> &MemvaultConfig {
        &self.config
    }
}
