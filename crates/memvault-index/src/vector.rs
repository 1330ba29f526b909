// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local vector index: persisted embeddings with brute-force cosine
//! similarity search.
//!
//! Ranking is a full scan plus sort. That is a documented scaling limit,
//! not an oversight: the expected corpus is hundreds to low thousands of
//! entries, where a scan beats the bookkeeping of an approximate
//! structure.

use std::sync::Arc;

use memvault_core::types::{ScoredSummary, VectorEntry};
use memvault_core::{LocalStore, MemvaultError};
use tokio::sync::RwLock;
use tracing::warn;

const STORE_KEY: &str = "vectors";

/// Compute cosine similarity between two vectors.
///
/// Defined as 0.0 when the vectors differ in length or either has zero
/// norm: such pairs are non-comparable, not an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Persisted list of `(id, vector, summary)` entries, keyed by the same
/// id as the metadata index.
pub struct VectorIndex {
    store: Arc<dyn LocalStore>,
    entries: RwLock<Vec<VectorEntry>>,
}

impl VectorIndex {
    /// Open the index, loading any persisted state. Corrupt state is
    /// logged and treated as empty.
    pub async fn open(store: Arc<dyn LocalStore>) -> Self {
        let entries = match store.load(STORE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "corrupt vector entry, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "vector entry unreadable, starting empty");
                Vec::new()
            }
        };
        Self {
            store,
            entries: RwLock::new(entries),
        }
    }

    /// Insert or replace the entry for an id.
    pub async fn upsert(&self, entry: VectorEntry) -> Result<(), MemvaultError> {
        {
            let mut entries = self.entries.write().await;
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        self.persist().await
    }

    /// Remove the entry for an id. Returns whether it was present.
    pub async fn remove(&self, id: &str) -> Result<bool, MemvaultError> {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|e| e.id != id);
            entries.len() != before
        };
        self.persist().await?;
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Raw entries, for diagnostics.
    pub async fn entries(&self) -> Vec<VectorEntry> {
        self.entries.read().await.clone()
    }

    /// Top `top_k` entries ranked by cosine similarity to `query`.
    ///
    /// Full scan and sort; non-comparable entries score 0.0 and sink to
    /// the bottom rather than erroring.
    pub async fn search_by_similarity(&self, query: &[f32], top_k: usize) -> Vec<ScoredSummary> {
        let entries = self.entries.read().await;
        let mut scored: Vec<ScoredSummary> = entries
            .iter()
            .map(|entry| ScoredSummary {
                id: entry.id.clone(),
                score: cosine_similarity(query, &entry.vector),
                summary: entry.summary.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    async fn persist(&self) -> Result<(), MemvaultError> {
        let json = {
            let entries = self.entries.read().await;
            serde_json::to_string(&*entries).map_err(|e| MemvaultError::Storage {
                source: Box::new(e),
            })?
        };
        self.store.save(STORE_KEY, &json).await
    }
}
