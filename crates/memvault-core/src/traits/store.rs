// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local key-value store trait backing the persisted indices.

use async_trait::async_trait;

use crate::error::MemvaultError;

/// A key-value store for JSON-serialized index state.
///
/// The engine persists exactly three entries: the metadata list, the
/// vector list, and the index-config side table. Implementations are
/// selected at construction (durable file store, in-memory store, or a
/// no-op store for headless contexts), never by ad hoc environment
/// checks at call sites.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Load the JSON value stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, MemvaultError>;

    /// Persist `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> Result<(), MemvaultError>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), MemvaultError>;
}
