// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LocalStore implementations.
//!
//! The engine persists three JSON entries (metadata list, vector list,
//! index-config side table) through the [`LocalStore`] trait. Which
//! implementation backs them is decided once, at construction: a durable
//! file store when a data directory is available, an in-memory store for
//! ephemeral sessions, or a no-op store for headless contexts where
//! nothing should persist.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use memvault_core::{LocalStore, MemvaultError};
use tokio::sync::RwLock;

fn io_err(e: std::io::Error) -> MemvaultError {
    MemvaultError::Storage {
        source: Box::new(e),
    }
}

/// Durable file-backed store. Each key maps to `<dir>/<key>.json`,
/// written atomically via a temp file and rename.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl LocalStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<String>, MemvaultError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(e)),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), MemvaultError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, value).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, self.path_for(key))
            .await
            .map_err(io_err)
    }

    async fn remove(&self, key: &str) -> Result<(), MemvaultError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }
}

/// In-memory store for ephemeral sessions and tests.
#[derive(Default)]
pub struct InMemoryStore {
    map: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, MemvaultError> {
        Ok(self.map.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), MemvaultError> {
        self.map
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MemvaultError> {
        self.map.write().await.remove(key);
        Ok(())
    }
}

/// No-op store for headless contexts with no session storage.
///
/// Writes are accepted and discarded, reads come back empty. The indices
/// above this degrade to empty listings rather than erroring, by design.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

#[async_trait]
impl LocalStore for NullStore {
    async fn load(&self, _key: &str) -> Result<Option<String>, MemvaultError> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _value: &str) -> Result<(), MemvaultError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), MemvaultError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.load("metadata").await.unwrap().is_none());
        store.save("metadata", r#"[{"id":"mem-1"}]"#).await.unwrap();
        assert_eq!(
            store.load("metadata").await.unwrap().as_deref(),
            Some(r#"[{"id":"mem-1"}]"#)
        );
    }

    #[tokio::test]
    async fn json_file_store_save_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("vectors", "[1]").await.unwrap();
        store.save("vectors", "[1,2]").await.unwrap();
        assert_eq!(store.load("vectors").await.unwrap().as_deref(), Some("[1,2]"));

        // No temp file left behind after the atomic rename.
        let leftover = dir.path().join("vectors.json.tmp");
        assert!(!leftover.exists());
    }

    #[tokio::test]
    async fn json_file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("metadata", "[]").await.unwrap();
        store.remove("metadata").await.unwrap();
        store.remove("metadata").await.unwrap();
        assert!(store.load("metadata").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::new(dir.path());
            store.save("metadata", "persisted").await.unwrap();
        }
        let store = JsonFileStore::new(dir.path());
        assert_eq!(
            store.load("metadata").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemoryStore::new();
        store.save("k", "v").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some("v"));
        store.remove("k").await.unwrap();
        assert!(store.load("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_store_accepts_writes_and_reads_empty() {
        let store = NullStore;
        store.save("k", "v").await.unwrap();
        assert!(store.load("k").await.unwrap().is_none());
        store.remove("k").await.unwrap();
    }
}
