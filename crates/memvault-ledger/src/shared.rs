// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy, memoized, shared registry initialization.
//!
//! Ledger initialization involves a network probe that can take up to the
//! connect timeout, so concurrent first callers must share one in-flight
//! attempt rather than racing to reinitialize. The guard here is the only
//! path that constructs a [`RegistryClient`]; reinitialization after a
//! degraded start is an explicit call, never implicit.

use std::sync::Arc;

use memvault_config::model::LedgerConfig;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::client::RegistryClient;

/// Shared handle to the process-wide registry client.
pub struct SharedRegistry {
    config: LedgerConfig,
    agent_id: String,
    /// Serializes initialization so only one connect attempt is in flight.
    init: Mutex<()>,
    current: RwLock<Option<Arc<RegistryClient>>>,
}

impl SharedRegistry {
    /// Create an uninitialized handle. No network traffic until `get`.
    pub fn new(config: LedgerConfig, agent_id: String) -> Self {
        Self {
            config,
            agent_id,
            init: Mutex::new(()),
            current: RwLock::new(None),
        }
    }

    /// Return the registry client, connecting on first use.
    ///
    /// Concurrent callers during the first connect all wait on the same
    /// attempt and receive the same client.
    pub async fn get(&self) -> Arc<RegistryClient> {
        if let Some(client) = self.current.read().await.as_ref() {
            return Arc::clone(client);
        }

        let _guard = self.init.lock().await;
        // A concurrent caller may have finished while we waited for the lock.
        if let Some(client) = self.current.read().await.as_ref() {
            return Arc::clone(client);
        }

        let client = Arc::new(RegistryClient::connect(&self.config, &self.agent_id).await);
        *self.current.write().await = Some(Arc::clone(&client));
        client
    }

    /// Discard the current client and connect again.
    ///
    /// The only way out of degraded mode; callers opt into the retry.
    pub async fn reinitialize(&self) -> Arc<RegistryClient> {
        let _guard = self.init.lock().await;
        info!("reinitializing registry client");
        let client = Arc::new(RegistryClient::connect(&self.config, &self.agent_id).await);
        *self.current.write().await = Some(Arc::clone(&client));
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degraded_config() -> LedgerConfig {
        LedgerConfig {
            enabled: true,
            rpc_url: "http://127.0.0.1:1".to_string(),
            contract_address: "0xregistry".to_string(),
            explorer_base_url: "http://explorer.test".to_string(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
            max_batch_size: 50,
        }
    }

    #[tokio::test]
    async fn get_memoizes_one_client() {
        let shared = SharedRegistry::new(degraded_config(), "agent-1".to_string());
        let first = shared.get().await;
        let second = shared.get().await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_init() {
        let shared = Arc::new(SharedRegistry::new(degraded_config(), "agent-1".to_string()));

        let a = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.get().await })
        };
        let b = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.get().await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn reinitialize_replaces_the_client() {
        let shared = SharedRegistry::new(degraded_config(), "agent-1".to_string());
        let first = shared.get().await;
        assert!(first.is_degraded());

        let second = shared.reinitialize().await;
        assert!(!Arc::ptr_eq(&first, &second));

        // Subsequent gets return the reinitialized client.
        let third = shared.get().await;
        assert!(Arc::ptr_eq(&second, &third));
    }
}
