// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the assembled engine.
//!
//! The embedding provider is always mocked; blob and ledger networks are
//! either mocked or deliberately pointed at dead endpoints to exercise
//! the local-first guarantees.

use memvault::{IndexStatus, Memvault, MemvaultConfig, MemvaultError, QueryCriteria};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENT: &str = "User prefers dark mode";

/// Embedding endpoint that returns a fixed 3-dimensional vector.
async fn embedding_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [1.0, 0.0, 0.0]}]
        })))
        .mount(&server)
        .await;
    server
}

fn offline_config(embed_uri: String, data_dir: &std::path::Path) -> MemvaultConfig {
    let mut config = MemvaultConfig::default();
    config.agent.agent_id = "agent-1".to_string();
    config.embedding.endpoint = format!("{embed_uri}/embed");
    config.embedding.dimension = 3;
    // Dead endpoints: probes fail fast with refused connections.
    config.blob.mesh_endpoints = vec!["http://127.0.0.1:1".to_string()];
    config.blob.chain_store_endpoints = vec!["http://127.0.0.1:1".to_string()];
    config.blob.probe_timeout_secs = 1;
    config.ledger.rpc_url = "http://127.0.0.1:1".to_string();
    config.ledger.connect_timeout_secs = 1;
    config.ledger.request_timeout_secs = 1;
    config.index.data_dir = Some(data_dir.to_path_buf());
    config
}

#[tokio::test]
async fn remember_and_recall_work_with_every_network_down() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();
    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();

    let record = vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into(), "preference".into()])
        .await
        .unwrap();
    assert_eq!(record.owner, "agent-1");
    assert!(record.transaction_hash.is_none());

    let hits = vault.recall("what theme does the user like?", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, record.id);
    assert_eq!(hits[0].summary.preview, CONTENT);

    // Background anchoring had nowhere to go; the failure is recorded,
    // the memory stays available.
    vault.close().await;
    let entry = vault.indexer().side_table().entry(&record.id).await;
    assert_eq!(entry.status, IndexStatus::OnChainFailed);
    assert!(vault.indexer().metadata().get(&record.id).await.is_some());
}

#[tokio::test]
async fn query_by_tag_serves_local_results_offline() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();
    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();

    let record = vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
        .await
        .unwrap();
    vault
        .remember("Invoice day is the 3rd", "text/plain", "billing", vec!["billing".into()])
        .await
        .unwrap();
    vault.close().await;

    let hits = vault
        .query_memories(&QueryCriteria {
            tag: Some("UI".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, record.id);
}

#[tokio::test]
async fn fetch_content_round_trips_local_content() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();
    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();

    let record = vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
        .await
        .unwrap();
    vault.close().await;

    // Never reached the blob store, so this serves the local copy.
    assert_eq!(vault.fetch_content(&record.id).await.unwrap(), CONTENT);

    let err = vault.fetch_content("no-such-id").await.unwrap_err();
    assert!(matches!(err, MemvaultError::Validation(_)));
}

#[tokio::test]
async fn anchoring_pipeline_fills_in_transaction_metadata() {
    let embed = embedding_server().await;
    let mesh = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mesh)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/blobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "root_hash": "0xroot",
            "size": CONTENT.len()
        })))
        .mount(&mesh)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/blobs/0xroot"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(CONTENT.as_bytes().to_vec()))
        .mount(&mesh)
        .await;

    let ledger = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "registry_stats"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1,
            "result": {"total": 0, "active": 0, "verified": 0, "total_tags": 0, "total_size_bytes": 0}
        })))
        .mount(&ledger)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "registry_commit"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 2, "result": "0xtxref"
        })))
        .mount(&ledger)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = offline_config(embed.uri(), dir.path());
    config.blob.mesh_endpoints = vec![mesh.uri()];
    config.ledger.rpc_url = ledger.uri();
    config.ledger.explorer_base_url = "http://explorer.test".to_string();

    let vault = Memvault::from_config(config).await.unwrap();
    let record = vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
        .await
        .unwrap();
    vault.close().await;

    let anchored = vault.indexer().metadata().get(&record.id).await.unwrap();
    assert_eq!(anchored.metadata.blob_id.as_deref(), Some("0xroot"));
    assert_eq!(anchored.metadata.storage_provider.as_deref(), Some("mesh"));
    assert_eq!(anchored.transaction_hash.as_deref(), Some("0xtxref"));
    assert_eq!(
        anchored.explorer_url.as_deref(),
        Some("http://explorer.test/tx/0xtxref")
    );
    assert_eq!(
        vault.indexer().side_table().entry(&record.id).await.status,
        IndexStatus::OnChainCommitted
    );

    // Content now comes off the blob store, integrity-checked.
    assert_eq!(vault.fetch_content(&record.id).await.unwrap(), CONTENT);
}

#[tokio::test]
async fn verify_memory_is_false_without_a_commitment() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();
    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();

    let record = vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
        .await
        .unwrap();
    vault.close().await;

    assert!(!vault.verify_memory(&record.id).await.unwrap());
}

#[tokio::test]
async fn stats_omit_on_chain_section_when_ledger_unreachable() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();
    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();

    vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
        .await
        .unwrap();
    vault.close().await;

    let stats = vault.get_index_stats().await.unwrap();
    assert_eq!(stats.metadata_count, 1);
    assert_eq!(stats.vector_count, 1);
    assert_eq!(stats.total_size_bytes, CONTENT.len() as u64);
    assert!(stats.on_chain.is_none());
}

#[tokio::test]
async fn forget_removes_the_memory_from_local_tiers() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();
    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();

    let record = vault
        .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
        .await
        .unwrap();
    vault.close().await;

    assert!(vault.forget(&record.id).await.unwrap());
    assert!(vault.recall("anything", 5).await.unwrap().is_empty());
    assert!(!vault.forget(&record.id).await.unwrap());
}

#[tokio::test]
async fn index_state_survives_engine_restart() {
    let embed = embedding_server().await;
    let dir = tempfile::tempdir().unwrap();

    let record_id = {
        let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
            .await
            .unwrap();
        let record = vault
            .remember(CONTENT, "text/plain", "preference", vec!["ui".into()])
            .await
            .unwrap();
        vault.close().await;
        record.id
    };

    let vault = Memvault::from_config(offline_config(embed.uri(), dir.path()))
        .await
        .unwrap();
    assert!(vault.indexer().metadata().get(&record_id).await.is_some());
    let hits = vault.recall("theme", 5).await.unwrap();
    assert_eq!(hits[0].id, record_id);
}
