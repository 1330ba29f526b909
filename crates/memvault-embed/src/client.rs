// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the embedding inference API.
//!
//! Provides [`HttpEmbedder`], which posts text to a configurable endpoint
//! and returns a vector of exactly the configured dimension.

use std::time::Duration;

use async_trait::async_trait;
use memvault_config::model::EmbeddingConfig;
use memvault_core::{EmbeddingProvider, MemvaultError};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request body for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Response body from the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// HTTP embedding client.
///
/// Failures (provider unreachable, rate-limited, malformed output) are
/// [`MemvaultError::Embedding`] and abort the store operation that asked
/// for the vector; the engine never substitutes a zero vector for a
/// successful store.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    /// Creates a new embedding client from configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, MemvaultError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| MemvaultError::Config(format!("invalid embedding API key: {e}")))?;
            headers.insert("authorization", value);
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MemvaultError::Embedding {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemvaultError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| MemvaultError::Embedding {
                message: format!("embedding request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemvaultError::Embedding {
                message: format!("embedding API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: EmbeddingResponse =
            response.json().await.map_err(|e| MemvaultError::Embedding {
                message: format!("malformed embedding response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| MemvaultError::Embedding {
                message: "embedding response contained no vectors".to_string(),
                source: None,
            })?;

        if vector.is_empty() {
            return Err(MemvaultError::Embedding {
                message: "embedding response contained an empty vector".to_string(),
                source: None,
            });
        }

        Ok(normalize_dimension(vector, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Force a vector to exactly `dimension` entries.
///
/// Shorter vectors are zero-padded, longer vectors truncated. This is a
/// documented, deterministic simplification to keep the index uniform; it
/// makes no semantic claim about truncated embeddings.
fn normalize_dimension(mut vector: Vec<f32>, dimension: usize) -> Vec<f32> {
    if vector.len() != dimension {
        debug!(
            got = vector.len(),
            want = dimension,
            "normalizing embedding dimension"
        );
        vector.resize(dimension, 0.0);
    }
    vector
}
