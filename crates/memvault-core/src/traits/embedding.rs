// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::MemvaultError;

/// Generates a fixed-dimension embedding vector from text.
///
/// Implementations must return exactly [`dimension`](Self::dimension)
/// floats: shorter model output is zero-padded, longer output truncated.
/// A failed or malformed response surfaces as
/// [`MemvaultError::Embedding`] and aborts the enclosing store operation;
/// a successful store never receives a defaulted zero vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generates an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemvaultError>;

    /// The deployment's fixed vector dimension.
    fn dimension(&self) -> usize;
}
