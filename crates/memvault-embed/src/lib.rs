// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding provider for the Memvault memory engine.
//!
//! Wraps an external inference API behind the [`EmbeddingProvider`] trait
//! and normalizes model output to the deployment's fixed dimension.
//!
//! [`EmbeddingProvider`]: memvault_core::EmbeddingProvider

mod client;

pub use client::HttpEmbedder;
