// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed blob storage for the Memvault memory engine.
//!
//! Two interchangeable HTTP backends sit behind one adapter: a primary
//! erasure-coded mesh network and a fallback chain-oriented store. Uploads
//! try the primary and fall back transparently; downloads resolve through
//! the backend recorded in the upload receipt, because blob ids are
//! backend-scoped.

mod adapter;
mod chain_store;
mod mesh;

pub use adapter::BlobAdapter;
pub use chain_store::ChainStoreBackend;
pub use mesh::MeshBackend;
