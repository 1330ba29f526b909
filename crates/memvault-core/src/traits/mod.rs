// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented by the adapter crates.
//!
//! Services are explicitly constructed and injected; no adapter is ever
//! selected by environment sniffing at a call site.

pub mod blob;
pub mod cipher;
pub mod embedding;
pub mod store;

pub use blob::BlobBackend;
pub use cipher::{Cipher, PassthroughCipher};
pub use embedding::EmbeddingProvider;
pub use store::LocalStore;
