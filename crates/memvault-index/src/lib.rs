// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local indexing tiers and the memory indexing orchestrator.
//!
//! The local tiers are authoritative for availability: a record is
//! queryable the moment `add_to_index` returns, regardless of blob or
//! ledger reachability. On-chain anchoring runs as detached background
//! work whose failures land in a persisted side table, never in the
//! ingest path.
//!
//! ## Architecture
//!
//! - **LocalStore impls**: durable JSON file store, in-memory store, and
//!   a no-op store for headless contexts
//! - **MetadataIndex**: ordered record list for listing/filtering
//! - **VectorIndex**: brute-force cosine similarity search
//! - **IndexSideTable**: per-record indexing state plus the explicit
//!   `storage_id -> memory_id` / `storage_id -> contract_hash` join maps
//! - **MemoryIndexer**: the orchestrator tying local tiers, blob storage,
//!   and the on-chain registry together

pub mod indexer;
pub mod metadata;
pub mod side_table;
pub mod store;
pub mod vector;

pub use indexer::{BatchOutcome, MemoryIndexer, OnChainOutcome, SecondaryViews};
pub use metadata::MetadataIndex;
pub use side_table::IndexSideTable;
pub use store::{InMemoryStore, JsonFileStore, NullStore};
pub use vector::{VectorIndex, cosine_similarity};
