// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-chain registry client for the Memvault memory engine.
//!
//! Talks JSON-RPC to an append-only memory-hash registry contract. The
//! client is usable in a sticky degraded mode: if the ledger is
//! unreachable at initialization, writes return tagged failures and reads
//! return empty results for the lifetime of the client, and the rest of
//! the engine keeps functioning on local tiers. Reinitialization is an
//! explicit operation on [`SharedRegistry`].

mod client;
mod rpc;
mod shared;

pub use client::{CommitRequest, RegistryClient};
pub use shared::SharedRegistry;
