// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC 2.0 envelope types and registry error codes.

use serde::{Deserialize, Serialize};

/// Registry error code: commit rejected, hash already exists.
pub const CODE_DUPLICATE_HASH: i64 = -32010;
/// Registry error code: revoke attempted by a non-committing agent.
pub const CODE_NOT_COMMITTER: i64 = -32011;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response. `result` stays raw JSON so callers can decode
/// null/absent results into `Option` without a second envelope type.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

/// The error member of a JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    /// Registry nodes echo the offending content hash here for commit
    /// rejections.
    #[serde(default)]
    pub data: Option<String>,
}
