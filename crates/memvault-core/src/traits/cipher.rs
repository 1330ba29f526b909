// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption collaborator seam.
//!
//! Key derivation and the cipher itself live outside this engine; content
//! is opaque by the time it reaches the blob tier. The trait exists so the
//! facade can seal content before storage without this crate knowing how.

use crate::error::MemvaultError;

/// Opaque encrypt/decrypt collaborator.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, MemvaultError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, MemvaultError>;
}

/// Identity cipher for deployments that store plaintext.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCipher;

impl Cipher for PassthroughCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, MemvaultError> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, MemvaultError> {
        Ok(ciphertext.to_string())
    }
}
