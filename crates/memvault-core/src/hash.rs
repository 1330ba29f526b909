// SPDX-FileCopyrightText: 2026 Memvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic SHA-256 content hashing.
//!
//! The same hash doubles as the integrity checksum stored on each record
//! and as the on-chain content key, so it must be stable across runs and
//! processes. No randomness, no locale dependence.

use sha2::{Digest, Sha256};

use crate::error::MemvaultError;

/// Compute the lowercase-hex SHA-256 digest of `content`.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Verify `content` against a previously stored checksum.
///
/// A mismatch is an [`MemvaultError::Integrity`] failure and means the
/// blob tier returned something other than what was stored.
pub fn verify_content(content: &[u8], expected: &str) -> Result<(), MemvaultError> {
    let actual = content_hash(content);
    if actual == expected {
        Ok(())
    } else {
        Err(MemvaultError::Integrity {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let content = b"User prefers dark mode";
        assert_eq!(content_hash(content), content_hash(content));
    }

    #[test]
    fn hash_matches_known_vector() {
        // SHA-256 of the empty string, a fixed reference value.
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_is_lowercase_hex_64_chars() {
        let digest = content_hash(b"hello");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
    }

    #[test]
    fn verify_accepts_matching_checksum() {
        let content = b"memory body";
        let checksum = content_hash(content);
        assert!(verify_content(content, &checksum).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_content() {
        let checksum = content_hash(b"original");
        let err = verify_content(b"tampered", &checksum).unwrap_err();
        match err {
            MemvaultError::Integrity { expected, actual } => {
                assert_eq!(expected, checksum);
                assert_ne!(actual, checksum);
            }
            other => panic!("expected Integrity error, got {other:?}"),
        }
    }
}
