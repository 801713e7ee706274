// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity: SHA-256 fingerprints for uploads, artifacts and keys.

use filigree_core::error::FiligreeError;
use sha2::{Digest, Sha256};

/// Domain separator mixed into key fingerprints so a key digest can never be
/// confused with a document digest.
const KEY_FINGERPRINT_CONTEXT: &[u8] = b"filigree/key-fingerprint/v1\0";

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Fingerprint of an embed key, stored alongside an artifact in place of
/// the key itself.
pub fn key_fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(KEY_FINGERPRINT_CONTEXT);
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify that `data` matches the expected SHA-256 hex digest.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), FiligreeError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(FiligreeError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
