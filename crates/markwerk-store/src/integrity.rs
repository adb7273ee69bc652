// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet integrity — SHA-256 fingerprints tying a stored result to the exact
// bytes of the sheet that produced it.

use std::path::Path;

use markwerk_core::error::MarkwerkError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a file's contents.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String, MarkwerkError> {
    let data = std::fs::read(path)?;
    Ok(hash_bytes(&data))
}

/// Verify that `data` matches the expected SHA-256 hex digest.
///
/// The comparison ignores ASCII case so digests copied from other tools
/// still match.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), MarkwerkError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(MarkwerkError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
