// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity — SHA-256 fingerprints of exported signed documents.

use inksign_core::error::{InksignError, Result};
use sha2::{Digest, Sha256};

/// SHA-256 of `data` as a lowercase hex string.
pub fn digest_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check `data` against a previously recorded digest.
///
/// Comparison ignores hex case.
pub fn verify_digest(data: &[u8], expected_hex: &str) -> Result<()> {
    let actual = digest_hex(data);
    if actual.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(())
    } else {
        Err(InksignError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
