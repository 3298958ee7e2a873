//! Checksum utilities for cached blob verification

use crate::error::{ChemrefError, Result};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of an in-memory buffer
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Verify a buffer against an expected hex digest
///
/// Comparison ignores surrounding whitespace and letter case so sidecar files
/// written by other tools are accepted.
pub fn verify_sha256(data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(ChemrefError::ChecksumMismatch {
            expected: expected.trim().to_string(),
            actual,
        })
    }
}
