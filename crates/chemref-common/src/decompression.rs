//! Decompression helpers for fetched dataset payloads
//!
//! Reference datasets are often mirrored as `.gz` files while the primary
//! source serves plain text, so callers inflate by content rather than by
//! file name.

use crate::error::{ChemrefError, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

/// Leading bytes of every gzip member
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether the buffer starts with the gzip magic header
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= GZIP_MAGIC.len() && data[..GZIP_MAGIC.len()] == GZIP_MAGIC
}

/// Decompress gzip-compressed data
pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| ChemrefError::Decompression(e.to_string()))?;
    debug!("Decompressed {} -> {} bytes", data.len(), decompressed.len());
    Ok(decompressed)
}

/// Inflate the payload when it is gzip, otherwise hand it back untouched
pub fn maybe_decompress(data: Vec<u8>) -> Result<Vec<u8>> {
    if is_gzip(&data) {
        decompress_gzip(&data)
    } else {
        Ok(data)
    }
}

/// Decode a payload to UTF-8 text, inflating gzip first
pub fn payload_to_string(data: Vec<u8>) -> Result<String> {
    let bytes = maybe_decompress(data)?;
    String::from_utf8(bytes).map_err(|e| ChemrefError::Parse(format!("payload is not UTF-8: {}", e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(&gzip(b"A01,stomatological")));
        assert!(!is_gzip(b"Class ID,Preferred Label"));
        assert!(!is_gzip(&[0x1f]));
    }

    #[test]
    fn test_maybe_decompress_passthrough() {
        let plain = b"format-version: 1.2".to_vec();
        assert_eq!(maybe_decompress(plain.clone()).unwrap(), plain);
    }

    #[test]
    fn test_payload_to_string_gzip() {
        let text = payload_to_string(gzip(b"[Term]\nid: MOD:00000\n")).unwrap();
        assert_eq!(text, "[Term]\nid: MOD:00000\n");
    }

    #[test]
    fn test_truncated_gzip_fails() {
        let mut data = gzip(b"some longer payload that will be cut short");
        data.truncate(12);
        assert!(matches!(
            decompress_gzip(&data),
            Err(ChemrefError::Decompression(_))
        ));
    }
}
