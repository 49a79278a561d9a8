//! Gzip encoding of cached payloads.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Compresses a UTF-8 payload.
///
/// # Errors
///
/// Returns an error if the encoder fails.
pub fn compress(payload: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload.as_bytes())
        .context("failed to compress payload")?;
    encoder.finish().context("failed to finish gzip stream")
}

/// Decompresses a payload written by [`compress`].
///
/// # Errors
///
/// Returns an error if the data is not gzip or not UTF-8.
pub fn decompress(data: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = String::new();
    decoder
        .read_to_string(&mut decompressed)
        .context("failed to decompress gzip payload")?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_compressed_payload_is_gzip() {
        // Arrange & Act
        let data = compress(r#"{"channels":[]}"#).unwrap();

        // Assert
        assert_eq!(data.get(..2), Some(&[0x1f, 0x8b][..]));
        assert_eq!(decompress(&data).unwrap(), r#"{"channels":[]}"#);
    }

    #[test]
    fn test_decompress_rejects_plain_text() {
        // Arrange & Act
        let result = decompress(b"not gzip at all");

        // Assert
        assert!(result.is_err());
    }
}
