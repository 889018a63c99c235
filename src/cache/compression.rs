//! Disk Payload Compression
//!
//! LZ4 block compression with a one-byte header naming the algorithm, so a
//! payload can always be decoded regardless of the settings it is read with.

use crate::error::{CacheError, Result};

/// Algorithm recorded in a payload's header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// Stored as-is
    None,
    /// LZ4 block with size prefix
    Lz4,
}

impl CompressionAlgorithm {
    fn tag(self) -> u8 {
        match self {
            CompressionAlgorithm::None => 0,
            CompressionAlgorithm::Lz4 => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CompressionAlgorithm::None),
            1 => Some(CompressionAlgorithm::Lz4),
            _ => None,
        }
    }
}

/// Encodes and decodes disk payloads.
#[derive(Debug, Clone)]
pub struct PayloadCodec {
    enabled: bool,
    min_size: usize,
}

impl PayloadCodec {
    /// Creates a codec; payloads shorter than `min_size` are never compressed.
    pub fn new(enabled: bool, min_size: usize) -> Self {
        Self { enabled, min_size }
    }

    /// Codec that never compresses.
    pub fn plain() -> Self {
        Self::new(false, usize::MAX)
    }

    /// Wraps `data` in a payload, compressing when enabled and worthwhile.
    ///
    /// Falls back to storing uncompressed if LZ4 fails or does not shrink the data.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        if self.enabled && data.len() >= self.min_size {
            match lz4::block::compress(data, None, true) {
                Ok(compressed) if compressed.len() < data.len() => {
                    return frame(CompressionAlgorithm::Lz4, &compressed);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("LZ4 compression failed, storing uncompressed: {}", e),
            }
        }
        frame(CompressionAlgorithm::None, data)
    }

    /// Recovers the original bytes from a payload.
    ///
    /// `expected_len` is the decoded length recorded when the payload was
    /// written. A payload that claims any other length is rejected before
    /// anything is allocated for it.
    pub fn decode(&self, payload: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let (&tag, body) = payload
            .split_first()
            .ok_or_else(|| CacheError::Corrupted("empty payload".into()))?;

        let decoded = match CompressionAlgorithm::from_tag(tag) {
            Some(CompressionAlgorithm::None) => body.to_vec(),
            Some(CompressionAlgorithm::Lz4) => {
                let (prefix, block) = body
                    .split_first_chunk::<4>()
                    .ok_or_else(|| CacheError::Corrupted("truncated lz4 header".into()))?;
                let claimed = i32::from_le_bytes(*prefix);
                if usize::try_from(claimed).ok() != Some(expected_len) {
                    return Err(CacheError::Corrupted(format!(
                        "lz4 header claims {} bytes, expected {}",
                        claimed, expected_len
                    )));
                }
                lz4::block::decompress(block, Some(claimed))
                    .map_err(|e| CacheError::Corrupted(format!("lz4: {}", e)))?
            }
            None => {
                return Err(CacheError::Corrupted(format!(
                    "unknown compression tag {}",
                    tag
                )))
            }
        };

        if decoded.len() != expected_len {
            return Err(CacheError::Corrupted(format!(
                "decoded {} bytes, expected {}",
                decoded.len(),
                expected_len
            )));
        }
        Ok(decoded)
    }

    /// Algorithm a payload was written with, if its header is valid.
    pub fn algorithm_of(payload: &[u8]) -> Option<CompressionAlgorithm> {
        payload.first().copied().and_then(CompressionAlgorithm::from_tag)
    }
}

fn frame(algorithm: CompressionAlgorithm, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(algorithm.tag());
    out.extend_from_slice(body);
    out
}
