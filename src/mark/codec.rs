// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Message codec: marker framing, Reed-Solomon protection and bit packing.
//!
//! ```text
//! [marker][signature bytes][parity]
//! ```
//!
//! The codeword is a single shortened RS block, so the signature is limited
//! to `255 - parity - marker` bytes. A decode only counts when the corrected
//! data starts with the marker and the rest is printable UTF-8.

use std::ops::RangeInclusive;

use thiserror::Error;

use super::config::WatermarkConfig;
use super::ecc::{ReedSolomon, RsDecodeError};
use super::error::{Result, WatermarkError};

/// Why a candidate window is not a signature. Expected and frequent during
/// extraction; never surfaced as a failure of the whole search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("window too short for marker and parity")]
    TooShort,
    #[error(transparent)]
    Uncorrectable(#[from] RsDecodeError),
    #[error("corrected data lacks the marker")]
    MissingMarker,
    #[error("payload is empty or not printable UTF-8")]
    NotText,
}

/// Frames signatures into codewords and back.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    marker: Vec<u8>,
    rs: ReedSolomon,
}

impl MessageCodec {
    /// # Panics
    /// Panics if `parity_len` is outside `1..255`; validated configs never are.
    pub fn new(marker: &str, parity_len: usize) -> Self {
        Self { marker: marker.as_bytes().to_vec(), rs: ReedSolomon::new(parity_len) }
    }

    pub fn from_config(config: &WatermarkConfig) -> Self {
        Self::new(&config.marker, config.parity_len)
    }

    pub fn marker(&self) -> &[u8] {
        &self.marker
    }

    pub fn parity_len(&self) -> usize {
        self.rs.parity_len()
    }

    /// Byte errors corrected per codeword.
    pub fn correction_capacity(&self) -> usize {
        self.rs.correction_capacity()
    }

    /// Largest signature in bytes.
    pub fn max_payload_len(&self) -> usize {
        self.rs.max_data_len().saturating_sub(self.marker.len())
    }

    /// Codeword length for a signature of `payload_len` bytes.
    pub fn codeword_len(&self, payload_len: usize) -> usize {
        self.marker.len() + payload_len + self.rs.parity_len()
    }

    /// Plausible codeword lengths for signatures of 1 to `max_payload` bytes.
    pub fn codeword_len_range(&self, max_payload: usize) -> RangeInclusive<usize> {
        let longest = max_payload.clamp(1, self.max_payload_len().max(1));
        self.codeword_len(1)..=self.codeword_len(longest)
    }

    /// `marker || signature || parity`.
    pub fn encode(&self, signature: &str) -> Result<Vec<u8>> {
        if signature.is_empty() {
            return Err(WatermarkError::InvalidSignature("signature is empty".to_string()));
        }
        if signature.chars().any(char::is_control) {
            return Err(WatermarkError::InvalidSignature(
                "signature contains control characters".to_string(),
            ));
        }
        let max = self.max_payload_len();
        if signature.len() > max {
            return Err(WatermarkError::EncodingTooLarge { len: signature.len(), max });
        }

        let mut framed = Vec::with_capacity(self.marker.len() + signature.len());
        framed.extend_from_slice(&self.marker);
        framed.extend_from_slice(signature.as_bytes());
        Ok(self.rs.encode(&framed))
    }

    /// Correct and unframe a candidate window.
    pub fn decode(&self, candidate: &[u8]) -> std::result::Result<String, DecodeError> {
        if candidate.len() <= self.marker.len() + self.rs.parity_len() {
            return Err(DecodeError::TooShort);
        }
        let (framed, _) = self.rs.decode(candidate)?;
        let payload = framed.strip_prefix(self.marker.as_slice()).ok_or(DecodeError::MissingMarker)?;
        let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotText)?;
        if text.is_empty() || text.chars().any(char::is_control) {
            return Err(DecodeError::NotText);
        }
        Ok(text.to_string())
    }

    /// At least one marker byte already in place: cheap filter before RS.
    pub fn marker_plausible(&self, window: &[u8]) -> bool {
        self.marker.is_empty()
            || self.marker.iter().zip(window).any(|(m, w)| m == w)
    }
}

/// Expand bytes to bits, MSB first.
pub fn to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }
    bits
}

/// Pack bits (MSB first) into bytes, dropping a trailing partial byte.
pub fn from_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}
