// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the watermark pipeline.
//!
//! [`WatermarkError`] covers the failures that end an embed or extract call.
//! Per-window decode failures during extraction are not errors at this level:
//! they are [`DecodeError`](super::codec::DecodeError)s, counted and skipped.

use thiserror::Error;

use crate::raster::RasterError;

/// Errors that can occur while embedding or extracting a watermark.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// The signature does not fit in one Reed-Solomon block.
    #[error("signature is {len} bytes, the codec carries at most {max}")]
    EncodingTooLarge { len: usize, max: usize },

    /// The carrier has fewer blocks than one codeword has bits.
    #[error("codeword needs {needed} blocks, carrier only has {available}")]
    CapacityExceeded { needed: usize, available: usize },

    /// The signature is empty, has control characters or misplaces the separator.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Extraction found nothing that decodes.
    #[error("no signature found{}", hint_suffix(.hint))]
    NoSignatureFound { hint: Option<String> },

    /// The sample buffer or image could not be used.
    #[error("malformed image: {0}")]
    MalformedImage(#[from] RasterError),
}

#[cfg(feature = "image")]
impl From<image::ImageError> for WatermarkError {
    fn from(e: image::ImageError) -> Self {
        Self::MalformedImage(RasterError::Image(e))
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" (raw preview: {h:?})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, WatermarkError>;
