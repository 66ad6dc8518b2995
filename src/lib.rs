// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # aegis-core
//!
//! Robust, invisible provenance watermarking for raster images. A short
//! signature `"sender<->receiver"` is written into the relation of two
//! mid-frequency DCT coefficients of every 8×8 block of one color channel,
//! protected by Reed-Solomon parity and repeated across the whole image.
//! Extraction is blind: it searches all 64 block alignments, so the mark
//! survives JPEG recompression, moderate noise and cropping.
//!
//! - `raster`: sample planes, 8×8 block iteration, the block DCT and (with the
//!   `image` feature) carrier-plane access and test degradations.
//! - `mark`: message codec, coefficient modulation, embedding, extraction.
//! - `identity`: fuzzy resolution of recovered tokens to known identities.
//!
//! Watermarking is not encryption: anyone who knows the parameters can read
//! or overwrite the mark.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use aegis_core::{embed_bytes, extract_bytes, WatermarkConfig};
//!
//! let config = WatermarkConfig::default();
//! let cover = std::fs::read("photo.jpg").unwrap();
//! let (marked_png, _report) = embed_bytes(&cover, "USR_0001<->USR_0002", &config).unwrap();
//! let found = extract_bytes(&marked_png, &config).unwrap();
//! assert_eq!(found.signature(), Some("USR_0001<->USR_0002"));
//! ```

pub mod identity;
pub mod mark;
pub mod raster;

pub use identity::{resolve_identity, similarity_ratio, IdentityResolver, Resolution};
pub use mark::{embed_channel, extract_channel, verify_channel};
pub use mark::{CarrierChannel, CoefficientPair, WatermarkConfig};
pub use mark::{EmbedReport, Extraction, Signature, Verification, WatermarkError};
#[cfg(feature = "image")]
pub use mark::pipeline::{embed_bytes, embed_image, extract_bytes, extract_image, verify_image};
pub use raster::{Channel, RasterError};
