// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Watermark embedding and blind extraction.
//!
//! A signature `"sender<->receiver"` is framed with a marker and protected
//! by Reed-Solomon parity ([`codec`]), tiled over every 8×8 block of one
//! carrier channel ([`tiling`]) and written one bit per block into the
//! relation of two mid-frequency DCT coefficients ([`modulation`]).
//!
//! - **Embed** ([`embed_channel`]): adaptive strength per block so each bit
//!   survives 8-bit storage with a margin.
//! - **Extract** ([`extract_channel`]): 64 grid alignments, sliding-window
//!   RS decoding, majority vote, stride-fold recovery for cropped images.
//! - **Verify** ([`verify_channel`]): extract, then resolve the recovered
//!   token against known identities.
//!
//! With the `image` feature, [`pipeline`] wraps all three for whole images.

pub mod codec;
pub mod config;
pub mod ecc;
pub mod embed;
pub mod error;
pub mod extract;
pub mod modulation;
#[cfg(feature = "image")]
pub mod pipeline;
pub mod signature;
pub mod tiling;
pub mod verify;

pub use config::{CarrierChannel, WatermarkConfig};
pub use embed::{embed_channel, EmbedReport};
pub use error::{Result, WatermarkError};
pub use extract::{extract_channel, Extraction};
pub use modulation::CoefficientPair;
pub use signature::{Signature, SEPARATOR};
pub use verify::{verify_channel, Verification};
