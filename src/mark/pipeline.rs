// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Whole-image entry points.
//!
//! These pick the carrier plane out of a decoded image, run the channel-level
//! embedder or extractor on it and, for embedding, put the marked plane
//! back. Marked images should be stored losslessly: [`embed_bytes`] always
//! produces PNG.

use image::DynamicImage;
use tracing::instrument;

use crate::identity::IdentityResolver;
use crate::raster::carrier::{carrier_channel, decode_image, encode_png, replace_carrier};

use super::config::WatermarkConfig;
use super::embed::{embed_channel, EmbedReport};
use super::error::Result;
use super::extract::{extract_channel, Extraction};
use super::verify::{verify_channel, Verification};

/// Embed `signature` into the carrier plane of `image`.
pub fn embed_image(image: &DynamicImage, signature: &str, config: &WatermarkConfig) -> Result<(DynamicImage, EmbedReport)> {
    let plane = carrier_channel(image, config.carrier)?;
    let (marked, report) = embed_channel(&plane, signature, config)?;
    Ok((replace_carrier(image, config.carrier, &marked)?, report))
}

pub fn extract_image(image: &DynamicImage, config: &WatermarkConfig) -> Result<Extraction> {
    extract_channel(&carrier_channel(image, config.carrier)?, config)
}

pub fn verify_image(image: &DynamicImage, resolver: &IdentityResolver, config: &WatermarkConfig) -> Result<Verification> {
    verify_channel(&carrier_channel(image, config.carrier)?, resolver, config)
}

/// Decode an encoded image (any supported format), embed, encode as PNG.
#[instrument(skip_all, fields(input_len = bytes.len()))]
pub fn embed_bytes(bytes: &[u8], signature: &str, config: &WatermarkConfig) -> Result<(Vec<u8>, EmbedReport)> {
    let image = decode_image(bytes)?;
    let (marked, report) = embed_image(&image, signature, config)?;
    Ok((encode_png(&marked)?, report))
}

#[instrument(skip_all, fields(input_len = bytes.len()))]
pub fn extract_bytes(bytes: &[u8], config: &WatermarkConfig) -> Result<Extraction> {
    extract_image(&decode_image(bytes)?, config)
}
