// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Carrier plane extraction and replacement on decoded images.
//!
//! Grayscale images (with or without alpha) carry the mark in luma; color
//! images in the configured RGB channel. Every other channel, alpha included,
//! is copied through unchanged. Images with more than 8 bits per sample are
//! reduced to 8 bits.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Pixel};

use crate::mark::config::CarrierChannel;

use super::{Channel, RasterError};

/// Decode any supported image format from memory.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, RasterError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Lossless PNG encoding.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Baseline JPEG at `quality` (1-100). Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, RasterError> {
    let opaque = if image.color().has_color() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        DynamicImage::ImageLuma8(image.to_luma8())
    };
    let mut buffer = Cursor::new(Vec::new());
    opaque.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)))?;
    Ok(buffer.into_inner())
}

/// The 8-bit plane that carries the watermark.
pub fn carrier_channel(image: &DynamicImage, carrier: CarrierChannel) -> Result<Channel, RasterError> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let color = image.color();
    let samples = match (color.has_color(), color.has_alpha()) {
        (false, false) => image.to_luma8().into_raw(),
        (false, true) => read_plane(&image.to_luma_alpha8(), 0),
        (true, _) => read_plane(&image.to_rgb8(), carrier.index()),
    };
    Channel::new(width, height, samples)
}

/// A copy of `image` with its carrier plane replaced by `plane`.
pub fn replace_carrier(
    image: &DynamicImage,
    carrier: CarrierChannel,
    plane: &Channel,
) -> Result<DynamicImage, RasterError> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if plane.width() != width || plane.height() != height {
        return Err(RasterError::Shape { expected: width * height, actual: plane.samples().len() });
    }
    let color = image.color();
    let index = carrier.index();
    Ok(match (color.has_color(), color.has_alpha()) {
        (false, false) => DynamicImage::ImageLuma8(write_plane(image.to_luma8(), 0, plane)),
        (false, true) => DynamicImage::ImageLumaA8(write_plane(image.to_luma_alpha8(), 0, plane)),
        (true, false) => DynamicImage::ImageRgb8(write_plane(image.to_rgb8(), index, plane)),
        (true, true) => DynamicImage::ImageRgba8(write_plane(image.to_rgba8(), index, plane)),
    })
}

fn read_plane<P: Pixel<Subpixel = u8>>(buffer: &ImageBuffer<P, Vec<u8>>, index: usize) -> Vec<u8> {
    buffer.pixels().map(|p| p.channels()[index]).collect()
}

fn write_plane<P: Pixel<Subpixel = u8>>(
    mut buffer: ImageBuffer<P, Vec<u8>>,
    index: usize,
    plane: &Channel,
) -> ImageBuffer<P, Vec<u8>> {
    for (pixel, &sample) in buffer.pixels_mut().zip(plane.samples()) {
        pixel.channels_mut()[index] = sample;
    }
    buffer
}
