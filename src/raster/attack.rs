// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Image degradations for robustness testing.
//!
//! The standard suite models what a shared photo typically goes through:
//! recompression, a central crop, sensor-like noise, a brightness/contrast
//! edit and a thumbnail round trip. Noise is seeded, so every attack is
//! reproducible.

use std::fmt;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Pixel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::carrier::{decode_image, encode_jpeg};
use super::RasterError;

/// One image degradation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attack {
    /// Re-encode as JPEG at `quality` (1-100).
    Jpeg { quality: u8 },
    /// Keep the central `keep` fraction of each dimension.
    CenterCrop { keep: f64 },
    /// Add zero-mean Gaussian noise of standard deviation `sigma` to every
    /// color sample.
    GaussianNoise { sigma: f64, seed: u64 },
    /// `v * gain + offset`, saturating, on every color sample.
    Brightness { gain: f64, offset: f64 },
    /// Resize by `scale` and back to the original size (bilinear).
    ResizeRoundTrip { scale: f64 },
}

impl Attack {
    pub fn apply(&self, image: &DynamicImage) -> Result<DynamicImage, RasterError> {
        match *self {
            Attack::Jpeg { quality } => decode_image(&encode_jpeg(image, quality)?),
            Attack::CenterCrop { keep } => Ok(center_crop(image, keep)),
            Attack::GaussianNoise { sigma, seed } => Ok(gaussian_noise(image, sigma, seed)),
            Attack::Brightness { gain, offset } => Ok(map_color(image, |v| v * gain + offset)),
            Attack::ResizeRoundTrip { scale } => Ok(resize_round_trip(image, scale)),
        }
    }

    /// Short human-readable description.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Attack::Jpeg { quality } => write!(f, "JPEG q{quality}"),
            Attack::CenterCrop { keep } => write!(f, "central crop {:.0}%", keep * 100.0),
            Attack::GaussianNoise { sigma, .. } => write!(f, "Gaussian noise sigma {sigma:.2}"),
            Attack::Brightness { gain, offset } => write!(f, "brightness x{gain} {offset:+}"),
            Attack::ResizeRoundTrip { scale } => write!(f, "resize {:.0}% and back", scale * 100.0),
        }
    }
}

/// JPEG 70, JPEG 50, central 60% crop, noise of variance 50, brightness
/// x1.1 +40, 50% resize round trip.
pub fn standard_suite() -> Vec<Attack> {
    vec![
        Attack::Jpeg { quality: 70 },
        Attack::Jpeg { quality: 50 },
        Attack::CenterCrop { keep: 0.6 },
        Attack::Brightness { gain: 1.1, offset: 40.0 },
        Attack::GaussianNoise { sigma: 50f64.sqrt(), seed: 0x5eed },
        Attack::ResizeRoundTrip { scale: 0.5 },
    ]
}

fn center_crop(image: &DynamicImage, keep: f64) -> DynamicImage {
    let keep = keep.clamp(0.0, 1.0);
    let span = |len: u32| {
        let lo = (len as f64 * (1.0 - keep) / 2.0) as u32;
        let hi = (len as f64 * (1.0 + keep) / 2.0) as u32;
        (lo, hi.saturating_sub(lo))
    };
    let (x, width) = span(image.width());
    let (y, height) = span(image.height());
    image.crop_imm(x, y, width, height)
}

/// Apply `f` to every color sample (not alpha) of an 8-bit copy.
fn map_color(image: &DynamicImage, mut f: impl FnMut(f64) -> f64) -> DynamicImage {
    let mut apply = |v: u8| f(v as f64).round().clamp(0.0, 255.0) as u8;
    let color = image.color();
    match (color.has_color(), color.has_alpha()) {
        (true, true) => DynamicImage::ImageRgba8(map_samples(image.to_rgba8(), 3, &mut apply)),
        (true, false) => DynamicImage::ImageRgb8(map_samples(image.to_rgb8(), 3, &mut apply)),
        (false, true) => DynamicImage::ImageLumaA8(map_samples(image.to_luma_alpha8(), 1, &mut apply)),
        (false, false) => DynamicImage::ImageLuma8(map_samples(image.to_luma8(), 1, &mut apply)),
    }
}

fn map_samples<P: Pixel<Subpixel = u8>>(
    mut buffer: ImageBuffer<P, Vec<u8>>,
    color_channels: usize,
    apply: &mut impl FnMut(u8) -> u8,
) -> ImageBuffer<P, Vec<u8>> {
    for pixel in buffer.pixels_mut() {
        for v in pixel.channels_mut().iter_mut().take(color_channels) {
            *v = apply(*v);
        }
    }
    buffer
}

fn gaussian_noise(image: &DynamicImage, sigma: f64, seed: u64) -> DynamicImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    map_color(image, |v| v + sigma * standard_normal(&mut rng))
}

/// Box-Muller.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn resize_round_trip(image: &DynamicImage, scale: f64) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    let sw = ((w as f64 * scale) as u32).max(1);
    let sh = ((h as f64 * scale) as u32).max(1);
    image
        .resize_exact(sw, sh, FilterType::Triangle)
        .resize_exact(w, h, FilterType::Triangle)
}
