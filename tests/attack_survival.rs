// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Survival of a 512×512 watermark under the degradations a shared photo
//! typically sees. Each test embeds `USR_0001<->USR_0002`, applies one
//! attack and expects the exact signature back.

#![cfg(feature = "image")]

use std::f64::consts::TAU;

use aegis_core::raster::attack::Attack;
use aegis_core::{embed_image, extract_image, WatermarkConfig};
use image::{DynamicImage, Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SIGNATURE: &str = "USR_0001<->USR_0002";

fn synthetic_photo(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let waves: Vec<(f64, f64, f64, f64)> = [25.0, 15.0, 10.0]
        .iter()
        .map(|&amp| (amp, rng.gen_range(0.005..0.05), rng.gen_range(0.005..0.05), rng.gen_range(0.0..TAU)))
        .collect();
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let base = 120.0
            + waves
                .iter()
                .map(|&(a, fx, fy, ph)| a * (TAU * (fx * x as f64 + fy * y as f64) + ph).sin())
                .sum::<f64>();
        let g = base + rng.gen_range(-6.0..6.0);
        Rgb([(base * 0.8 + 20.0) as u8, g.round() as u8, (250.0 - base) as u8])
    }))
}

fn survives(attack: Attack, seed: u64) {
    let config = WatermarkConfig::default();
    let (marked, report) = embed_image(&synthetic_photo(512, 512, seed), SIGNATURE, &config).unwrap();
    assert_eq!(report.weak_blocks, 0);
    let attacked = attack.apply(&marked).unwrap();
    let found = extract_image(&attacked, &config).unwrap();
    assert_eq!(found.signature(), Some(SIGNATURE), "{}: {found:?}", attack.label());
}

#[test]
fn jpeg_q80() {
    survives(Attack::Jpeg { quality: 80 }, 11);
}

#[test]
fn jpeg_q70() {
    survives(Attack::Jpeg { quality: 70 }, 12);
}

#[test]
fn central_crop_60_percent() {
    survives(Attack::CenterCrop { keep: 0.6 }, 13);
}

#[test]
fn gaussian_noise_variance_50() {
    survives(Attack::GaussianNoise { sigma: 50f64.sqrt(), seed: 7 }, 14);
}

#[test]
fn brightness_and_contrast() {
    survives(Attack::Brightness { gain: 1.1, offset: 40.0 }, 15);
}

/// Small crops in both directions shift the block grid to every residue.
#[test]
fn edge_crops_at_every_offset() {
    let config = WatermarkConfig::default();
    let (marked, _) = embed_image(&synthetic_photo(400, 400, 16), SIGNATURE, &config).unwrap();
    for (x, y) in [(1, 0), (0, 3), (5, 7), (8, 2)] {
        let cropped = marked.crop_imm(x, y, 400 - x, 400 - y);
        let found = extract_image(&cropped, &config).unwrap();
        assert_eq!(found.signature(), Some(SIGNATURE), "crop at ({x}, {y})");
    }
}

/// Cropping from the right and bottom keeps row-major continuity only when
/// whole block rows survive; both cases decode.
#[test]
fn crop_keeping_top_left() {
    let config = WatermarkConfig::default();
    let (marked, _) = embed_image(&synthetic_photo(512, 512, 17), SIGNATURE, &config).unwrap();
    for (w, h) in [(512, 300), (300, 512), (333, 333)] {
        let cropped = marked.crop_imm(0, 0, w, h);
        let found = extract_image(&cropped, &config).unwrap();
        assert_eq!(found.signature(), Some(SIGNATURE), "kept {w}x{h}");
    }
}
