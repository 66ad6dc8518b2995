// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Round-trip integration tests for whole-image embed/extract.

#![cfg(feature = "image")]

use std::f64::consts::TAU;
use std::path::Path;

use aegis_core::raster::carrier::{encode_jpeg, encode_png};
use aegis_core::{
    embed_bytes, embed_image, extract_bytes, extract_image, Extraction, WatermarkConfig, WatermarkError,
};
use image::{DynamicImage, Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Smooth random waves plus fine grain, every channel inside [40, 200].
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

#[test]
fn png_roundtrip_512() {
    let config = WatermarkConfig::default();
    let cover = encode_png(&synthetic_photo(512, 512, 1)).unwrap();

    let (marked, report) = embed_bytes(&cover, "USR_0001<->USR_0002", &config).unwrap();
    assert_eq!(report.blocks, 64 * 64);
    assert_eq!(report.codeword_len, 3 + 19 + 16);
    assert_eq!(report.full_copies, 4096 / 304);
    assert_eq!(report.weak_blocks, 0);

    match extract_bytes(&marked, &config).unwrap() {
        Extraction::Found { signature, votes, alignment } => {
            assert_eq!(signature, "USR_0001<->USR_0002");
            assert!(votes >= config.early_exit_votes);
            assert_eq!(alignment, (0, 0));
        }
        other => panic!("expected a signature, got {other:?}"),
    }
}

#[test]
fn signatures_of_varied_length_roundtrip() {
    let config = WatermarkConfig::default();
    let img = synthetic_photo(384, 320, 2);
    let longest = format!("{}<->{}", "x".repeat(18), "y".repeat(19));
    for signature in ["A<->B", "SUPER_USER<->USR_9999", "alpha.team<->beta-ops", longest.as_str()] {
        let (marked, _) = embed_image(&img, signature, &config).unwrap();
        let found = extract_image(&marked, &config).unwrap();
        assert_eq!(found.signature(), Some(signature), "signature {signature:?}");
    }
}

#[test]
fn longest_signature_roundtrips_and_one_more_byte_is_rejected() {
    let config = WatermarkConfig::default();
    let img = synthetic_photo(512, 512, 7);
    let at_limit = format!("{}<->{}", "S".repeat(18), "R".repeat(19));
    assert_eq!(at_limit.len(), config.max_signature_len);
    let (marked, _) = embed_image(&img, &at_limit, &config).unwrap();
    assert_eq!(extract_image(&marked, &config).unwrap().signature(), Some(at_limit.as_str()));

    let over = format!("{}<->{}", "S".repeat(19), "R".repeat(19));
    let err = embed_image(&img, &over, &config).unwrap_err();
    assert!(matches!(err, WatermarkError::EncodingTooLarge { len: 41, max: 40 }), "{err}");
}

#[test]
fn raised_length_limit_is_searched_by_the_extractor() {
    let config = WatermarkConfig { max_signature_len: 64, ..WatermarkConfig::default() };
    let signature = format!("{}<->{}", "S".repeat(30), "R".repeat(30));
    let (marked, _) = embed_image(&synthetic_photo(512, 512, 8), &signature, &config).unwrap();
    assert_eq!(extract_image(&marked, &config).unwrap().signature(), Some(signature.as_str()));
}

#[test]
fn malformed_signatures_are_rejected() {
    let config = WatermarkConfig::default();
    let img = synthetic_photo(256, 256, 9);
    for signature in ["A<->B<->C", "no separator at all"] {
        let err = embed_image(&img, signature, &config).unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidSignature(_)), "{signature:?}: {err}");
    }
}

#[test]
fn jpeg_cover_is_accepted_and_output_is_png() {
    let config = WatermarkConfig::default();
    let cover = encode_jpeg(&synthetic_photo(320, 240, 3), 90).unwrap();
    let (marked, _) = embed_bytes(&cover, "USR_0001<->USR_0002", &config).unwrap();
    assert_eq!(&marked[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(
        extract_bytes(&marked, &config).unwrap().signature(),
        Some("USR_0001<->USR_0002")
    );
}

#[test]
fn unmarked_photo_has_no_signature() {
    let config = WatermarkConfig::default();
    let found = extract_image(&synthetic_photo(256, 256, 4), &config).unwrap();
    assert!(!found.is_found(), "{found:?}");
}

#[test]
fn small_image_is_rejected_not_truncated() {
    let config = WatermarkConfig::default();
    let err = embed_image(&synthetic_photo(64, 64, 5), "USR_0001<->USR_0002", &config).unwrap_err();
    assert!(matches!(err, WatermarkError::CapacityExceeded { available: 64, .. }), "{err}");
}

#[test]
fn marked_image_stays_close_to_cover() {
    let config = WatermarkConfig::default();
    let img = synthetic_photo(256, 256, 6);
    let (marked, _) = embed_image(&img, "USR_0001<->USR_0002", &config).unwrap();
    let (a, b) = (img.to_rgb8(), marked.to_rgb8());
    let mse: f64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(p, q)| (p[1] as f64 - q[1] as f64).powi(2))
        .sum::<f64>()
        / (256.0 * 256.0);
    let psnr = 10.0 * (255.0f64 * 255.0 / mse).log10();
    assert!(psnr > 30.0, "green PSNR {psnr:.1} dB");
}

fn discover_photos() -> Vec<std::path::PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/real_photos");
    if !dir.exists() {
        return Vec::new();
    }
    let mut photos: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("jpg" | "jpeg" | "png")))
        .collect();
    photos.sort();
    photos
}

/// Round trip on any photos dropped into `tests/real_photos/`; passes when
/// there are none.
#[test]
fn real_photos_roundtrip() {
    let config = WatermarkConfig::default();
    for photo in discover_photos() {
        let bytes = std::fs::read(&photo).unwrap();
        let name = photo.file_name().unwrap().to_string_lossy().into_owned();
        let marked = match embed_bytes(&bytes, "USR_0001<->USR_0002", &config) {
            Ok((marked, _)) => marked,
            Err(e) => {
                eprintln!("skipping {name}: {e}");
                continue;
            }
        };
        assert_eq!(
            extract_bytes(&marked, &config).unwrap().signature(),
            Some("USR_0001<->USR_0002"),
            "photo {name}"
        );
    }
}
