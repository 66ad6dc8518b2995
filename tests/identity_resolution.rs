// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Identity resolution on recovered tokens, standalone and end to end.

use std::collections::BTreeMap;

use aegis_core::identity::{IdentityResolver, UNKNOWN};
use aegis_core::{resolve_identity, similarity_ratio};

fn known() -> BTreeMap<String, String> {
    [
        ("admin", "SUPER_USER"),
        ("chiara", "USR_0001"),
        ("marzia", "USR_0002"),
        ("professore", "USR_9999"),
    ]
    .into_iter()
    .map(|(n, c)| (n.to_string(), c.to_string()))
    .collect()
}

#[test]
fn exact_token() {
    let (matched, sender, receiver, cleaned) = resolve_identity("USR_0001<->USR_0002", &known());
    assert!(matched);
    assert_eq!(sender, "chiara (USR_0001)");
    assert_eq!(receiver, "marzia (USR_0002)");
    assert_eq!(cleaned, "USR_0001<->USR_0002");
}

#[test]
fn noisy_hint_with_leading_garbage() {
    // Raw previews carry junk around the token and the odd flipped character.
    let (matched, sender, receiver, _) = resolve_identity("###\u{1}USR_0O01<->USR_0002\u{7f}~~", &known());
    assert!(matched);
    assert_eq!(sender, "chiara (USR_0001)");
    assert_eq!(receiver, "marzia (USR_0002)");
}

#[test]
fn no_separator_means_no_match() {
    let (matched, sender, receiver, cleaned) = resolve_identity("USR_0001 USR_0002", &known());
    assert!(!matched);
    assert_eq!((sender.as_str(), receiver.as_str()), (UNKNOWN, UNKNOWN));
    assert_eq!(cleaned, "USR_0001 USR_0002");
}

#[test]
fn empty_registry_matches_nothing() {
    let (matched, ..) = resolve_identity("USR_0001<->USR_0002", &BTreeMap::new());
    assert!(!matched);
}

#[test]
fn threshold_is_configurable() {
    let resolver = IdentityResolver::new(known()).with_threshold(0.95);
    let r = resolver.resolve("USR_0O01<->USR_0002");
    assert!(r.sender.is_none());
    assert!(r.receiver.as_ref().is_some_and(|m| m.is_exact()));
    assert!(similarity_ratio("USR_0O01", "USR_0001") < 0.95);
}

#[cfg(feature = "image")]
#[test]
fn verify_marked_image() {
    use aegis_core::{embed_image, verify_image, WatermarkConfig};
    use image::{DynamicImage, Rgb, RgbImage};

    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(320, 320, |x, y| {
        let v = 120.0 + 40.0 * ((x as f64) / 19.0).sin() * ((y as f64) / 27.0).cos();
        Rgb([90, v as u8, 160])
    }));
    let config = WatermarkConfig::default();
    let (marked, _) = embed_image(&img, "SUPER_USER<->USR_9999", &config).unwrap();

    let verification = verify_image(&marked, &IdentityResolver::new(known()), &config).unwrap();
    assert!(verification.is_attributed());
    let resolution = verification.resolution.unwrap();
    assert_eq!(resolution.sender_display(), "admin (SUPER_USER)");
    assert_eq!(resolution.receiver_display(), "professore (USR_9999)");
}
