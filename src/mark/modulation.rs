// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Coefficient-pair modulation with self-verifying strength.
//!
//! A bit is the order of two DCT coefficients v1, v2 of a block:
//! `bit == 1` ⇔ `v2 > v1`. Embedding pushes the pair apart by a strength α
//! (keeping their mean), then simulates storing the block (inverse DCT,
//! clamp, round, forward DCT) and checks that at least `margin` of
//! separation survived. If not, α grows by a fixed step, up to
//! `max_attempts` times. Decoding needs no side information: it is the sign
//! of `v2 - v1`.

use serde::{Deserialize, Serialize};

use crate::raster::{dct, Block, BLOCK};

use super::config::WatermarkConfig;

/// Two DCT positions, each `(row frequency v, column frequency u)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientPair {
    pub first: (usize, usize),
    pub second: (usize, usize),
}

impl Default for CoefficientPair {
    /// (1,2) / (2,1): low-mid frequencies that JPEG quantizes lightly.
    fn default() -> Self {
        Self { first: (1, 2), second: (2, 1) }
    }
}

impl CoefficientPair {
    /// Both positions inside the block, neither DC, and distinct.
    pub fn is_valid(&self) -> bool {
        let inside = |(v, u): (usize, usize)| v < BLOCK && u < BLOCK && (v, u) != (0, 0);
        inside(self.first) && inside(self.second) && self.first != self.second
    }

    fn indices(&self) -> (usize, usize) {
        (self.first.0 * BLOCK + self.first.1, self.second.0 * BLOCK + self.second.1)
    }

    /// `(v1, v2)` from a coefficient block.
    pub fn values(&self, coeffs: &Block) -> (f64, f64) {
        let (i1, i2) = self.indices();
        (coeffs[i1], coeffs[i2])
    }

    /// `(v1, v2)` straight from spatial samples, computing only the two
    /// coefficients needed.
    pub fn project(&self, samples: &Block) -> (f64, f64) {
        (
            dct::coefficient(samples, self.first.0, self.first.1),
            dct::coefficient(samples, self.second.0, self.second.1),
        )
    }
}

/// Bit carried by a pair: 1 if `v2 > v1`, else 0.
pub fn decode_pair(v1: f64, v2: f64) -> u8 {
    u8::from(v2 > v1)
}

/// Separation in the direction of `bit`; negative when the pair says the
/// opposite bit.
fn separation(v1: f64, v2: f64, bit: u8) -> f64 {
    if bit == 1 {
        v2 - v1
    } else {
        v1 - v2
    }
}

/// Outcome of [`Modulator::encode_bit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Modulated {
    /// Coefficients to write (the last attempt if the margin was never met).
    pub coeffs: Block,
    /// The margin survived the simulated round trip.
    pub achieved: bool,
    /// α of the returned attempt.
    pub strength: f64,
    /// Attempts used, `1..=max_attempts`.
    pub attempts: u32,
    /// The pair was rewritten (false when it already held the bit).
    pub changed: bool,
}

/// Writes and reads one bit per block.
#[derive(Debug, Clone, PartialEq)]
pub struct Modulator {
    pub pair: CoefficientPair,
    pub strength: f64,
    pub strength_step: f64,
    pub margin: f64,
    pub max_attempts: u32,
}

impl Modulator {
    pub fn from_config(config: &WatermarkConfig) -> Self {
        Self {
            pair: config.pair,
            strength: config.strength,
            strength_step: config.strength_step,
            margin: config.margin,
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Encode `bit` into `coeffs`, escalating α until `margin` survives
    /// the simulated store, at most `max_attempts` times.
    pub fn encode_bit(&self, coeffs: &Block, bit: u8) -> Modulated {
        let mut strength = self.strength;
        let mut attempt = 1;
        loop {
            let candidate = self.place(coeffs, bit, strength);
            let stored = dct::forward(&dct::settle(&dct::inverse(&candidate)));
            let (v1, v2) = self.pair.values(&stored);
            let achieved = separation(v1, v2, bit) >= self.margin;

            if achieved || attempt >= self.max_attempts {
                return Modulated {
                    changed: candidate != *coeffs,
                    coeffs: candidate,
                    achieved,
                    strength,
                    attempts: attempt,
                };
            }
            strength += self.strength_step;
            attempt += 1;
        }
    }

    /// Read the bit from a coefficient block.
    pub fn decode_bit(&self, coeffs: &Block) -> u8 {
        let (v1, v2) = self.pair.values(coeffs);
        decode_pair(v1, v2)
    }

    /// Move the pair to `mean ± strength/2`, or leave it if it already
    /// carries `bit` with at least `strength` of separation.
    fn place(&self, coeffs: &Block, bit: u8, strength: f64) -> Block {
        let (i1, i2) = self.pair.indices();
        let (v1, v2) = (coeffs[i1], coeffs[i2]);
        let mut out = *coeffs;
        if separation(v1, v2, bit) >= strength {
            return out;
        }
        let mean = (v1 + v2) / 2.0;
        let half = strength / 2.0;
        if bit == 1 {
            out[i1] = mean - half;
            out[i2] = mean + half;
        } else {
            out[i1] = mean + half;
            out[i2] = mean - half;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::BLOCK_LEN;

    fn textured_block(base: f64) -> Block {
        let mut block = [0.0f64; BLOCK_LEN];
        for (i, s) in block.iter_mut().enumerate() {
            let (y, x) = (i / BLOCK, i % BLOCK);
            *s = (base + 6.0 * ((x * 3 + y * 5) % 7) as f64 - 18.0).round();
        }
        block
    }

    fn modulator() -> Modulator {
        Modulator::from_config(&WatermarkConfig::default())
    }

    /// Store the coefficients the way the embedder does and read the bit back.
    fn stored_bit(m: &Modulator, coeffs: &Block) -> (u8, f64) {
        let stored = dct::forward(&dct::settle(&dct::inverse(coeffs)));
        let (v1, v2) = m.pair.values(&stored);
        (m.decode_bit(&stored), (v2 - v1).abs())
    }

    #[test]
    fn both_bits_survive_storage() {
        let m = modulator();
        let coeffs = dct::forward(&textured_block(128.0));
        for bit in [0u8, 1] {
            let out = m.encode_bit(&coeffs, bit);
            assert!(out.achieved, "bit {bit} not achieved");
            assert_eq!(out.attempts, 1);
            let (read, sep) = stored_bit(&m, &out.coeffs);
            assert_eq!(read, bit);
            assert!(sep >= m.margin, "separation {sep} below margin");
        }
    }

    #[test]
    fn satisfied_pair_is_left_alone() {
        let m = modulator();
        let mut coeffs = dct::forward(&dct::settle(&textured_block(120.0)));
        let (i1, i2) = m.pair.indices();
        coeffs[i1] = -40.0;
        coeffs[i2] = 40.0;
        let block = dct::settle(&dct::inverse(&coeffs));
        let coeffs = dct::forward(&block);

        let out = m.encode_bit(&coeffs, 1);
        assert!(out.achieved);
        assert!(!out.changed);
        assert_eq!(out.coeffs, coeffs);

        let flipped = m.encode_bit(&coeffs, 0);
        assert!(flipped.changed);
        assert_eq!(stored_bit(&m, &flipped.coeffs).0, 0);
    }

    #[test]
    fn strength_escalates_until_margin_survives() {
        let m = Modulator { margin: 45.0, ..modulator() };
        let coeffs = dct::forward(&textured_block(128.0));
        let out = m.encode_bit(&coeffs, 1);
        assert!(out.achieved);
        assert_eq!(out.attempts, 2);
        assert_eq!(out.strength, m.strength + m.strength_step);
    }

    #[test]
    fn saturated_block_needs_extra_strength() {
        let m = modulator();
        let coeffs = dct::forward(&[255.0f64; BLOCK_LEN]);
        let out = m.encode_bit(&coeffs, 1);
        assert!(out.achieved);
        assert!(out.attempts > 1, "clipping should defeat the first attempt");
        assert_eq!(stored_bit(&m, &out.coeffs).0, 1);
    }

    #[test]
    fn unreachable_margin_gives_up_after_bound() {
        let m = Modulator { margin: 1000.0, ..modulator() };
        let coeffs = dct::forward(&textured_block(128.0));
        let out = m.encode_bit(&coeffs, 0);
        assert!(!out.achieved);
        assert_eq!(out.attempts, m.max_attempts);
        let expected = m.strength + m.strength_step * (m.max_attempts - 1) as f64;
        assert_eq!(out.strength, expected);
        assert_eq!(stored_bit(&m, &out.coeffs).0, 0);
    }

    #[test]
    fn decode_is_sign_of_difference() {
        assert_eq!(decode_pair(1.0, 2.0), 1);
        assert_eq!(decode_pair(2.0, 1.0), 0);
        assert_eq!(decode_pair(3.0, 3.0), 0);
    }

    #[test]
    fn projection_matches_full_transform() {
        let pair = CoefficientPair::default();
        let block = textured_block(90.0);
        let (p1, p2) = pair.project(&block);
        let (f1, f2) = pair.values(&dct::forward(&block));
        assert!((p1 - f1).abs() < 1e-9 && (p2 - f2).abs() < 1e-9);
    }

    #[test]
    fn pair_validation() {
        assert!(CoefficientPair::default().is_valid());
        assert!(!CoefficientPair { first: (0, 0), second: (1, 1) }.is_valid());
        assert!(!CoefficientPair { first: (2, 2), second: (2, 2) }.is_valid());
        assert!(!CoefficientPair { first: (8, 0), second: (1, 1) }.is_valid());
    }
}
