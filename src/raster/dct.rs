// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Orthonormal 8×8 DCT-II / DCT-III on real-valued blocks.
//!
//! No level shift and no quantization: `forward` maps samples to
//! coefficients with the orthonormal scaling (`C(0) = 1/sqrt(8)`,
//! `C(k>0) = 1/2`), so the transform preserves energy and `inverse` is its
//! exact transpose.

use std::sync::OnceLock;

use super::{Block, BLOCK, BLOCK_LEN};

/// `COSINE[u][x] = cos((2x + 1) u π / 16)`
static COSINE: OnceLock<[[f64; BLOCK]; BLOCK]> = OnceLock::new();

/// Normalization constants: C(0) = 1/sqrt(8), C(u>0) = 1/2.
static NORM: OnceLock<[f64; BLOCK]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; BLOCK]; BLOCK] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; BLOCK]; BLOCK];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; BLOCK] {
    NORM.get_or_init(|| {
        let mut n = [0.5f64; BLOCK];
        n[0] = 1.0 / (8.0f64).sqrt();
        n
    })
}

/// Forward 2D DCT-II. Output index is `v * 8 + u`.
pub fn forward(samples: &Block) -> Block {
    let cos = cosine_table();
    let c = norm_table();

    // Rows first.
    let mut temp = [0.0f64; BLOCK_LEN];
    for row in 0..BLOCK {
        for u in 0..BLOCK {
            let mut sum = 0.0;
            for x in 0..BLOCK {
                sum += samples[row * BLOCK + x] * cos[u][x];
            }
            temp[row * BLOCK + u] = c[u] * sum;
        }
    }

    // Then columns.
    let mut coeffs = [0.0f64; BLOCK_LEN];
    for col in 0..BLOCK {
        for v in 0..BLOCK {
            let mut sum = 0.0;
            for y in 0..BLOCK {
                sum += temp[y * BLOCK + col] * cos[v][y];
            }
            coeffs[v * BLOCK + col] = c[v] * sum;
        }
    }
    coeffs
}

/// Inverse 2D DCT (DCT-III), the exact inverse of [`forward`].
pub fn inverse(coeffs: &Block) -> Block {
    let cos = cosine_table();
    let c = norm_table();

    let mut temp = [0.0f64; BLOCK_LEN];
    for col in 0..BLOCK {
        for y in 0..BLOCK {
            let mut sum = 0.0;
            for v in 0..BLOCK {
                sum += c[v] * coeffs[v * BLOCK + col] * cos[v][y];
            }
            temp[y * BLOCK + col] = sum;
        }
    }

    let mut samples = [0.0f64; BLOCK_LEN];
    for row in 0..BLOCK {
        for x in 0..BLOCK {
            let mut sum = 0.0;
            for u in 0..BLOCK {
                sum += c[u] * temp[row * BLOCK + u] * cos[u][x];
            }
            samples[row * BLOCK + x] = sum;
        }
    }
    samples
}

/// Single coefficient `(v, u)` of the forward transform.
///
/// Equal to `forward(samples)[v * 8 + u]` at a fraction of the cost; the
/// extractor reads only two coefficients per block.
pub fn coefficient(samples: &Block, v: usize, u: usize) -> f64 {
    let cos = cosine_table();
    let c = norm_table();
    let mut sum = 0.0;
    for y in 0..BLOCK {
        let mut row = 0.0;
        for x in 0..BLOCK {
            row += samples[y * BLOCK + x] * cos[u][x];
        }
        sum += row * cos[v][y];
    }
    c[v] * c[u] * sum
}

/// Clamp to the 8-bit sample range and round, as storing the block would.
pub fn settle(samples: &Block) -> Block {
    let mut out = *samples;
    for s in out.iter_mut() {
        *s = s.clamp(0.0, 255.0).round();
    }
    out
}
