// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Tiling the codeword bitstream over the block grid, and folding it back.
//!
//! Embedding repeats the codeword bits end to end in row-major block order
//! and truncates at capacity, so block `i` of the original grid carries bit
//! `i mod P` of the codeword (P = codeword bits). Extraction of an uncropped
//! image reads those copies back byte-aligned. A crop that removes block
//! columns breaks that alignment at every block row, but the block at
//! `(r, c)` of the cropped grid still carries bit `(φ + r·s + c) mod P`,
//! with `s` the original row length in blocks mod P and φ an unknown phase.
//! [`StrideFold`] accumulates soft bit values by that rule.

/// Repeat `bits` end to end and truncate to `capacity`.
///
/// The last copy may be partial; `bits` need not divide `capacity`.
pub fn tile(bits: &[u8], capacity: usize) -> Vec<u8> {
    if bits.is_empty() {
        return vec![0; capacity];
    }
    bits.iter().copied().cycle().take(capacity).collect()
}

/// Number of complete copies of a `bit_len`-bit codeword in `capacity` blocks.
pub fn full_copies(bit_len: usize, capacity: usize) -> usize {
    if bit_len == 0 {
        return 0;
    }
    capacity / bit_len
}

/// Soft majority fold of a block grid modulo a codeword period.
#[derive(Debug, Clone)]
pub struct StrideFold {
    period: usize,
    sums: Vec<f64>,
    counts: Vec<u32>,
    /// Σ|value| over everything folded in.
    magnitude: f64,
}

impl StrideFold {
    /// Fold `values` (row-major, `cols` per row, positive means bit 1)
    /// assuming row stride `stride` modulo `period`.
    pub fn new(values: &[f32], cols: usize, period: usize, stride: usize) -> Self {
        let mut sums = vec![0.0f64; period];
        let mut counts = vec![0u32; period];
        let mut magnitude = 0.0;
        if period > 0 && cols > 0 {
            for (r, row) in values.chunks(cols).enumerate() {
                let base = (r % period) * (stride % period) % period;
                for (c, &v) in row.iter().enumerate() {
                    let slot = (base + c) % period;
                    sums[slot] += v as f64;
                    counts[slot] += 1;
                    magnitude += v.abs() as f64;
                }
            }
        }
        Self { period, sums, counts, magnitude }
    }

    /// Agreement of the folded copies in `[0, 1]`: `Σ|slot sum| / Σ|value|`.
    ///
    /// Near 1 when (period, stride) matches the layout, much lower otherwise.
    pub fn agreement(&self) -> f64 {
        if self.magnitude == 0.0 {
            return 0.0;
        }
        self.sums.iter().map(|s| s.abs()).sum::<f64>() / self.magnitude
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Slots that received no block.
    pub fn empty_slots(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }

    /// Hard bits of the codeword assuming it starts at fold slot `phase`:
    /// bit `i` is slot `(phase + i) mod period`.
    pub fn bits_at(&self, phase: usize) -> Vec<u8> {
        (0..self.period)
            .map(|i| u8::from(self.sums[(phase + i) % self.period] > 0.0))
            .collect()
    }

    /// First `n` bytes at `phase`, without building the full codeword.
    pub fn bytes_at(&self, phase: usize, n: usize) -> Vec<u8> {
        (0..n.min(self.period / 8))
            .map(|byte| {
                (0..8).fold(0u8, |acc, bit| {
                    let slot = (phase + byte * 8 + bit) % self.period;
                    (acc << 1) | u8::from(self.sums[slot] > 0.0)
                })
            })
            .collect()
    }
}
