// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedder: codeword → tiled bitstream → one modulated pair per block.

use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::raster::{dct, Block, BlockGrid, Channel};

use super::codec::{to_bits, MessageCodec};
use super::config::WatermarkConfig;
use super::error::{Result, WatermarkError};
use super::modulation::Modulator;
use super::signature::Signature;
use super::tiling;

/// Statistics of one embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbedReport {
    /// Blocks in the grid (= embedded bits).
    pub blocks: usize,
    /// Codeword length in bytes.
    pub codeword_len: usize,
    /// Complete codeword copies in the grid.
    pub full_copies: usize,
    /// Blocks whose pair had to be rewritten.
    pub changed_blocks: usize,
    /// Blocks where the margin did not survive the simulated store.
    pub weak_blocks: usize,
}

/// Embed `signature` into a copy of `channel`.
///
/// `signature` must parse as a [`Signature`] and be at most
/// `max_signature_len` bytes, the longest the extractor searches for.
/// Blocks are walked row-major at offset (0, 0); block `i` carries bit
/// `i mod 8·codeword_len`. The input channel is not modified.
#[instrument(skip_all, fields(width = channel.width(), height = channel.height(), len = signature.len()))]
pub fn embed_channel(channel: &Channel, signature: &str, config: &WatermarkConfig) -> Result<(Channel, EmbedReport)> {
    config.validate()?;
    let codec = MessageCodec::from_config(config);
    let modulator = Modulator::from_config(config);

    let signature = signature.parse::<Signature>()?.to_string();
    let max = config.max_signature_len.min(codec.max_payload_len());
    if signature.len() > max {
        return Err(WatermarkError::EncodingTooLarge { len: signature.len(), max });
    }
    let codeword = codec.encode(&signature)?;
    let bits = to_bits(&codeword);
    let grid = channel.grid(0, 0);
    if grid.len() < bits.len() {
        return Err(WatermarkError::CapacityExceeded { needed: bits.len(), available: grid.len() });
    }
    let tiled = tiling::tile(&bits, grid.len());
    debug!(
        blocks = grid.len(),
        codeword_len = codeword.len(),
        copies = grid.len() as f64 / bits.len() as f64,
        "tiling codeword"
    );

    let modulate = |index: usize| -> (Block, bool, bool) {
        let (row, col) = grid.origin(index);
        let coeffs = dct::forward(&channel.read_block(row, col));
        let out = modulator.encode_bit(&coeffs, tiled[index]);
        (dct::settle(&dct::inverse(&out.coeffs)), out.changed, out.achieved)
    };

    #[cfg(feature = "parallel")]
    let blocks: Vec<(Block, bool, bool)> = (0..grid.len()).into_par_iter().map(modulate).collect();
    #[cfg(not(feature = "parallel"))]
    let blocks: Vec<(Block, bool, bool)> = (0..grid.len()).map(modulate).collect();

    let mut marked = channel.clone();
    let mut report = EmbedReport {
        blocks: grid.len(),
        codeword_len: codeword.len(),
        full_copies: tiling::full_copies(bits.len(), grid.len()),
        ..EmbedReport::default()
    };
    write_blocks(&mut marked, &grid, &blocks, &mut report);

    if report.weak_blocks > 0 {
        warn!(weak = report.weak_blocks, blocks = report.blocks, "margin not reached in some blocks");
    }
    info!(
        copies = report.full_copies,
        changed = report.changed_blocks,
        "signature embedded"
    );
    Ok((marked, report))
}

fn write_blocks(target: &mut Channel, grid: &BlockGrid, blocks: &[(Block, bool, bool)], report: &mut EmbedReport) {
    for (index, (block, changed, achieved)) in blocks.iter().enumerate() {
        let (row, col) = grid.origin(index);
        target.write_block(row, col, block);
        report.changed_blocks += usize::from(*changed);
        report.weak_blocks += usize::from(!*achieved);
    }
}
