// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Blind extractor.
//!
//! The decoder knows neither the block alignment (a crop shifts it), nor how
//! many codeword copies the image holds, nor where a copy starts. It reads
//! one bitstream per alignment `(dy, dx) ∈ [0, 8)²` and slides a window of
//! every plausible codeword length over each byte stream, trying a
//! Reed-Solomon decode wherever a marker byte is in place. Successful
//! decodes are tallied by exact string and the most frequent one wins.
//!
//! When no window decodes (typically because a crop removed block columns,
//! so block rows no longer continue each other's bitstream), the strongest
//! alignments are folded modulo each plausible codeword period and row
//! stride (see [`StrideFold`]) and decoded at every phase.
//!
//! The search is bounded by `max_decode_attempts` and stops early once one
//! signature has `early_exit_votes` votes. Alignment (0, 0) is searched
//! first, so an uncropped image is normally done after a single scan. In
//! the parallel build an alignment that reaches the vote count raises a
//! shared flag and scans that have not started yet are skipped.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::raster::{BlockGrid, Channel, BLOCK};

use super::codec::{from_bits, MessageCodec};
use super::config::WatermarkConfig;
use super::error::{Result, WatermarkError};
use super::modulation::{decode_pair, CoefficientPair};
use super::tiling::StrideFold;

/// Raw bytes considered for the diagnostic hint.
const HINT_BYTES: usize = 50;

/// A hint needs more printable characters than this.
const HINT_MIN_CHARS: usize = 5;

/// Blocks used to rank (period, stride) candidates.
const FOLD_SCORE_BLOCKS: usize = 4096;

/// Result of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A signature decoded and won the vote.
    Found {
        signature: String,
        /// Successful decodes of this signature.
        votes: usize,
        /// Alignment `(dy, dx)` where it was first decoded.
        alignment: (usize, usize),
    },
    /// Nothing decoded.
    NotFound {
        /// Printable characters from the raw bytes of the strongest
        /// alignment. Best effort only; may be meaningless.
        hint: Option<String>,
    },
}

impl Extraction {
    pub fn signature(&self) -> Option<&str> {
        match self {
            Self::Found { signature, .. } => Some(signature),
            Self::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Found { .. } => None,
            Self::NotFound { hint } => hint.as_deref(),
        }
    }

    /// The signature, or [`WatermarkError::NoSignatureFound`].
    pub fn into_signature(self) -> Result<String> {
        match self {
            Self::Found { signature, .. } => Ok(signature),
            Self::NotFound { hint } => Err(WatermarkError::NoSignatureFound { hint }),
        }
    }
}

/// Recover the signature from a possibly attacked carrier channel.
///
/// Only an invalid configuration is an error; a channel with no
/// recognizable watermark (including one smaller than a block) yields
/// [`Extraction::NotFound`].
#[instrument(skip_all, fields(width = channel.width(), height = channel.height()))]
pub fn extract_channel(channel: &Channel, config: &WatermarkConfig) -> Result<Extraction> {
    config.validate()?;
    let search = Search::new(channel, config);

    let mut tally = Tally::default();
    let mut scans = Vec::with_capacity(BLOCK * BLOCK);

    if let Some((scan, found)) = search.alignment((0, 0)) {
        tally.merge(found);
        scans.push(scan);
    }

    if tally.top_votes() < config.early_exit_votes {
        let rest: Vec<(usize, usize)> = alignments().skip(1).collect();

        #[cfg(feature = "parallel")]
        {
            let results: Vec<(AlignmentScan, Tally)> =
                rest.par_iter().filter_map(|&offset| search.alignment(offset)).collect();
            for (scan, found) in results {
                tally.merge(found);
                scans.push(scan);
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            for &offset in &rest {
                let Some((scan, found)) = search.alignment(offset) else {
                    break;
                };
                tally.merge(found);
                scans.push(scan);
                if tally.top_votes() >= config.early_exit_votes {
                    break;
                }
            }
        }
    }

    if let Some(winner) = tally.leader() {
        info!(
            votes = winner.votes,
            candidates = tally.entries.len(),
            dy = winner.alignment.0,
            dx = winner.alignment.1,
            "signature recovered"
        );
        return Ok(Extraction::Found {
            signature: winner.signature.clone(),
            votes: winner.votes,
            alignment: winner.alignment,
        });
    }

    scans.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    debug!(scanned = scans.len(), "window search found nothing, folding strongest alignments");

    for scan in scans.iter().take(config.fold_alignments) {
        if let Some(signature) = search.fold(scan.offset) {
            info!(dy = scan.offset.0, dx = scan.offset.1, "signature recovered by stride fold");
            return Ok(Extraction::Found { signature, votes: 1, alignment: scan.offset });
        }
        if search.budget.exhausted() {
            break;
        }
    }

    if search.budget.exhausted() {
        warn!(limit = config.max_decode_attempts, "decode attempt budget exhausted");
    }
    let hint = scans.first().and_then(|scan| raw_hint(&scan.bytes));
    info!(hint = hint.as_deref().unwrap_or(""), "no signature found");
    Ok(Extraction::NotFound { hint })
}

/// `(0, 0)` first, then the other 63 offsets row-major.
fn alignments() -> impl Iterator<Item = (usize, usize)> {
    (0..BLOCK).flat_map(|dy| (0..BLOCK).map(move |dx| (dy, dx)))
}

/// Printable characters of the first raw bytes, if enough survive.
fn raw_hint(bytes: &[u8]) -> Option<String> {
    let raw = String::from_utf8_lossy(&bytes[..bytes.len().min(HINT_BYTES)]);
    let printable: String = raw
        .chars()
        .filter(|&c| !c.is_control() && c != char::REPLACEMENT_CHARACTER)
        .collect();
    (printable.chars().count() > HINT_MIN_CHARS).then_some(printable)
}

/// Per-call cap on RS decode attempts, shared by parallel alignment scans.
struct Budget(AtomicUsize);

impl Budget {
    fn new(limit: usize) -> Self {
        Self(AtomicUsize::new(limit))
    }

    /// Consume one attempt; false once the budget is spent.
    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }

    fn exhausted(&self) -> bool {
        self.0.load(Ordering::Relaxed) == 0
    }
}

/// Hard read-out of one alignment.
struct AlignmentScan {
    offset: (usize, usize),
    /// Bits packed MSB first, trailing partial byte dropped.
    bytes: Vec<u8>,
    /// Mean clamped |v2 - v1|; highest near the embedding alignment.
    strength: f64,
}

#[derive(Debug)]
struct Candidate {
    signature: String,
    votes: usize,
    alignment: (usize, usize),
}

/// Votes per distinct signature, in discovery order.
#[derive(Debug, Default)]
struct Tally {
    entries: Vec<Candidate>,
}

impl Tally {
    fn record(&mut self, signature: String, alignment: (usize, usize)) {
        self.add(signature, 1, alignment);
    }

    fn add(&mut self, signature: String, votes: usize, alignment: (usize, usize)) {
        match self.entries.iter_mut().find(|c| c.signature == signature) {
            Some(existing) => existing.votes += votes,
            None => self.entries.push(Candidate { signature, votes, alignment }),
        }
    }

    fn merge(&mut self, other: Tally) {
        for c in other.entries {
            self.add(c.signature, c.votes, c.alignment);
        }
    }

    fn top_votes(&self) -> usize {
        self.entries.iter().map(|c| c.votes).max().unwrap_or(0)
    }

    /// Most votes; ties go to the earliest discovered.
    fn leader(&self) -> Option<&Candidate> {
        self.entries.iter().fold(None, |best: Option<&Candidate>, c| match best {
            Some(b) if b.votes >= c.votes => Some(b),
            _ => Some(c),
        })
    }
}

/// Everything one extraction call shares across alignments.
struct Search<'a> {
    channel: &'a Channel,
    pair: CoefficientPair,
    codec: MessageCodec,
    lengths: RangeInclusive<usize>,
    /// Soft values are clamped to ±this so textured blocks cannot dominate a fold.
    clamp: f32,
    stop_at: usize,
    budget: Budget,
    /// Set once a single alignment reaches `stop_at` votes.
    settled: AtomicBool,
}

impl<'a> Search<'a> {
    fn new(channel: &'a Channel, config: &WatermarkConfig) -> Self {
        let codec = MessageCodec::from_config(config);
        let lengths = codec.codeword_len_range(config.max_signature_len);
        Self {
            channel,
            pair: config.pair,
            codec,
            lengths,
            clamp: (2.0 * config.margin) as f32,
            stop_at: config.early_exit_votes,
            budget: Budget::new(config.max_decode_attempts),
            settled: AtomicBool::new(false),
        }
    }

    /// Clamped `v2 - v1` for every block of the grid at `offset`.
    fn soft_values(&self, offset: (usize, usize)) -> (BlockGrid, Vec<f32>) {
        let blocks = self.channel.blocks(offset.0, offset.1);
        let grid = blocks.grid();
        let values = blocks
            .map(|(_, _, block)| {
                let (v1, v2) = self.pair.project(&block);
                ((v2 - v1) as f32).clamp(-self.clamp, self.clamp)
            })
            .collect();
        (grid, values)
    }

    /// Scan one alignment and run the sliding-window search over it; `None`
    /// once another alignment has already settled the vote.
    fn alignment(&self, offset: (usize, usize)) -> Option<(AlignmentScan, Tally)> {
        if self.settled.load(Ordering::Relaxed) {
            return None;
        }
        let (_, values) = self.soft_values(offset);
        let bits: Vec<u8> = values.iter().map(|&d| decode_pair(0.0, d as f64)).collect();
        let strength = if values.is_empty() {
            0.0
        } else {
            values.iter().map(|v| v.abs() as f64).sum::<f64>() / values.len() as f64
        };
        let scan = AlignmentScan { offset, bytes: from_bits(&bits), strength };
        let tally = self.windows(&scan);
        if tally.top_votes() >= self.stop_at {
            self.settled.store(true, Ordering::Relaxed);
        }
        Some((scan, tally))
    }

    /// Try every start byte and codeword length; after a hit, jump to the
    /// byte after it, where the next tiled copy starts.
    fn windows(&self, scan: &AlignmentScan) -> Tally {
        let mut tally = Tally::default();
        let bytes = &scan.bytes;
        let min_len = *self.lengths.start();
        let mut start = 0;

        while start + min_len <= bytes.len() {
            if !self.codec.marker_plausible(&bytes[start..]) {
                start += 1;
                continue;
            }
            let mut hit = None;
            for len in self.lengths.clone() {
                if start + len > bytes.len() {
                    break;
                }
                if !self.budget.take() {
                    return tally;
                }
                if let Ok(signature) = self.codec.decode(&bytes[start..start + len]) {
                    hit = Some((signature, len));
                    break;
                }
            }
            match hit {
                Some((signature, len)) => {
                    tally.record(signature, scan.offset);
                    if tally.top_votes() >= self.stop_at {
                        break;
                    }
                    start += len;
                }
                None => start += 1,
            }
        }
        if !tally.entries.is_empty() {
            debug!(dy = scan.offset.0, dx = scan.offset.1, votes = tally.top_votes(), "window hits");
        }
        tally
    }

    /// Stride-fold recovery at one alignment.
    fn fold(&self, offset: (usize, usize)) -> Option<String> {
        let (grid, values) = self.soft_values(offset);
        if grid.is_empty() {
            return None;
        }
        let sample_rows = (FOLD_SCORE_BLOCKS / grid.cols).clamp(1, grid.rows);
        let sample = &values[..sample_rows * grid.cols];

        // Best stride per period, then all periods by agreement.
        let mut ranked: Vec<(f64, usize, usize)> = Vec::new();
        for len in self.lengths.clone() {
            let period = len * 8;
            if values.len() < period {
                continue;
            }
            let best = (0..period)
                .map(|stride| (StrideFold::new(sample, grid.cols, period, stride).agreement(), stride))
                .fold((f64::MIN, 0), |best, cur| if cur.0 > best.0 { cur } else { best });
            ranked.push((best.0, period, best.1));
        }
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let marker_len = self.codec.marker().len();
        for (agreement, period, stride) in ranked {
            let fold = StrideFold::new(&values, grid.cols, period, stride);
            for phase in 0..period {
                if !self.codec.marker_plausible(&fold.bytes_at(phase, marker_len)) {
                    continue;
                }
                if !self.budget.take() {
                    return None;
                }
                if let Ok(signature) = self.codec.decode(&from_bits(&fold.bits_at(phase))) {
                    debug!(period, stride, phase, agreement, empty = fold.empty_slots(), "fold decoded");
                    return Some(signature);
                }
            }
        }
        None
    }
}
