// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Single-channel sample buffers and their 8×8 block grid.
//!
//! A [`Channel`] is one plane of 8-bit samples (one colour component or a
//! luma plane). The watermark layer never sees whole images: it reads and
//! writes blocks of a channel through [`Channel::blocks`] and
//! [`Channel::write_block`], and the frequency transform lives in [`dct`].
//!
//! Image decoding, carrier selection and attack simulation are behind the
//! `image` feature in [`carrier`] and [`attack`].

pub mod dct;

#[cfg(feature = "image")]
pub mod attack;
#[cfg(feature = "image")]
pub mod carrier;

use thiserror::Error;

/// Edge length of a block in samples.
pub const BLOCK: usize = 8;

/// Number of samples in one block.
pub const BLOCK_LEN: usize = BLOCK * BLOCK;

/// 64 values of one block in row-major order (`y * 8 + x`).
///
/// Used for both spatial samples and DCT coefficients; for coefficients the
/// index is `v * 8 + u` (vertical frequency first).
pub type Block = [f64; BLOCK_LEN];

/// Errors for malformed sample buffers and image I/O.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The sample buffer does not hold `width * height` samples.
    #[error("sample buffer holds {actual} samples, expected {expected}")]
    Shape { expected: usize, actual: usize },

    /// A row of a 2D sample array differs in length from the first row.
    #[error("row {row} has {len} samples, expected {expected}")]
    RaggedRows { row: usize, len: usize, expected: usize },

    /// Region lies outside the channel.
    #[error("region {width}x{height} at ({x}, {y}) exceeds the {bound_w}x{bound_h} channel")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        bound_w: usize,
        bound_h: usize,
    },

    /// Image decoding or encoding failed.
    #[cfg(feature = "image")]
    #[error("image codec: {0}")]
    Image(#[from] image::ImageError),
}

/// Grid of whole 8×8 blocks inside a `height × width` plane, starting at a
/// sub-block offset. Blocks that would run past the plane edge are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    pub offset_y: usize,
    pub offset_x: usize,
    /// Number of block rows.
    pub rows: usize,
    /// Number of block columns.
    pub cols: usize,
}

impl BlockGrid {
    pub fn new(height: usize, width: usize, offset_y: usize, offset_x: usize) -> Self {
        Self {
            offset_y,
            offset_x,
            rows: height.saturating_sub(offset_y) / BLOCK,
            cols: width.saturating_sub(offset_x) / BLOCK,
        }
    }

    /// Total number of blocks (the bit capacity of the grid).
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-left sample position `(row, col)` of the `index`-th block in
    /// row-major order.
    pub fn origin(&self, index: usize) -> (usize, usize) {
        debug_assert!(index < self.len(), "block index {index} out of range");
        let br = index / self.cols;
        let bc = index % self.cols;
        (self.offset_y + br * BLOCK, self.offset_x + bc * BLOCK)
    }
}

/// One plane of 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl Channel {
    /// Wrap a row-major sample buffer.
    ///
    /// Zero-sized channels are allowed; they simply have no blocks.
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width * height;
        if samples.len() != expected {
            return Err(RasterError::Shape { expected, actual: samples.len() });
        }
        Ok(Self { width, height, samples })
    }

    /// A channel with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self { width, height, samples: vec![value; width * height] }
    }

    /// Build a channel from a 2D array of rows.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, RasterError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut samples = Vec::with_capacity(width * height);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != width {
                return Err(RasterError::RaggedRows { row, len: r.len(), expected: width });
            }
            samples.extend_from_slice(r);
        }
        Ok(Self { width, height, samples })
    }

    /// Copy the channel out as a 2D array of rows.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.samples.chunks(self.width).map(<[u8]>::to_vec).collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Sample at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.samples[row * self.width + col]
    }

    /// Block grid at the given sub-block offset.
    pub fn grid(&self, offset_y: usize, offset_x: usize) -> BlockGrid {
        BlockGrid::new(self.height, self.width, offset_y, offset_x)
    }

    /// Number of whole blocks at offset (0, 0): one embedded bit each.
    pub fn block_capacity(&self) -> usize {
        self.grid(0, 0).len()
    }

    /// Lazy iterator over the whole blocks at `(offset_y, offset_x)`, row-major.
    ///
    /// Yields `(row, col, block)` with the sample position of the block's
    /// top-left corner. The iterator is `Clone`, so a sequence can be
    /// restarted from any point.
    pub fn blocks(&self, offset_y: usize, offset_x: usize) -> Blocks<'_> {
        Blocks { channel: self, grid: self.grid(offset_y, offset_x), next: 0 }
    }

    /// Read the 8×8 block with top-left corner `(row, col)` as floats.
    pub fn read_block(&self, row: usize, col: usize) -> Block {
        debug_assert!(row + BLOCK <= self.height && col + BLOCK <= self.width);
        let mut block = [0.0f64; BLOCK_LEN];
        for y in 0..BLOCK {
            let start = (row + y) * self.width + col;
            for (x, &s) in self.samples[start..start + BLOCK].iter().enumerate() {
                block[y * BLOCK + x] = s as f64;
            }
        }
        block
    }

    /// Write a block of already-settled samples (see [`dct::settle`]) back.
    pub fn write_block(&mut self, row: usize, col: usize, block: &Block) {
        debug_assert!(row + BLOCK <= self.height && col + BLOCK <= self.width);
        for y in 0..BLOCK {
            let start = (row + y) * self.width + col;
            for x in 0..BLOCK {
                self.samples[start + x] = block[y * BLOCK + x].round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Copy out a rectangular region.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Channel, RasterError> {
        if x + width > self.width || y + height > self.height {
            return Err(RasterError::OutOfBounds {
                x,
                y,
                width,
                height,
                bound_w: self.width,
                bound_h: self.height,
            });
        }
        let mut samples = Vec::with_capacity(width * height);
        for row in y..y + height {
            let start = row * self.width + x;
            samples.extend_from_slice(&self.samples[start..start + width]);
        }
        Ok(Channel { width, height, samples })
    }
}

/// Iterator returned by [`Channel::blocks`].
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    channel: &'a Channel,
    grid: BlockGrid,
    next: usize,
}

impl Blocks<'_> {
    pub fn grid(&self) -> BlockGrid {
        self.grid
    }
}

impl Iterator for Blocks<'_> {
    type Item = (usize, usize, Block);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.grid.len() {
            return None;
        }
        let (row, col) = self.grid.origin(self.next);
        self.next += 1;
        Some((row, col, self.channel.read_block(row, col)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.grid.len() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Blocks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Channel {
        let samples = (0..width * height).map(|i| (i % 251) as u8).collect();
        Channel::new(width, height, samples).unwrap()
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = Channel::new(4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(err, RasterError::Shape { expected: 16, actual: 15 }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![1u8, 2, 3], vec![4, 5]];
        assert!(matches!(
            Channel::from_rows(&rows),
            Err(RasterError::RaggedRows { row: 1, len: 2, expected: 3 })
        ));
    }

    #[test]
    fn rows_roundtrip() {
        let ch = ramp(13, 7);
        let back = Channel::from_rows(&ch.to_rows()).unwrap();
        assert_eq!(back, ch);
    }

    #[test]
    fn grid_skips_partial_blocks() {
        let grid = BlockGrid::new(70, 30, 0, 0);
        assert_eq!((grid.rows, grid.cols), (8, 3));
        let shifted = BlockGrid::new(70, 30, 7, 7);
        assert_eq!((shifted.rows, shifted.cols), (7, 2));
        assert_eq!(shifted.origin(0), (7, 7));
        assert_eq!(shifted.origin(3), (15, 15));
    }

    #[test]
    fn tiny_channel_has_no_blocks() {
        let ch = Channel::filled(7, 100, 128);
        assert_eq!(ch.block_capacity(), 0);
        assert_eq!(ch.blocks(0, 0).count(), 0);
        let empty = Channel::new(0, 0, Vec::new()).unwrap();
        assert_eq!(empty.blocks(3, 3).count(), 0);
    }

    #[test]
    fn blocks_are_restartable() {
        let ch = ramp(40, 24);
        let mut it = ch.blocks(2, 3);
        assert_eq!(it.len(), 2 * 4);
        it.next();
        let resumed = it.clone();
        assert_eq!(it.collect::<Vec<_>>(), resumed.collect::<Vec<_>>());

        let positions: Vec<_> = ch.blocks(2, 3).map(|(r, c, _)| (r, c)).collect();
        assert_eq!(positions[0], (2, 3));
        assert_eq!(positions[4], (10, 3));
    }

    #[test]
    fn block_read_write_roundtrip() {
        let mut ch = ramp(24, 16);
        let block = ch.read_block(8, 8);
        assert_eq!(block[0], ch.get(8, 8) as f64);
        assert_eq!(block[63], ch.get(15, 15) as f64);

        let mut bright = block;
        bright.iter_mut().for_each(|s| *s += 300.0);
        ch.write_block(8, 8, &bright);
        assert_eq!(ch.get(9, 9), 255);
        assert_eq!(ch.get(0, 0), 0);
    }

    #[test]
    fn crop_copies_region() {
        let ch = ramp(20, 10);
        let sub = ch.crop(3, 2, 5, 4).unwrap();
        assert_eq!((sub.width(), sub.height()), (5, 4));
        assert_eq!(sub.get(0, 0), ch.get(2, 3));
        assert_eq!(sub.get(3, 4), ch.get(5, 7));
        assert!(ch.crop(18, 0, 5, 1).is_err());
    }
}
