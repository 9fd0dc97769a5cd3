//! One-hot tensor encoding.
//!
//! Both tensors are addressed by (sample, block, cell-in-block, channel) using
//! `Position::block` / `Position::block_cell`. Downstream trainers rely on this
//! layout, so it must not change independently of them.

use log::debug;
use rayon::prelude::*;

use crate::{Error, Grid, GridRole, Pair, Position, Result};

/// Channels per puzzle cell: index 0 is "empty", 1..=9 the digit
pub const PUZZLE_CHANNELS: usize = 10;
/// Channels per solution cell: index d-1 for digit d
pub const SOLUTION_CHANNELS: usize = 9;

const CELLS: usize = 81;

/// Largest batch whose puzzle tensor (the wider of the two) fits in a
/// single allocation
pub const MAX_SAMPLES: usize =
    isize::MAX as usize / (CELLS * PUZZLE_CHANNELS * std::mem::size_of::<f32>());

/// Dense row-major 4-D `f32` tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor. Fails instead of aborting when the element count
    /// overflows or the buffer cannot be allocated.
    pub fn zeros(shape: [usize; 4]) -> Result<Self> {
        let len = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<f32>())
            .ok_or_else(|| Error::InvalidInput(format!("tensor shape {shape:?} is too large")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|err| {
            Error::InvalidInput(format!("cannot allocate tensor {shape:?}: {err}"))
        })?;
        data.resize(len, 0.0);
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn samples(&self) -> usize {
        self.shape[0]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    fn offset(&self, sample: usize, block: usize, cell: usize, channel: usize) -> usize {
        ((sample * self.shape[1] + block) * self.shape[2] + cell) * self.shape[3] + channel
    }

    pub fn get(&self, sample: usize, block: usize, cell: usize, channel: usize) -> f32 {
        self.data[self.offset(sample, block, cell, channel)]
    }

    /// The one-hot vector for a cell
    pub fn cell(&self, sample: usize, block: usize, cell: usize) -> &[f32] {
        let start = self.offset(sample, block, cell, 0);
        &self.data[start..start + self.shape[3]]
    }

    /// Channel of the single `1.0` entry, or `None` if the cell is not one-hot
    pub fn one_hot_index(&self, sample: usize, block: usize, cell: usize) -> Option<usize> {
        let vector = self.cell(sample, block, cell);
        let mut hot = None;
        for (channel, &value) in vector.iter().enumerate() {
            if value == 1.0 {
                if hot.is_some() {
                    return None;
                }
                hot = Some(channel);
            } else if value != 0.0 {
                return None;
            }
        }
        hot
    }
}

/// Encoded inputs `x` (N, 9, 9, 10) and targets `y` (N, 9, 9, 9)
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    pub x: Tensor,
    pub y: Tensor,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.x.samples()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encode pairs into block-partitioned one-hot tensors.
///
/// Fails on the first out-of-range cell; no partial batch is returned.
pub fn encode(pairs: &[Pair]) -> Result<EncodedBatch> {
    let n = pairs.len();
    if n > MAX_SAMPLES {
        return Err(Error::InvalidInput(format!(
            "{n} samples exceeds the {MAX_SAMPLES} sample limit"
        )));
    }
    let mut x = Tensor::zeros([n, 9, 9, PUZZLE_CHANNELS])?;
    let mut y = Tensor::zeros([n, 9, 9, SOLUTION_CHANNELS])?;

    if n > 0 {
        x.data
            .par_chunks_mut(CELLS * PUZZLE_CHANNELS)
            .zip(y.data.par_chunks_mut(CELLS * SOLUTION_CHANNELS))
            .zip(pairs.par_iter())
            .enumerate()
            .try_for_each(|(sample, ((xs, ys), pair))| encode_one(sample, pair, xs, ys))?;
    }

    debug!("Encoded {} samples", n);
    Ok(EncodedBatch { x, y })
}

fn encode_one(sample: usize, pair: &Pair, xs: &mut [f32], ys: &mut [f32]) -> Result<()> {
    for pos in Position::all() {
        let slot = pos.block() * 9 + pos.block_cell();

        let given = pair.puzzle.get(pos);
        if given > 9 {
            return Err(Error::Encoding {
                sample,
                role: GridRole::Puzzle,
                position: pos,
                value: given,
            });
        }
        xs[slot * PUZZLE_CHANNELS + given as usize] = 1.0;

        let answer = pair.solution.get(pos);
        if !(1..=9).contains(&answer) {
            return Err(Error::Encoding {
                sample,
                role: GridRole::Solution,
                position: pos,
                value: answer,
            });
        }
        ys[slot * SOLUTION_CHANNELS + answer as usize - 1] = 1.0;
    }
    Ok(())
}

/// Rebuild the puzzle grid of one sample. `None` if any cell is not one-hot.
pub fn decode_puzzle(x: &Tensor, sample: usize) -> Option<Grid> {
    decode(x, sample, 0)
}

/// Rebuild the solution grid of one sample. `None` if any cell is not one-hot.
pub fn decode_solution(y: &Tensor, sample: usize) -> Option<Grid> {
    decode(y, sample, 1)
}

fn decode(tensor: &Tensor, sample: usize, digit_offset: u8) -> Option<Grid> {
    if sample >= tensor.samples() {
        return None;
    }
    let mut grid = Grid::empty();
    for pos in Position::all() {
        let channel = tensor.one_hot_index(sample, pos.block(), pos.block_cell())?;
        grid.set(pos, channel as u8 + digit_offset);
    }
    Some(grid)
}
