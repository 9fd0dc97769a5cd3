//! Sudoku training-data generator.
//!
//! Expands a small corpus of solved puzzles through board-preserving symmetries
//! and encodes the result as block-partitioned one-hot tensors.

mod augment;
mod corpus;
mod encode;
mod error;
mod grid;
mod pipeline;
mod symmetry;
mod writer;

pub use augment::{augment_pair, sample_stack, Augmenter, SwapPolicy};
pub use corpus::{CorpusError, CorpusSource, FileCorpus, InMemoryCorpus};
pub use encode::{
    decode_puzzle, decode_solution, encode, EncodedBatch, Tensor, MAX_SAMPLES, PUZZLE_CHANNELS,
    SOLUTION_CHANNELS,
};
pub use error::{Error, GridRole, Result};
pub use grid::{is_consistent, is_valid_solution, Grid, Pair, Position};
pub use pipeline::{derive_factor, generate, GenerateOptions, GeneratedDataset};
pub use symmetry::{DigitMap, Order3, Symmetry, SymmetryStack};
pub use writer::{write_dataset, write_tensor_npy, DatasetMetadata};
