use std::path::PathBuf;

use thiserror::Error;

use crate::Position;

/// Which half of a pair a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridRole {
    Puzzle,
    Solution,
}

impl std::fmt::Display for GridRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridRole::Puzzle => write!(f, "puzzle"),
            GridRole::Solution => write!(f, "solution"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot encode sample {sample}: {role} cell {position} holds {value}")]
    Encoding {
        sample: usize,
        role: GridRole,
        position: Position,
        value: u8,
    },

    #[error("corpus load failed: {0}")]
    CorpusLoad(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("output file {0} exists (use overwrite)")]
    OutputExists(PathBuf),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
