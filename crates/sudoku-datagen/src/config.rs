use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sudoku_augment::SwapPolicy;

/// Persistent generator settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatagenConfig {
    /// Total samples requested
    pub samples: usize,
    /// Corpus file, one `<puzzle> <solution>` pair per line
    pub corpus: PathBuf,
    /// Directory receiving x.npy, y.npy and metadata.json
    pub output: PathBuf,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    pub policy: SwapPolicy,
    pub overwrite: bool,
    /// Number of random samples to print after generation
    pub preview: usize,
}

impl Default for DatagenConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            corpus: PathBuf::from("puzzles.txt"),
            output: PathBuf::from("dataset"),
            seed: None,
            workers: None,
            policy: SwapPolicy::default(),
            overwrite: false,
            preview: 0,
        }
    }
}

impl DatagenConfig {
    /// Default config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sudoku-datagen").join("config.json"))
    }

    /// Load from an explicit path. Missing or malformed files are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Load the explicit path if given, else the default location if it
    /// exists, else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }
}
