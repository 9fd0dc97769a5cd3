//! Source corpus capability and a line-oriented file reader.

use std::convert::Infallible;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::{Grid, Pair};

/// Anything that can hand over an ordered list of puzzle/solution pairs.
///
/// Loading happens once per generation run. Errors are passed through to the
/// caller untouched.
pub trait CorpusSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&mut self) -> Result<Vec<Pair>, Self::Error>;
}

/// Pairs already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus(pub Vec<Pair>);

impl CorpusSource for InMemoryCorpus {
    type Error = Infallible;

    fn load(&mut self) -> Result<Vec<Pair>, Self::Error> {
        Ok(self.0.clone())
    }
}

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no puzzles found in {0}")]
    Empty(PathBuf),
}

/// Text corpus with one pair per line:
///
/// ```text
/// # puzzle                                                                          solution
/// 53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79 534678912672195348...
/// ```
///
/// Puzzle and solution are 81-character boards (`0` or `.` for empty)
/// separated by whitespace or a comma. Blank lines and `#` comments are skipped.
#[derive(Debug, Clone)]
pub struct FileCorpus {
    path: PathBuf,
}

impl FileCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<Pair, CorpusError> {
        let parse_err = |reason: String| CorpusError::Parse {
            path: self.path.clone(),
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() != 2 {
            return Err(parse_err(format!(
                "expected puzzle and solution, found {} field(s)",
                fields.len()
            )));
        }

        let puzzle = Grid::from_string(fields[0])
            .ok_or_else(|| parse_err("puzzle is not an 81-cell board".to_string()))?;
        let solution = Grid::from_string(fields[1])
            .ok_or_else(|| parse_err("solution is not an 81-cell board".to_string()))?;
        if solution.empty_count() != 0 {
            return Err(parse_err(format!(
                "solution has {} empty cell(s)",
                solution.empty_count()
            )));
        }
        Ok(Pair::new(puzzle, solution))
    }
}

impl CorpusSource for FileCorpus {
    type Error = CorpusError;

    fn load(&mut self) -> Result<Vec<Pair>, Self::Error> {
        let io_err = |source| CorpusError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(io_err)?;

        let mut pairs = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            pairs.push(self.parse_line(idx + 1, trimmed)?);
        }

        if pairs.is_empty() {
            return Err(CorpusError::Empty(self.path.clone()));
        }
        info!("Loaded {} puzzles from {}", pairs.len(), self.path.display());
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::canonical_pair;
    use std::io::Write;

    fn write_corpus(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_pairs() {
        let pair = canonical_pair();
        let contents = format!(
            "# header\n\n{} {}\n{},{}\n",
            pair.puzzle.to_compact_string(),
            pair.solution.to_compact_string(),
            pair.puzzle.to_compact_string().replace('.', "0"),
            pair.solution.to_compact_string(),
        );
        let file = write_corpus(&contents);
        let pairs = FileCorpus::new(file.path()).load().unwrap();
        assert_eq!(pairs, vec![pair, pair]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let pair = canonical_pair();
        let contents = format!(
            "{} {}\nnot-a-board {}\n",
            pair.puzzle.to_compact_string(),
            pair.solution.to_compact_string(),
            pair.solution.to_compact_string(),
        );
        let file = write_corpus(&contents);
        let err = FileCorpus::new(file.path()).load().unwrap_err();
        assert!(matches!(err, CorpusError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_solution_with_blanks_rejected() {
        let pair = canonical_pair();
        let puzzle = pair.puzzle.to_compact_string();
        let file = write_corpus(&format!("{puzzle} {puzzle}\n"));
        let err = FileCorpus::new(file.path()).load().unwrap_err();
        assert!(matches!(err, CorpusError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_empty_and_missing() {
        let file = write_corpus("# nothing here\n");
        assert!(matches!(
            FileCorpus::new(file.path()).load(),
            Err(CorpusError::Empty(_))
        ));
        assert!(matches!(
            FileCorpus::new("/definitely/not/here.txt").load(),
            Err(CorpusError::Io { .. })
        ));
    }

    #[test]
    fn test_in_memory() {
        let mut corpus = InMemoryCorpus(vec![canonical_pair()]);
        assert_eq!(corpus.load().unwrap().len(), 1);
    }
}
