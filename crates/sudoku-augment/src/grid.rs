use crate::{Error, Result};

/// A cell position on the 9x9 board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Index of the 3x3 block containing this cell (0..9, row-major over blocks)
    #[inline]
    pub const fn block(&self) -> usize {
        (self.row / 3) * 3 + self.col / 3
    }

    /// Index of this cell within its block (0..9, row-major within the block)
    #[inline]
    pub const fn block_cell(&self) -> usize {
        (self.row % 3) * 3 + self.col % 3
    }

    /// Inverse of (`block`, `block_cell`)
    #[inline]
    pub const fn from_block(block: usize, cell: usize) -> Self {
        Self {
            row: (block / 3) * 3 + cell / 3,
            col: (block % 3) * 3 + cell % 3,
        }
    }

    /// All 81 positions, row-major
    pub fn all() -> impl Iterator<Item = Position> {
        (0..9).flat_map(|row| (0..9).map(move |col| Position::new(row, col)))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}c{}", self.row + 1, self.col + 1)
    }
}

/// A 9x9 board of raw cell values. 0 marks an empty cell.
///
/// Values are not range-checked on construction; validation and encoding
/// reject anything outside the expected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: [[u8; 9]; 9],
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    pub const fn empty() -> Self {
        Self { cells: [[0; 9]; 9] }
    }

    pub const fn from_rows(cells: [[u8; 9]; 9]) -> Self {
        Self { cells }
    }

    /// Parse an 81-character board. Digits are values, `0` or `.` are empty.
    pub fn from_string(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.chars().count() != 81 {
            return None;
        }
        let mut grid = Self::empty();
        for (idx, ch) in s.chars().enumerate() {
            let value = match ch {
                '.' | '0' => 0,
                '1'..='9' => ch as u8 - b'0',
                _ => return None,
            };
            grid.cells[idx / 9][idx % 9] = value;
        }
        Some(grid)
    }

    /// Compact 81-character form, `.` for empty cells
    pub fn to_compact_string(&self) -> String {
        Position::all()
            .map(|pos| match self.get(pos) {
                0 => '.',
                v if v <= 9 => (b'0' + v) as char,
                _ => '?',
            })
            .collect()
    }

    #[inline]
    pub fn get(&self, pos: Position) -> u8 {
        self.cells[pos.row][pos.col]
    }

    #[inline]
    pub fn set(&mut self, pos: Position, value: u8) {
        self.cells[pos.row][pos.col] = value;
    }

    pub fn rows(&self) -> &[[u8; 9]; 9] {
        &self.cells
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [[u8; 9]; 9] {
        &mut self.cells
    }

    pub fn given_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v != 0).count()
    }

    pub fn empty_count(&self) -> usize {
        81 - self.given_count()
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, values) in self.cells.iter().enumerate() {
            if row > 0 && row % 3 == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for (col, &value) in values.iter().enumerate() {
                if col > 0 && col % 3 == 0 {
                    write!(f, "| ")?;
                }
                if value == 0 {
                    write!(f, ".")?;
                } else {
                    write!(f, "{}", value)?;
                }
                if col < 8 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// True iff every row, column and block is a permutation of 1..=9
pub fn is_valid_solution(solution: &Grid) -> bool {
    let mut rows = [0u16; 9];
    let mut cols = [0u16; 9];
    let mut blocks = [0u16; 9];

    for pos in Position::all() {
        let value = solution.get(pos);
        if !(1..=9).contains(&value) {
            return false;
        }
        let bit = 1u16 << value;
        if rows[pos.row] & bit != 0 || cols[pos.col] & bit != 0 || blocks[pos.block()] & bit != 0
        {
            return false;
        }
        rows[pos.row] |= bit;
        cols[pos.col] |= bit;
        blocks[pos.block()] |= bit;
    }
    true
}

/// True iff every puzzle cell is empty or matches the solution
pub fn is_consistent(puzzle: &Grid, solution: &Grid) -> bool {
    Position::all().all(|pos| {
        let given = puzzle.get(pos);
        given == 0 || given == solution.get(pos)
    })
}

/// A puzzle and its completed solution, always transformed together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    pub puzzle: Grid,
    pub solution: Grid,
}

impl Pair {
    pub const fn new(puzzle: Grid, solution: Grid) -> Self {
        Self { puzzle, solution }
    }

    /// Check the pair invariants, reporting the first one violated
    pub fn validate(&self) -> Result<()> {
        if let Some(pos) = Position::all().find(|&p| self.puzzle.get(p) > 9) {
            return Err(Error::InvalidInput(format!(
                "puzzle cell {} holds {}",
                pos,
                self.puzzle.get(pos)
            )));
        }
        if !is_valid_solution(&self.solution) {
            return Err(Error::InvalidInput(format!(
                "solution {} is not a completed board",
                self.solution.to_compact_string()
            )));
        }
        if !is_consistent(&self.puzzle, &self.solution) {
            return Err(Error::InvalidInput(format!(
                "puzzle {} disagrees with its solution",
                self.puzzle.to_compact_string()
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
