//! Board-preserving symmetries.
//!
//! Every operation maps a valid pair to a valid pair and is applied to the
//! puzzle and the solution together. Parameters are chosen by the caller;
//! nothing here draws random numbers.

use crate::{Error, Grid, Pair, Position, Result};

/// A permutation of three slots: rows within a band, columns within a stack,
/// bands, or stacks. `order[i]` is the source slot that lands in slot `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Order3([u8; 3]);

impl Default for Order3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Order3 {
    pub const IDENTITY: Order3 = Order3([0, 1, 2]);

    /// All six orderings
    pub const ALL: [Order3; 6] = [
        Order3([0, 1, 2]),
        Order3([0, 2, 1]),
        Order3([1, 0, 2]),
        Order3([1, 2, 0]),
        Order3([2, 0, 1]),
        Order3([2, 1, 0]),
    ];

    /// The single-pair exchanges (0,1), (1,2) and (0,2)
    pub const TRANSPOSITIONS: [Order3; 3] = [
        Order3([1, 0, 2]),
        Order3([0, 2, 1]),
        Order3([2, 1, 0]),
    ];

    pub fn new(order: [u8; 3]) -> Option<Self> {
        let mut seen = [false; 3];
        for &slot in &order {
            let slot = slot as usize;
            if slot >= 3 || seen[slot] {
                return None;
            }
            seen[slot] = true;
        }
        Some(Self(order))
    }

    /// Exchange slots `a` and `b`, leaving the third in place
    pub fn swap(a: usize, b: usize) -> Option<Self> {
        if a >= 3 || b >= 3 {
            return None;
        }
        let mut order = [0u8, 1, 2];
        order.swap(a, b);
        Some(Self(order))
    }

    #[inline]
    pub fn source(&self, slot: usize) -> usize {
        self.0[slot] as usize
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The ordering equivalent to applying `self` and then `next`
    pub fn then(&self, next: Order3) -> Order3 {
        Order3([
            self.0[next.0[0] as usize],
            self.0[next.0[1] as usize],
            self.0[next.0[2] as usize],
        ])
    }

    pub fn inverse(&self) -> Order3 {
        let mut inv = [0u8; 3];
        for (slot, &src) in self.0.iter().enumerate() {
            inv[src as usize] = slot as u8;
        }
        Order3(inv)
    }

    pub fn as_array(&self) -> [u8; 3] {
        self.0
    }
}

/// A bijection over the digits 1..=9. Empty cells (0) map to themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigitMap([u8; 10]);

impl Default for DigitMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl DigitMap {
    pub fn identity() -> Self {
        Self([0, 1, 2, 3, 4, 5, 6, 7, 8, 9])
    }

    /// `targets[d - 1]` is the image of digit `d`
    pub fn new(targets: [u8; 9]) -> Result<Self> {
        let mut seen = [false; 10];
        let mut map = [0u8; 10];
        for (idx, &target) in targets.iter().enumerate() {
            if !(1..=9).contains(&target) {
                return Err(Error::InvalidInput(format!(
                    "digit map sends {} to {}, outside 1-9",
                    idx + 1,
                    target
                )));
            }
            if seen[target as usize] {
                return Err(Error::InvalidInput(format!(
                    "digit map sends two digits to {}",
                    target
                )));
            }
            seen[target as usize] = true;
            map[idx + 1] = target;
        }
        Ok(Self(map))
    }

    /// Build from a rearrangement of `[1, 2, ..., 9]` without re-checking it.
    /// Callers must only pass a shuffle of the digits.
    pub(crate) fn from_permuted_digits(targets: [u8; 9]) -> Self {
        debug_assert!(Self::new(targets).is_ok(), "not a permutation: {targets:?}");
        let mut map = [0u8; 10];
        map[1..].copy_from_slice(&targets);
        Self(map)
    }

    /// Image of a cell value. Values outside 0..=9 pass through unchanged.
    #[inline]
    pub fn map(&self, value: u8) -> u8 {
        self.0.get(value as usize).copied().unwrap_or(value)
    }

    pub fn inverse(&self) -> DigitMap {
        let mut inv = [0u8; 10];
        for digit in 0..10u8 {
            inv[self.0[digit as usize] as usize] = digit;
        }
        DigitMap(inv)
    }

    pub fn targets(&self) -> [u8; 9] {
        let mut out = [0u8; 9];
        out.copy_from_slice(&self.0[1..]);
        out
    }
}

/// One of the six symmetry kinds with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symmetry {
    /// Rename digits through a bijection
    Relabel(DigitMap),
    /// Reorder the three rows of one band
    RowsInBand { band: usize, order: Order3 },
    /// Reorder the three columns of one stack
    ColsInStack { stack: usize, order: Order3 },
    /// Reorder whole bands
    Bands(Order3),
    /// Reorder whole stacks
    Stacks(Order3),
    /// Swap rows and columns
    Transpose,
}

impl Symmetry {
    /// Build a within-band row reordering, rejecting a band outside 0..3
    pub fn rows_in_band(band: usize, order: Order3) -> Result<Self> {
        if band >= 3 {
            return Err(Error::InvalidInput(format!("band {} out of range", band)));
        }
        Ok(Symmetry::RowsInBand { band, order })
    }

    /// Build a within-stack column reordering, rejecting a stack outside 0..3
    pub fn cols_in_stack(stack: usize, order: Order3) -> Result<Self> {
        if stack >= 3 {
            return Err(Error::InvalidInput(format!("stack {} out of range", stack)));
        }
        Ok(Symmetry::ColsInStack { stack, order })
    }

    pub fn apply(&self, pair: &Pair) -> Pair {
        Pair::new(self.apply_grid(&pair.puzzle), self.apply_grid(&pair.solution))
    }

    pub fn apply_grid(&self, grid: &Grid) -> Grid {
        match *self {
            Symmetry::Relabel(map) => {
                let mut out = *grid;
                for value in out.rows_mut().iter_mut().flatten() {
                    *value = map.map(*value);
                }
                out
            }
            Symmetry::RowsInBand { band, order } => {
                permute_rows(grid, |row| remap_within(row, band, order))
            }
            Symmetry::ColsInStack { stack, order } => {
                permute_cols(grid, |col| remap_within(col, stack, order))
            }
            Symmetry::Bands(order) => permute_rows(grid, |row| remap_group(row, order)),
            Symmetry::Stacks(order) => permute_cols(grid, |col| remap_group(col, order)),
            Symmetry::Transpose => {
                let mut out = Grid::empty();
                for pos in Position::all() {
                    out.set(Position::new(pos.col, pos.row), grid.get(pos));
                }
                out
            }
        }
    }

    pub fn inverse(&self) -> Symmetry {
        match *self {
            Symmetry::Relabel(map) => Symmetry::Relabel(map.inverse()),
            Symmetry::RowsInBand { band, order } => Symmetry::RowsInBand {
                band,
                order: order.inverse(),
            },
            Symmetry::ColsInStack { stack, order } => Symmetry::ColsInStack {
                stack,
                order: order.inverse(),
            },
            Symmetry::Bands(order) => Symmetry::Bands(order.inverse()),
            Symmetry::Stacks(order) => Symmetry::Stacks(order.inverse()),
            Symmetry::Transpose => Symmetry::Transpose,
        }
    }
}

/// Source index for `line` when slots of its group are reordered.
/// Lines outside `group` are untouched.
#[inline]
fn remap_within(line: usize, group: usize, order: Order3) -> usize {
    if line / 3 != group {
        return line;
    }
    group * 3 + order.source(line % 3)
}

/// Source index for `line` when whole groups of three are reordered
#[inline]
fn remap_group(line: usize, order: Order3) -> usize {
    order.source(line / 3) * 3 + line % 3
}

fn permute_rows(grid: &Grid, source_of: impl Fn(usize) -> usize) -> Grid {
    let src = grid.rows();
    let mut out = Grid::empty();
    for (row, dst) in out.rows_mut().iter_mut().enumerate() {
        *dst = src[source_of(row)];
    }
    out
}

fn permute_cols(grid: &Grid, source_of: impl Fn(usize) -> usize) -> Grid {
    let src = grid.rows();
    let mut out = Grid::empty();
    for (row, dst) in out.rows_mut().iter_mut().enumerate() {
        for (col, value) in dst.iter_mut().enumerate() {
            *value = src[row][source_of(col)];
        }
    }
    out
}

/// An ordered composition of symmetries, applied first to last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymmetryStack {
    steps: Vec<Symmetry>,
}

impl SymmetryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, symmetry: Symmetry) {
        self.steps.push(symmetry);
    }

    pub fn steps(&self) -> &[Symmetry] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, pair: &Pair) -> Pair {
        self.steps.iter().fold(*pair, |acc, step| step.apply(&acc))
    }

    pub fn inverse(&self) -> SymmetryStack {
        SymmetryStack {
            steps: self.steps.iter().rev().map(Symmetry::inverse).collect(),
        }
    }
}

impl FromIterator<Symmetry> for SymmetryStack {
    fn from_iter<I: IntoIterator<Item = Symmetry>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
