//! Toroidal Grid Geometry
//!
//! Positions, directions and wrap-around stepping. The grid has no
//! edges: stepping off one side re-enters on the opposite side.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Row/column coordinate on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index, 0 at the top
    pub row: usize,
    /// Column index, 0 at the left
    pub col: usize,
}

impl Position {
    /// Create a position.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

/// One of the eight compass steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// The four orthogonal steps.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// All eight steps, row-major around the center.
    pub const ALL: [Direction; 8] = [
        Direction::UpLeft,
        Direction::Up,
        Direction::UpRight,
        Direction::Left,
        Direction::Right,
        Direction::DownLeft,
        Direction::Down,
        Direction::DownRight,
    ];

    /// (row delta, column delta).
    #[inline]
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (-1, 1),
            Direction::DownLeft => (1, -1),
            Direction::DownRight => (1, 1),
        }
    }

    /// True for the four diagonal steps.
    #[inline]
    pub fn is_diagonal(self) -> bool {
        let (dr, dc) = self.delta();
        dr != 0 && dc != 0
    }

    /// Opposite step.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::UpLeft => Direction::DownRight,
            Direction::UpRight => Direction::DownLeft,
            Direction::DownLeft => Direction::UpRight,
            Direction::DownRight => Direction::UpLeft,
        }
    }
}

/// Grid dimensions with wrap-around arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl GridDims {
    /// Standard Colapsi layout.
    pub const STANDARD: GridDims = GridDims { rows: 4, cols: 6 };

    /// Create dimensions.
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Wrap arbitrary signed coordinates onto the torus.
    #[inline]
    pub fn wrap(&self, row: i64, col: i64) -> Position {
        Position {
            row: row.rem_euclid(self.rows as i64) as usize,
            col: col.rem_euclid(self.cols as i64) as usize,
        }
    }

    /// Position one step away in `dir`.
    #[inline]
    pub fn step(&self, from: Position, dir: Direction) -> Position {
        let (dr, dc) = dir.delta();
        self.wrap(from.row as i64 + dr, from.col as i64 + dc)
    }

    /// Row-major index of a position.
    #[inline]
    pub fn index_of(&self, pos: Position) -> usize {
        pos.row * self.cols + pos.col
    }

    /// Position of a row-major index.
    #[inline]
    pub fn position_of(&self, index: usize) -> Position {
        Position::new(index / self.cols, index % self.cols)
    }
}

impl Default for GridDims {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_negative_and_overflow() {
        let dims = GridDims::STANDARD;
        assert_eq!(dims.wrap(-1, -1), Position::new(3, 5));
        assert_eq!(dims.wrap(4, 6), Position::new(0, 0));
        assert_eq!(dims.wrap(9, -13), Position::new(1, 5));
    }

    #[test]
    fn test_step_wraps_every_edge() {
        let dims = GridDims::STANDARD;
        let corner = Position::new(0, 0);
        assert_eq!(dims.step(corner, Direction::Up), Position::new(3, 0));
        assert_eq!(dims.step(corner, Direction::Left), Position::new(0, 5));
        assert_eq!(dims.step(corner, Direction::UpLeft), Position::new(3, 5));
        assert_eq!(dims.step(Position::new(3, 5), Direction::DownRight), corner);
    }

    #[test]
    fn test_opposite_undoes_step() {
        let dims = GridDims::STANDARD;
        let start = Position::new(2, 3);
        for dir in Direction::ALL {
            let there = dims.step(start, dir);
            assert_eq!(dims.step(there, dir.opposite()), start);
        }
    }

    #[test]
    fn test_index_round_trip() {
        let dims = GridDims::STANDARD;
        for i in 0..dims.cell_count() {
            assert_eq!(dims.index_of(dims.position_of(i)), i);
        }
    }

    #[test]
    fn test_diagonal_flags() {
        assert_eq!(Direction::ORTHOGONAL.iter().filter(|d| d.is_diagonal()).count(), 0);
        assert_eq!(Direction::ALL.iter().filter(|d| d.is_diagonal()).count(), 4);
    }
}
