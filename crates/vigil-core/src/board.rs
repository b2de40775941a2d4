//! The 3×3 tic-tac-toe board.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
  X,
  O,
}

impl Mark {
  pub fn other(self) -> Self {
    match self {
      Self::X => Self::O,
      Self::O => Self::X,
    }
  }
}

impl fmt::Display for Mark {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::X => "X",
      Self::O => "O",
    })
  }
}

/// Three rows, three columns, two diagonals.
const LINES: [[usize; 3]; 8] = [
  [0, 1, 2],
  [3, 4, 5],
  [6, 7, 8],
  [0, 3, 6],
  [1, 4, 7],
  [2, 5, 8],
  [0, 4, 8],
  [2, 4, 6],
];

pub const CELLS: usize = 9;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
  cells: [Option<Mark>; CELLS],
}

impl Board {
  pub fn from_cells(cells: [Option<Mark>; CELLS]) -> Self { Self { cells } }

  pub fn cells(&self) -> &[Option<Mark>; CELLS] { &self.cells }

  pub fn get(&self, index: usize) -> Option<Mark> {
    self.cells.get(index).copied().flatten()
  }

  pub fn is_empty_at(&self, index: usize) -> bool {
    index < CELLS && self.cells[index].is_none()
  }

  /// Place `mark` at `index`. The caller has validated the cell.
  pub(crate) fn place(&mut self, index: usize, mark: Mark) {
    debug_assert!(self.is_empty_at(index));
    self.cells[index] = Some(mark);
  }

  pub fn count(&self, mark: Mark) -> usize {
    self.cells.iter().filter(|c| **c == Some(mark)).count()
  }

  pub fn empty_cells(&self) -> usize {
    self.cells.iter().filter(|c| c.is_none()).count()
  }

  /// The mark completing any line, if one exists.
  pub fn winner(&self) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| match self.cells[*a] {
      Some(mark) if self.cells[*b] == Some(mark) && self.cells[*c] == Some(mark) => Some(mark),
      _ => None,
    })
  }

  /// Full board without a winning line.
  pub fn is_draw(&self) -> bool { self.empty_cells() == 0 && self.winner().is_none() }
}

#[cfg(test)]
mod tests {
  use super::*;

  const X: Option<Mark> = Some(Mark::X);
  const O: Option<Mark> = Some(Mark::O);
  const E: Option<Mark> = None;

  #[test]
  fn detects_every_line() {
    for line in LINES {
      let mut cells = [E; CELLS];
      for i in line {
        cells[i] = O;
      }
      assert_eq!(Board::from_cells(cells).winner(), Some(Mark::O), "{line:?}");
    }
  }

  #[test]
  fn mixed_line_does_not_win() {
    let board = Board::from_cells([X, X, O, E, E, E, E, E, E]);
    assert_eq!(board.winner(), None);
    assert!(!board.is_draw());
  }

  #[test]
  fn full_board_without_line_is_draw() {
    let board = Board::from_cells([X, O, X, X, O, O, O, X, X]);
    assert_eq!(board.winner(), None);
    assert!(board.is_draw());
  }

  #[test]
  fn full_board_with_line_is_not_draw() {
    let board = Board::from_cells([X, X, X, O, O, X, O, X, O]);
    assert_eq!(board.winner(), Some(Mark::X));
    assert!(!board.is_draw());
  }
}
