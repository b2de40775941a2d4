//! Tic-tac-toe match rules: turn order, move validation, termination.
//!
//! Scheduling, inactivity, and rendering live in the bot; this module is the
//! pure state of one group's game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  board::{Board, CELLS, Mark},
  chat::UserId,
};

/// A participant as shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
  pub id:   UserId,
  pub name: String,
  pub mark: Mark,
}

/// Who plays, before marks are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contender {
  pub id:   UserId,
  pub name: String,
}

/// The per-group game state while a game is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameState {
  /// One player declared intent; a join button is open.
  WaitingForSecond { starter: Contender },
  InProgress(Match),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
  #[error("not a player")]
  NotAPlayer,
  #[error("not your turn")]
  NotYourTurn,
  #[error("cell index out of range")]
  OutOfRange,
  #[error("cell taken")]
  CellTaken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
  /// The turn passed to the other player.
  Continue,
  Won(Player),
  Draw,
}

/// A game between two players with marks assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
  players: [Player; 2],
  board:   Board,
  turn:    usize,
}

impl Match {
  /// `first` plays X and moves first.
  pub fn new(first: Contender, second: Contender) -> Self {
    Self {
      players: [
        Player { id: first.id, name: first.name, mark: Mark::X },
        Player { id: second.id, name: second.name, mark: Mark::O },
      ],
      board:   Board::default(),
      turn:    0,
    }
  }

  /// Resume from an arbitrary position with `turn` to move.
  pub fn from_position(first: Contender, second: Contender, board: Board, turn: Mark) -> Self {
    let mut game = Self::new(first, second);
    game.board = board;
    game.turn = usize::from(turn == Mark::O);
    game
  }

  pub fn players(&self) -> &[Player; 2] { &self.players }

  pub fn board(&self) -> &Board { &self.board }

  pub fn turn_holder(&self) -> &Player { &self.players[self.turn] }

  pub fn player(&self, id: UserId) -> Option<&Player> {
    self.players.iter().find(|p| p.id == id)
  }

  pub fn play(&mut self, presser: UserId, index: u8) -> Result<MoveOutcome, MoveError> {
    if self.player(presser).is_none() {
      return Err(MoveError::NotAPlayer);
    }
    if self.turn_holder().id != presser {
      return Err(MoveError::NotYourTurn);
    }
    let index = usize::from(index);
    if index >= CELLS {
      return Err(MoveError::OutOfRange);
    }
    if !self.board.is_empty_at(index) {
      return Err(MoveError::CellTaken);
    }

    let mover = self.turn_holder().clone();
    self.board.place(index, mover.mark);

    if self.board.winner() == Some(mover.mark) {
      return Ok(MoveOutcome::Won(mover));
    }
    if self.board.is_draw() {
      return Ok(MoveOutcome::Draw);
    }
    self.turn = 1 - self.turn;
    Ok(MoveOutcome::Continue)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn contender(id: u64, name: &str) -> Contender { Contender { id: UserId(id), name: name.into() } }

  fn game() -> Match { Match::new(contender(1, "A"), contender(2, "B")) }

  #[test]
  fn first_contender_is_x_and_moves_first() {
    let g = game();
    assert_eq!(g.turn_holder().id, UserId(1));
    assert_eq!(g.turn_holder().mark, Mark::X);
    assert_eq!(g.players()[1].mark, Mark::O);
  }

  #[test]
  fn rejects_out_of_turn_and_strangers() {
    let mut g = game();
    assert_eq!(g.play(UserId(2), 0), Err(MoveError::NotYourTurn));
    assert_eq!(g.play(UserId(3), 0), Err(MoveError::NotAPlayer));
    assert_eq!(g.board().empty_cells(), 9);
  }

  #[test]
  fn rejects_taken_and_out_of_range_cells_without_change() {
    let mut g = game();
    assert_eq!(g.play(UserId(1), 4), Ok(MoveOutcome::Continue));
    assert_eq!(g.play(UserId(2), 4), Err(MoveError::CellTaken));
    assert_eq!(g.play(UserId(2), 9), Err(MoveError::OutOfRange));
    assert_eq!(g.turn_holder().id, UserId(2));
    assert_eq!(g.board().empty_cells(), 8);
  }

  #[test]
  fn completing_a_row_wins() {
    let x = Some(Mark::X);
    let o = Some(Mark::O);
    let board = Board::from_cells([x, x, None, o, o, None, None, None, None]);
    let mut g = Match::from_position(contender(1, "A"), contender(2, "B"), board, Mark::X);
    let outcome = g.play(UserId(1), 2).unwrap();
    assert!(matches!(outcome, MoveOutcome::Won(ref p) if p.mark == Mark::X));
    assert_eq!(g.board().winner(), Some(Mark::X));
  }

  #[test]
  fn full_game_ends_in_draw_and_marks_stay_balanced() {
    let mut g = game();
    // X O X / X O O / O X X
    let moves = [0, 1, 2, 4, 3, 5, 7, 6, 8];
    for (n, cell) in moves.iter().enumerate() {
      let presser = g.turn_holder().id;
      let outcome = g.play(presser, *cell).unwrap();
      let xs = g.board().count(Mark::X);
      let os = g.board().count(Mark::O);
      assert!(xs == os || xs == os + 1);
      if n + 1 < moves.len() {
        assert_eq!(outcome, MoveOutcome::Continue);
      } else {
        assert_eq!(outcome, MoveOutcome::Draw);
      }
    }
  }
}
