//! Tic-tac-toe frames.

use std::time::Duration;

use vigil_core::{
  board::{Board, CELLS, Mark},
  callback::Callback,
  chat::UserId,
  game::{Contender, Match, MoveOutcome},
  keyboard::{Button, Keyboard},
};

use super::{Screen, mention, span};

/// Label of the post-game button that opens a fresh game.
pub const NEW_GAME: &str = "Join New Game";

fn symbol(mark: Option<Mark>) -> &'static str {
  match mark {
    Some(Mark::X) => "❌",
    Some(Mark::O) => "⭕",
    None => "⬜",
  }
}

fn cells(board: &Board) -> Keyboard {
  let mut keyboard = Keyboard::new();
  for row in 0..CELLS / 3 {
    keyboard = keyboard.row(
      (row * 3..row * 3 + 3)
        .map(|i| {
          // CELLS fits in a u8.
          let index = i as u8;
          Button::callback(symbol(board.get(i)), Callback::GameCell(index))
        })
        .collect(),
    );
  }
  keyboard
}

fn lineup(game: &Match) -> String {
  let [x, o] = game.players();
  format!(
    "{} {} vs {} {}",
    symbol(Some(x.mark)),
    mention(x.id, &x.name),
    symbol(Some(o.mark)),
    mention(o.id, &o.name),
  )
}

pub fn waiting(starter: &Contender) -> Screen {
  Screen::new(
    format!("🎮 {} wants to play tic-tac-toe!\nPress Join to play.", mention(starter.id, &starter.name)),
    Keyboard::new().button(Button::callback("🙋 Join", Callback::GameJoin(starter.id))),
  )
}

pub fn playing(game: &Match) -> Screen {
  let turn = game.turn_holder();
  Screen::new(
    format!(
      "🎮 <b>Tic-tac-toe</b>\n{}\n\nTurn: {} {}",
      lineup(game),
      symbol(Some(turn.mark)),
      mention(turn.id, &turn.name),
    ),
    cells(game.board()),
  )
}

/// The terminal frame; `next_starter` hosts the follow-up game.
pub fn finished(game: &Match, outcome: &MoveOutcome, next_starter: UserId) -> Screen {
  let headline = match outcome {
    MoveOutcome::Won(winner) => format!("🏆 {} wins!", mention(winner.id, &winner.name)),
    MoveOutcome::Draw | MoveOutcome::Continue => "🤝 It's a draw!".to_owned(),
  };
  Screen::new(
    format!("🎮 <b>Tic-tac-toe</b>\n{}\n\n{headline}", lineup(game)),
    cells(game.board()).button(Button::callback(NEW_GAME, Callback::GameNewStarter(next_starter))),
  )
}

pub fn cancelled(next_starter: UserId, inactivity: Duration) -> Screen {
  Screen::new(
    format!("⌛ Game cancelled after {} without a move.", span(inactivity)),
    Keyboard::new().button(Button::callback(NEW_GAME, Callback::GameNewStarter(next_starter))),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn game() -> Match {
    Match::new(
      Contender { id: UserId(1), name: "Ann".into() },
      Contender { id: UserId(2), name: "Bob".into() },
    )
  }

  #[test]
  fn board_has_nine_cell_buttons_in_three_rows() {
    let screen = playing(&game());
    assert_eq!(screen.keyboard.rows.len(), 3);
    let cells: Vec<_> = screen.keyboard.callbacks().cloned().collect();
    assert_eq!(cells, (0..9).map(Callback::GameCell).collect::<Vec<_>>());
    assert!(screen.text.contains("Turn: ❌"));
  }

  #[test]
  fn finished_frame_offers_a_new_game() {
    let g = game();
    let screen = finished(&g, &MoveOutcome::Draw, UserId(1));
    let button = screen.keyboard.find(NEW_GAME).unwrap();
    assert_eq!(button.callback, Callback::GameNewStarter(UserId(1)));
  }

  #[test]
  fn cancelled_frame_names_the_idle_period() {
    let screen = cancelled(UserId(1), Duration::from_secs(300));
    assert!(screen.text.contains("after 5 minutes without"));
    assert!(screen.keyboard.find(NEW_GAME).is_some());
  }
}
