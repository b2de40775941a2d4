//! Per-chat tic-tac-toe coordination.
//!
//! Each chat has a slot guarded by an async mutex; every transition runs
//! with the slot locked, including the platform call that renders it, so
//! two presses on one board are applied one after the other. Inactivity
//! timers are detached tasks holding a [`CancellationToken`]; a timer that
//! outlives its cancellation re-checks the last activity before acting.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use rand::seq::SliceRandom;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vigil_core::{
  chat::{ChatId, MessageId, UserId},
  game::{Contender, GameState, Match, MoveError, MoveOutcome},
};

use crate::{
  platform::{ChatPlatform, retrying, settle},
  ui::{self, Screen},
};

/// Why a game request was refused; the text is shown to the presser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameNotice {
  AlreadyRunning,
  NotAPlayer,
  NotYourTurn,
  CellTaken,
  OutOfRange,
  NotStarted,
  OwnGame,
  /// The board belongs to a finished or cancelled game.
  GameOver,
  /// The board could not be posted.
  Unavailable,
}

impl GameNotice {
  pub fn text(self) -> &'static str {
    match self {
      Self::AlreadyRunning => "game already running",
      Self::NotAPlayer => "not a player",
      Self::NotYourTurn => "not your turn",
      Self::CellTaken => "cell taken",
      Self::OutOfRange => "no such cell",
      Self::NotStarted => "waiting for a second player",
      Self::OwnGame => "you cannot join your own game",
      Self::GameOver => "this game is over; press Join New Game to play again",
      Self::Unavailable => "could not start the game, try again later",
    }
  }
}

impl From<MoveError> for GameNotice {
  fn from(e: MoveError) -> Self {
    match e {
      MoveError::NotAPlayer => Self::NotAPlayer,
      MoveError::NotYourTurn => Self::NotYourTurn,
      MoveError::OutOfRange => Self::OutOfRange,
      MoveError::CellTaken => Self::CellTaken,
    }
  }
}

struct ActiveGame {
  state:         GameState,
  /// The message carrying the board or the join button.
  message:       MessageId,
  last_activity: Instant,
  timer:         CancellationToken,
}

type Slot = Arc<tokio::sync::Mutex<Option<ActiveGame>>>;

pub struct GameCoordinator<P> {
  platform:   Arc<P>,
  slots:      Arc<Mutex<HashMap<ChatId, Slot>>>,
  inactivity: Duration,
}

impl<P> Clone for GameCoordinator<P> {
  fn clone(&self) -> Self {
    Self {
      platform:   Arc::clone(&self.platform),
      slots:      Arc::clone(&self.slots),
      inactivity: self.inactivity,
    }
  }
}

impl<P: ChatPlatform + 'static> GameCoordinator<P> {
  pub fn new(platform: Arc<P>, inactivity: Duration) -> Self {
    Self { platform, slots: Arc::default(), inactivity }
  }

  fn slots(&self) -> MutexGuard<'_, HashMap<ChatId, Slot>> {
    self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// The chat's slot, created empty if missing.
  fn slot(&self, chat: ChatId) -> Slot { Arc::clone(self.slots().entry(chat).or_default()) }

  /// The chat's slot, if it has one.
  fn existing(&self, chat: ChatId) -> Option<Slot> { self.slots().get(&chat).cloned() }

  /// Forget an empty slot nobody else is waiting on. Call with the slot
  /// still locked so no transition can fill it in between.
  fn release(&self, chat: ChatId, slot: &Slot, game: &Option<ActiveGame>) {
    if game.is_some() {
      return;
    }
    let mut slots = self.slots();
    // One reference in the map, one held by the caller.
    if slots.get(&chat).is_some_and(|s| Arc::ptr_eq(s, slot)) && Arc::strong_count(slot) == 2 {
      slots.remove(&chat);
    }
  }

  pub async fn is_active(&self, chat: ChatId) -> bool {
    match self.existing(chat) {
      Some(slot) => slot.lock().await.is_some(),
      None => false,
    }
  }

  pub async fn state(&self, chat: ChatId) -> Option<GameState> {
    let slot = self.existing(chat)?;
    let guard = slot.lock().await;
    guard.as_ref().map(|g| g.state.clone())
  }

  #[cfg(test)]
  fn tracked_chats(&self) -> usize { self.slots().len() }

  /// Open a game with one player and a join button.
  pub async fn open(&self, chat: ChatId, starter: Contender, host: Option<MessageId>) -> Result<(), GameNotice> {
    let waiting = GameState::WaitingForSecond { starter: starter.clone() };
    self.install(chat, host, waiting, ui::game::waiting(&starter)).await?;
    tracing::info!(%chat, starter = %starter.id, "game opened");
    Ok(())
  }

  /// Start a game between two players in random order.
  pub async fn start(&self, chat: ChatId, a: Contender, b: Contender, host: Option<MessageId>) -> Result<(), GameNotice> {
    let mut order = [a, b];
    order.shuffle(&mut rand::thread_rng());
    self.begin(chat, order, host).await
  }

  /// Start a game in the given order: the first player is X and moves first.
  pub async fn begin(&self, chat: ChatId, order: [Contender; 2], host: Option<MessageId>) -> Result<(), GameNotice> {
    let [first, second] = order;
    let game = Match::new(first, second);
    let (x, o) = (game.players()[0].id, game.players()[1].id);
    let screen = ui::game::playing(&game);
    self.install(chat, host, GameState::InProgress(game), screen).await?;
    tracing::info!(%chat, %x, %o, "game started");
    Ok(())
  }

  /// Continue from an arbitrary position.
  #[cfg(test)]
  pub(crate) async fn resume(&self, chat: ChatId, game: Match, host: Option<MessageId>) -> Result<(), GameNotice> {
    let screen = ui::game::playing(&game);
    self.install(chat, host, GameState::InProgress(game), screen).await
  }

  /// A second user pressed the join button of `starter`'s open game.
  pub async fn join(&self, chat: ChatId, joiner: Contender, starter: UserId, host: MessageId) -> Result<(), GameNotice> {
    let Some(slot) = self.existing(chat) else {
      return Err(GameNotice::GameOver);
    };
    let mut guard = slot.lock().await;
    let Some(active) = guard.as_mut() else {
      self.release(chat, &slot, &guard);
      return Err(GameNotice::GameOver);
    };
    let waiting = match &active.state {
      GameState::WaitingForSecond { starter: s } if s.id == starter && active.message == host => s.clone(),
      GameState::WaitingForSecond { .. } => return Err(GameNotice::GameOver),
      GameState::InProgress(_) => return Err(GameNotice::AlreadyRunning),
    };
    if joiner.id == waiting.id {
      return Err(GameNotice::OwnGame);
    }

    let mut order = [waiting, joiner];
    order.shuffle(&mut rand::thread_rng());
    let [first, second] = order;
    let game = Match::new(first, second);
    let screen = ui::game::playing(&game);
    let shown = retrying("edit game", || {
      self.platform.edit_message(chat, host, screen.text.clone(), screen.markup())
    })
    .await;
    if settle("edit game", chat, shown).is_none() {
      return Err(GameNotice::Unavailable);
    }
    tracing::info!(%chat, x = %game.players()[0].id, o = %game.players()[1].id, "game joined");
    active.state = GameState::InProgress(game);
    self.touch(chat, active);
    Ok(())
  }

  /// The post-game button: `starter` pressing it reopens a waiting game,
  /// anyone else starts a match against `starter` right away.
  pub async fn rematch(&self, chat: ChatId, starter: Contender, presser: Contender, host: MessageId) -> Result<(), GameNotice> {
    if starter.id == presser.id {
      self.open(chat, starter, Some(host)).await
    } else {
      self.start(chat, starter, presser, Some(host)).await
    }
  }

  /// Apply a cell press to the game hosted by `host`.
  pub async fn play(&self, chat: ChatId, presser: UserId, index: u8, host: MessageId) -> Result<MoveOutcome, GameNotice> {
    let Some(slot) = self.existing(chat) else {
      return Err(GameNotice::GameOver);
    };
    let mut guard = slot.lock().await;
    let Some(active) = guard.as_mut() else {
      self.release(chat, &slot, &guard);
      return Err(GameNotice::GameOver);
    };
    if active.message != host {
      return Err(GameNotice::GameOver);
    }
    let GameState::InProgress(game) = &mut active.state else {
      return Err(GameNotice::NotStarted);
    };

    let outcome = game.play(presser, index)?;
    let screen = match &outcome {
      MoveOutcome::Continue => ui::game::playing(game),
      MoveOutcome::Won(_) | MoveOutcome::Draw => ui::game::finished(game, &outcome, game.players()[0].id),
    };
    let shown = retrying("edit game", || {
      self.platform.edit_message(chat, host, screen.text.clone(), screen.markup())
    })
    .await;
    settle("edit game", chat, shown);

    match &outcome {
      MoveOutcome::Continue => self.touch(chat, active),
      MoveOutcome::Won(winner) => {
        tracing::info!(%chat, winner = %winner.id, "game won");
        finish(&mut guard);
      }
      MoveOutcome::Draw => {
        tracing::info!(%chat, "game drawn");
        finish(&mut guard);
      }
    }
    self.release(chat, &slot, &guard);
    Ok(outcome)
  }

  /// Cancel the game if it has been idle for the full inactivity period.
  pub async fn expire(&self, chat: ChatId) -> bool {
    let Some(slot) = self.existing(chat) else {
      return false;
    };
    let mut guard = slot.lock().await;
    let Some(active) = guard.as_ref() else {
      self.release(chat, &slot, &guard);
      return false;
    };
    if active.last_activity.elapsed() < self.inactivity {
      return false;
    }
    let next_starter = match &active.state {
      GameState::WaitingForSecond { starter } => starter.id,
      GameState::InProgress(game) => game.players()[0].id,
    };
    let message = active.message;
    finish(&mut guard);
    self.release(chat, &slot, &guard);

    let screen = ui::game::cancelled(next_starter, self.inactivity);
    let shown = retrying("edit game", || {
      self.platform.edit_message(chat, message, screen.text.clone(), screen.markup())
    })
    .await;
    settle("edit game", chat, shown);
    tracing::info!(%chat, "game cancelled after inactivity");
    true
  }

  // ── Internals ───────────────────────────────────────────────────────────

  /// Render `screen` and occupy the chat's slot with `state`, unless a game
  /// is already there.
  async fn install(
    &self,
    chat: ChatId,
    host: Option<MessageId>,
    state: GameState,
    screen: Screen,
  ) -> Result<(), GameNotice> {
    let slot = self.slot(chat);
    let mut guard = slot.lock().await;
    if guard.is_some() {
      return Err(GameNotice::AlreadyRunning);
    }
    match self.show(chat, host, screen).await {
      Ok(message) => {
        *guard = Some(self.activate(chat, state, message));
        Ok(())
      }
      Err(notice) => {
        self.release(chat, &slot, &guard);
        Err(notice)
      }
    }
  }

  /// Edit `host` into `screen`, or post a new message when there is none.
  async fn show(&self, chat: ChatId, host: Option<MessageId>, screen: Screen) -> Result<MessageId, GameNotice> {
    let shown = match host {
      Some(message) => {
        let edited = retrying("edit game", || {
          self.platform.edit_message(chat, message, screen.text.clone(), screen.markup())
        })
        .await;
        edited.map(|()| message)
      }
      None => {
        retrying("send game", || self.platform.send_message(chat, screen.text.clone(), screen.markup())).await
      }
    };
    settle("show game", chat, shown).ok_or(GameNotice::Unavailable)
  }

  fn activate(&self, chat: ChatId, state: GameState, message: MessageId) -> ActiveGame {
    let mut active = ActiveGame {
      state,
      message,
      last_activity: Instant::now(),
      timer: CancellationToken::new(),
    };
    self.touch(chat, &mut active);
    active
  }

  /// Record activity and replace the inactivity timer.
  fn touch(&self, chat: ChatId, active: &mut ActiveGame) {
    active.timer.cancel();
    active.last_activity = Instant::now();
    active.timer = CancellationToken::new();

    let token = active.timer.clone();
    let this = self.clone();
    tokio::spawn(async move {
      tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(this.inactivity) => {
          this.expire(chat).await;
        }
      }
    });
  }
}

fn finish(slot: &mut Option<ActiveGame>) {
  if let Some(active) = slot.take() {
    active.timer.cancel();
  }
}
