//! Group moderation bot.
//!
//! [`App`] owns the per-process state (games, ephemeral records, admin
//! cache) and dispatches [`ChatEvent`]s from any [`ChatPlatform`] backed by
//! any [`ModerationStore`].

pub mod admin;
pub mod effects;
pub mod error;
pub mod games;
pub mod handlers;
pub mod notify;
pub mod pipeline;
pub mod platform;
pub mod telegram;
pub mod ui;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub use error::{Error, Result};

use std::{
  collections::HashSet,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use serde::Deserialize;
use vigil_core::{
  chat::ChatId, ephemeral::EphemeralStore, event::ChatEvent,
  profanity::ProfanityMatcher, store::ModerationStore,
};

use admin::AdminCache;
use games::GameCoordinator;
use platform::ChatPlatform;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `VIGIL_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct BotConfig {
  pub token:                String,
  pub store_path:           PathBuf,
  #[serde(default = "default_admin_cache_secs")]
  pub admin_cache_secs:     u64,
  #[serde(default = "default_game_inactivity_secs")]
  pub game_inactivity_secs: u64,
  #[serde(default = "default_locked_reveal_secs")]
  pub locked_reveal_secs:   u64,
  /// Words merged into the stored profanity vocabulary at startup.
  #[serde(default)]
  pub profanity_words:      Vec<String>,
}

fn default_admin_cache_secs() -> u64 { 60 }
fn default_game_inactivity_secs() -> u64 { 300 }
fn default_locked_reveal_secs() -> u64 { 60 }

/// Durations derived from [`BotConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
  /// Zero disables the admin-status cache.
  pub admin_cache:     Duration,
  pub game_inactivity: Duration,
  /// Delay between revealing a locked message and deleting its carrier.
  pub locked_reveal:   Duration,
}

impl Default for Timings {
  fn default() -> Self {
    Self {
      admin_cache:     Duration::from_secs(default_admin_cache_secs()),
      game_inactivity: Duration::from_secs(default_game_inactivity_secs()),
      locked_reveal:   Duration::from_secs(default_locked_reveal_secs()),
    }
  }
}

impl From<&BotConfig> for Timings {
  fn from(config: &BotConfig) -> Self {
    Self {
      admin_cache:     Duration::from_secs(config.admin_cache_secs),
      game_inactivity: Duration::from_secs(config.game_inactivity_secs),
      locked_reveal:   Duration::from_secs(config.locked_reveal_secs),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through every event handler.
pub struct App<P, S> {
  pub platform:  Arc<P>,
  pub store:     Arc<S>,
  pub matcher:   ProfanityMatcher,
  pub admins:    AdminCache,
  pub games:     GameCoordinator<P>,
  pub ephemeral: EphemeralStore,
  pub timings:   Timings,
  /// Groups that already received the missing-rights hint.
  hinted:        Mutex<HashSet<ChatId>>,
}

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  pub fn new(platform: P, store: S, matcher: ProfanityMatcher, timings: Timings) -> Self {
    let platform = Arc::new(platform);
    Self {
      games: GameCoordinator::new(Arc::clone(&platform), timings.game_inactivity),
      admins: AdminCache::new(timings.admin_cache),
      ephemeral: EphemeralStore::new(),
      store: Arc::new(store),
      hinted: Mutex::default(),
      platform,
      matcher,
      timings,
    }
  }

  /// Handle one platform event. Errors are logged here and never escape.
  pub async fn handle(&self, event: ChatEvent) {
    let result = match &event {
      ChatEvent::Posted(msg) => self.on_message(msg, false).await,
      ChatEvent::Edited(msg) => self.on_message(msg, true).await,
      ChatEvent::ButtonPress(press) => self.on_press(press).await,
      ChatEvent::MembersJoined { chat, users } => self.on_members_joined(chat, users).await,
      ChatEvent::MemberLeft { chat, user } => self.on_member_left(chat, user).await,
    };
    if let Err(e) = result {
      tracing::error!(error = %e, "event handler failed");
    }
  }

  /// Record `chat` as hinted; `true` the first time only.
  fn first_hint(&self, chat: ChatId) -> bool {
    self.hinted.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).insert(chat)
  }
}
