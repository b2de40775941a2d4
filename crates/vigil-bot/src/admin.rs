//! Administrator checks with a short-lived cache.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use tokio::time::Instant;
use vigil_core::{
  chat::{ChatId, UserId},
  store::ModerationStore,
};

use crate::{
  App,
  platform::{ChatPlatform, retrying, settle},
};

/// `(group, user) → is_admin`, each entry valid for `ttl`.
#[derive(Debug)]
pub struct AdminCache {
  ttl:     Duration,
  entries: Mutex<HashMap<(ChatId, UserId), (bool, Instant)>>,
}

impl AdminCache {
  pub fn new(ttl: Duration) -> Self { Self { ttl, entries: Mutex::default() } }

  pub fn get(&self, chat: ChatId, user: UserId) -> Option<bool> {
    if self.ttl.is_zero() {
      return None;
    }
    let mut entries = self.lock();
    match entries.get(&(chat, user)) {
      Some(&(is_admin, at)) if at.elapsed() < self.ttl => Some(is_admin),
      Some(_) => {
        entries.remove(&(chat, user));
        None
      }
      None => None,
    }
  }

  pub fn put(&self, chat: ChatId, user: UserId, is_admin: bool) {
    if !self.ttl.is_zero() {
      self.lock().insert((chat, user), (is_admin, Instant::now()));
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(ChatId, UserId), (bool, Instant)>> {
    self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  /// Whether `user` is an owner or administrator of `chat`. A failed lookup
  /// counts as "not an admin" and is not cached.
  pub async fn is_admin(&self, chat: ChatId, user: UserId) -> bool {
    if let Some(cached) = self.admins.get(chat, user) {
      return cached;
    }
    let status = retrying("get member", || self.platform.member_status(chat, user)).await;
    match settle("get member", chat, status) {
      Some(status) => {
        let is_admin = status.is_admin();
        self.admins.put(chat, user, is_admin);
        is_admin
      }
      None => false,
    }
  }
}
