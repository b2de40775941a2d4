//! A recording [`ChatPlatform`] for tests.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
  },
  time::Duration,
};

use vigil_core::{
  callback::Callback,
  chat::{ChatId, MemberStatus, MessageId, UserId},
  keyboard::Keyboard,
};

use crate::platform::{ChatPlatform, PlatformError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  Sent { chat: ChatId, message: MessageId, html: String, keyboard: Option<Keyboard> },
  Edited { chat: ChatId, message: MessageId, html: String, keyboard: Option<Keyboard> },
  Deleted { chat: ChatId, messages: Vec<MessageId> },
  CanSend { chat: ChatId, user: UserId, allowed: bool },
  Banned { chat: ChatId, user: UserId },
  Answered { text: Option<String>, alert: bool },
}

pub struct MockPlatform {
  bot:          UserId,
  statuses:     Mutex<HashMap<(ChatId, UserId), MemberStatus>>,
  bios:         Mutex<HashMap<UserId, String>>,
  effects:      Mutex<Vec<Effect>>,
  next_message: AtomicI32,
  deny_deletes: AtomicBool,
  deny_edits:   AtomicBool,
  deny_rights:  AtomicBool,
  rate_limited: AtomicUsize,
}

impl MockPlatform {
  pub fn new(bot: UserId) -> Self {
    Self {
      bot,
      statuses: Mutex::default(),
      bios: Mutex::default(),
      effects: Mutex::default(),
      next_message: AtomicI32::new(1000),
      deny_deletes: AtomicBool::new(false),
      deny_edits: AtomicBool::new(false),
      deny_rights: AtomicBool::new(false),
      rate_limited: AtomicUsize::new(0),
    }
  }

  pub fn set_status(&self, chat: ChatId, user: UserId, status: MemberStatus) {
    self.statuses.lock().unwrap().insert((chat, user), status);
  }

  pub fn set_bio(&self, user: UserId, bio: &str) {
    self.bios.lock().unwrap().insert(user, bio.to_owned());
  }

  /// Every delete fails with a permission error.
  pub fn deny_deletes(&self) { self.deny_deletes.store(true, Ordering::SeqCst); }

  /// Every edit fails as if the message were too old to edit.
  pub fn deny_edits(&self) { self.deny_edits.store(true, Ordering::SeqCst); }

  /// Every restrict and ban fails with a permission error.
  pub fn deny_rights(&self) { self.deny_rights.store(true, Ordering::SeqCst); }

  /// The next `n` sends fail with a rate limit.
  pub fn rate_limit_sends(&self, n: usize) { self.rate_limited.store(n, Ordering::SeqCst); }

  pub fn effects(&self) -> Vec<Effect> { self.effects.lock().unwrap().clone() }

  pub fn clear(&self) { self.effects.lock().unwrap().clear(); }

  /// `(message, html, keyboard)` of every sent message.
  pub fn sent(&self) -> Vec<(MessageId, String, Option<Keyboard>)> {
    self
      .effects()
      .into_iter()
      .filter_map(|e| match e {
        Effect::Sent { message, html, keyboard, .. } => Some((message, html, keyboard)),
        _ => None,
      })
      .collect()
  }

  pub fn edits(&self) -> Vec<(MessageId, String, Option<Keyboard>)> {
    self
      .effects()
      .into_iter()
      .filter_map(|e| match e {
        Effect::Edited { message, html, keyboard, .. } => Some((message, html, keyboard)),
        _ => None,
      })
      .collect()
  }

  pub fn deleted(&self) -> Vec<MessageId> {
    self
      .effects()
      .into_iter()
      .filter_map(|e| match e {
        Effect::Deleted { messages, .. } => Some(messages),
        _ => None,
      })
      .flatten()
      .collect()
  }

  pub fn answers(&self) -> Vec<(Option<String>, bool)> {
    self
      .effects()
      .into_iter()
      .filter_map(|e| match e {
        Effect::Answered { text, alert } => Some((text, alert)),
        _ => None,
      })
      .collect()
  }

  pub fn last_answer(&self) -> Option<String> { self.answers().pop().and_then(|(text, _)| text) }

  /// The id of the most recent message carrying `callback`.
  pub fn host_of(&self, callback: &Callback) -> Option<MessageId> {
    self.sent().into_iter().rev().find_map(|(message, _, keyboard)| {
      keyboard.filter(|k| k.callbacks().any(|cb| cb == callback)).map(|_| message)
    })
  }

  fn record(&self, effect: Effect) { self.effects.lock().unwrap().push(effect); }
}

impl ChatPlatform for MockPlatform {
  fn bot_id(&self) -> UserId { self.bot }

  fn bot_username(&self) -> &str { "vigil_bot" }

  async fn member_status(&self, chat: ChatId, user: UserId) -> Result<MemberStatus, PlatformError> {
    Ok(self.statuses.lock().unwrap().get(&(chat, user)).copied().unwrap_or(MemberStatus::Member))
  }

  async fn biography(&self, user: UserId) -> Result<Option<String>, PlatformError> {
    Ok(self.bios.lock().unwrap().get(&user).cloned().filter(|b| !b.is_empty()))
  }

  async fn send_message(
    &self,
    chat: ChatId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> Result<MessageId, PlatformError> {
    if self.rate_limited.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
      return Err(PlatformError::RateLimited(Duration::from_secs(3)));
    }
    let message = MessageId(self.next_message.fetch_add(1, Ordering::SeqCst));
    self.record(Effect::Sent { chat, message, html, keyboard });
    Ok(message)
  }

  async fn edit_message(
    &self,
    chat: ChatId,
    message: MessageId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> Result<(), PlatformError> {
    if self.deny_edits.load(Ordering::SeqCst) {
      return Err(PlatformError::Invalid("message can't be edited".into()));
    }
    self.record(Effect::Edited { chat, message, html, keyboard });
    Ok(())
  }

  async fn delete_messages(&self, chat: ChatId, messages: Vec<MessageId>) -> Result<(), PlatformError> {
    if self.deny_deletes.load(Ordering::SeqCst) {
      return Err(PlatformError::PermissionDenied("message can't be deleted".into()));
    }
    self.record(Effect::Deleted { chat, messages });
    Ok(())
  }

  async fn set_can_send(&self, chat: ChatId, user: UserId, allowed: bool) -> Result<(), PlatformError> {
    if self.deny_rights.load(Ordering::SeqCst) {
      return Err(PlatformError::PermissionDenied("not enough rights to restrict".into()));
    }
    self.record(Effect::CanSend { chat, user, allowed });
    Ok(())
  }

  async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
    if self.deny_rights.load(Ordering::SeqCst) {
      return Err(PlatformError::PermissionDenied("not enough rights to restrict".into()));
    }
    self.record(Effect::Banned { chat, user });
    Ok(())
  }

  async fn answer_press(&self, _press: String, text: Option<String>, alert: bool) -> Result<(), PlatformError> {
    self.record(Effect::Answered { text, alert });
    Ok(())
  }
}
