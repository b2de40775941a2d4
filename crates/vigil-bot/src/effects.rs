//! Platform effects with the failure policy applied.
//!
//! Each wrapper retries transient failures once, logs what remains by kind,
//! and posts the missing-rights hint the first time a group denies a
//! permission. Callers only learn whether the effect happened.

use vigil_core::{
  chat::{ChatId, MessageId, UserId},
  keyboard::Keyboard,
  store::ModerationStore,
};

use crate::{
  App,
  platform::{ChatPlatform, ErrorKind, PlatformError, retrying, settle},
  ui,
};

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  pub async fn send(&self, chat: ChatId, html: String, keyboard: Option<Keyboard>) -> Option<MessageId> {
    let result = retrying("send message", || {
      self.platform.send_message(chat, html.clone(), keyboard.clone())
    })
    .await;
    self.settle("send message", chat, result).await
  }

  pub async fn edit(
    &self,
    chat: ChatId,
    message: MessageId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> bool {
    let result = retrying("edit message", || {
      self.platform.edit_message(chat, message, html.clone(), keyboard.clone())
    })
    .await;
    self.settle("edit message", chat, result).await.is_some()
  }

  pub async fn delete(&self, chat: ChatId, messages: Vec<MessageId>) -> bool {
    let result = retrying("delete messages", || self.platform.delete_messages(chat, messages.clone())).await;
    self.settle("delete messages", chat, result).await.is_some()
  }

  /// Grant or revoke the right to send messages.
  pub async fn restrict(&self, chat: ChatId, user: UserId, allowed: bool) -> bool {
    let result = retrying("restrict member", || self.platform.set_can_send(chat, user, allowed)).await;
    self.settle("restrict member", chat, result).await.is_some()
  }

  pub async fn ban(&self, chat: ChatId, user: UserId) -> bool {
    let result = retrying("ban member", || self.platform.ban_member(chat, user)).await;
    self.settle("ban member", chat, result).await.is_some()
  }

  pub async fn answer(&self, press: &str, text: Option<String>, alert: bool) {
    let result = retrying("answer press", || {
      self.platform.answer_press(press.to_owned(), text.clone(), alert)
    })
    .await;
    if let Err(e) = result {
      tracing::debug!(error = %e, "could not answer button press");
    }
  }

  async fn settle<T>(&self, action: &str, chat: ChatId, result: Result<T, PlatformError>) -> Option<T> {
    if let Err(e) = &result
      && e.kind() == ErrorKind::PermissionDenied
      && self.first_hint(chat)
    {
      // Sent without the wrappers: a denied hint must not hint again.
      if let Err(e) = self.platform.send_message(chat, ui::notice::missing_rights(), None).await {
        tracing::debug!(%chat, error = %e, "could not post missing-rights hint");
      }
    }
    settle(action, chat, result)
  }
}
