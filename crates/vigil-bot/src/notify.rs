//! Notifications and deferred deletion.

use std::time::Duration;

use vigil_core::{
  chat::{ChatId, MessageId},
  policy::NotificationTtl,
  store::ModerationStore,
};

use crate::{
  App,
  platform::{ChatPlatform, retrying, settle},
  ui::Screen,
};

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  /// Post `screen` to `chat` and, when `ttl` is non-zero, schedule its
  /// deletion.
  pub async fn notify(&self, chat: ChatId, screen: Screen, ttl: NotificationTtl) -> Option<MessageId> {
    let keyboard = screen.markup();
    let message = self.send(chat, screen.text, keyboard).await?;
    if let Some(after) = ttl.as_duration() {
      self.delete_later(chat, message, after);
    }
    Some(message)
  }

  /// Delete `message` after `after` on a detached task.
  pub fn delete_later(&self, chat: ChatId, message: MessageId, after: Duration) {
    let platform = self.platform.clone();
    tokio::spawn(async move {
      tokio::time::sleep(after).await;
      let result = retrying("deferred delete", || platform.delete_messages(chat, vec![message])).await;
      settle("deferred delete", chat, result);
    });
  }
}
