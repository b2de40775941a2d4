use vigil_core::{
  chat::{ChatRef, UserRef},
  store::{GroupRecord, ModerationStore},
};

use crate::{App, Error, Result, platform::ChatPlatform, ui};

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  /// New members are registered; the bot's own arrival gets a welcome.
  pub async fn on_members_joined(&self, chat: &ChatRef, users: &[UserRef]) -> Result<()> {
    for user in users {
      self.remember_user(user).await;
    }
    if users.iter().any(|u| u.id == self.platform.bot_id()) {
      let previous = self.store.get_group(chat.id).await.map_err(|e| Error::Store(Box::new(e)))?;
      self
        .store
        .upsert_group(GroupRecord::observed(chat))
        .await
        .map_err(|e| Error::Store(Box::new(e)))?;
      match previous {
        Some(previous) => tracing::info!(chat = %chat.id, last_seen = %previous.last_seen, "re-added to group"),
        None => tracing::info!(chat = %chat.id, "added to group"),
      }
      let screen = ui::welcome();
      self.send(chat.id, screen.text.clone(), screen.markup()).await;
    }
    Ok(())
  }

  /// The bot leaving marks the group inactive.
  pub async fn on_member_left(&self, chat: &ChatRef, user: &UserRef) -> Result<()> {
    if user.id != self.platform.bot_id() {
      return Ok(());
    }
    self.store.deactivate_group(chat.id).await.map_err(|e| Error::Store(Box::new(e)))?;
    tracing::info!(chat = %chat.id, "removed from group");
    Ok(())
  }
}
