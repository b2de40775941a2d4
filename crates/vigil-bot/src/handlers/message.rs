use std::iter;

use vigil_core::{
  command::{self, Command},
  event::IncomingMessage,
  store::{GroupRecord, ModerationStore},
};

use crate::{App, Result, platform::ChatPlatform, ui};

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  /// Posted and edited messages. Group commands bypass moderation; private
  /// chats only get the help screen.
  pub async fn on_message(&self, msg: &IncomingMessage, is_edit: bool) -> Result<()> {
    self.observe(msg).await;

    let command = if is_edit { None } else { command::parse(&msg.text, self.platform.bot_username()) };
    if !msg.chat.is_group {
      if let Some(Ok(Command::Start | Command::Help)) = command {
        let screen = ui::help();
        self.send(msg.chat.id, screen.text.clone(), screen.markup()).await;
      }
      return Ok(());
    }
    if let Some(command) = command {
      return self.on_command(msg, command).await;
    }
    self.moderate(msg, is_edit).await.map(drop)
  }

  async fn observe(&self, msg: &IncomingMessage) {
    for user in iter::once(&msg.sender).chain(&msg.reply_to).chain(&msg.mentions) {
      self.remember_user(user).await;
    }
    if msg.chat.is_group
      && let Err(e) = self.store.upsert_group(GroupRecord::observed(&msg.chat)).await
    {
      tracing::warn!(chat = %msg.chat.id, error = %e, "could not update group registry");
    }
  }
}
