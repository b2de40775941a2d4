use vigil_core::{
  callback::Callback,
  chat::UserRef,
  command::{Command, CommandError},
  ephemeral::{EphemeralKind, EphemeralRecord, Fingerprint},
  event::IncomingMessage,
  keyboard::{Button, Keyboard},
  store::ModerationStore,
};

use super::contender;
use crate::{
  App, Result,
  platform::ChatPlatform,
  ui::{
    self, mention, mention_user,
    settings::{self, Page},
  },
};

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  pub async fn on_command(&self, msg: &IncomingMessage, command: Result<Command, CommandError>) -> Result<()> {
    let chat = msg.chat.id;
    let command = match command {
      Ok(command) => command,
      Err(e) => {
        self.send(chat, format!("ℹ️ {}", ui::escape(&e.to_string())), None).await;
        return Ok(());
      }
    };

    match command {
      Command::Start | Command::Help => {
        let screen = ui::help();
        self.send(chat, screen.text.clone(), screen.markup()).await;
      }
      Command::Settings => {
        if self.is_admin(chat, msg.sender.id).await {
          let screen = settings::render(Page::Root, &self.policy(chat).await);
          self.send(chat, screen.text.clone(), screen.markup()).await;
        } else {
          self.send(chat, "⛔ Only group admins can change settings.".to_owned(), None).await;
        }
      }
      Command::TicTac { handles } => self.tictac(msg, &handles).await,
      Command::Lock { target, text } => self.hide(msg, target, text, EphemeralKind::Locked).await,
      Command::Secret { target, text } => self.hide(msg, target, text, EphemeralKind::Secret).await,
    }
    Ok(())
  }

  async fn tictac(&self, msg: &IncomingMessage, handles: &[String]) {
    let chat = msg.chat.id;
    let mut players = Vec::with_capacity(handles.len());
    for handle in handles {
      match self.resolve_handle(msg, handle).await {
        Some(user) => players.push(contender(&user)),
        None => {
          self.send(chat, unknown_handle(handle), None).await;
          return;
        }
      }
    }

    let sender = contender(&msg.sender);
    let started = match <[_; 2]>::try_from(players) {
      Ok([a, b]) if a.id == b.id => {
        self.send(chat, "🎮 Pick two different players.".to_owned(), None).await;
        return;
      }
      Ok([a, b]) => self.games.start(chat, a, b, None).await,
      Err(players) => match players.into_iter().next() {
        Some(opponent) if opponent.id != sender.id => self.games.start(chat, sender, opponent, None).await,
        _ => self.games.open(chat, sender, None).await,
      },
    };
    if let Err(notice) = started {
      self.send(chat, format!("🎮 {}", notice.text()), None).await;
    }
  }

  /// `/lock` and `/secret`: hide `text` behind a button only the target can
  /// use.
  async fn hide(&self, msg: &IncomingMessage, target: Option<String>, text: String, kind: EphemeralKind) {
    let chat = msg.chat.id;
    let resolved = match &target {
      Some(handle) => self.resolve_handle(msg, handle).await,
      None => msg.reply_to.clone().or_else(|| msg.mentions.first().cloned()),
    };
    let Some(target) = resolved else {
      let text = match &target {
        Some(handle) => unknown_handle(handle),
        None => "ℹ️ Mention the recipient or reply to one of their messages.".to_owned(),
      };
      self.send(chat, text, None).await;
      return;
    };

    self.delete(chat, vec![msg.message_id]).await;
    let fingerprint = self.ephemeral.insert(EphemeralRecord {
      group:       chat,
      sender:      msg.sender.id,
      sender_name: msg.sender.display_name(),
      target:      target.id,
      target_name: target.display_name(),
      payload:     text,
      kind,
    });
    let (text, button) = carrier(&msg.sender, &target, kind, fingerprint.clone());
    if self.send(chat, text, Some(Keyboard::new().button(button))).await.is_none() {
      self.ephemeral.discard(&fingerprint);
    } else {
      tracing::info!(%chat, sender = %msg.sender.id, target = %target.id, ?kind, "hidden message posted");
    }
  }
}

fn unknown_handle(handle: &str) -> String {
  format!("🤷 I don't know @{} yet. They need to write here first.", ui::escape(handle))
}

fn carrier(
  sender: &UserRef,
  target: &UserRef,
  kind: EphemeralKind,
  fingerprint: Fingerprint,
) -> (String, Button) {
  let target = mention(target.id, &target.display_name());
  match kind {
    EphemeralKind::Locked => (
      format!("🔒 {} sent a locked message to {target}.", mention_user(sender)),
      Button::callback("🔓 Open", Callback::ShowLock(fingerprint)),
    ),
    EphemeralKind::Secret => (
      format!("🤫 {} whispered a secret to {target}.", mention_user(sender)),
      Button::callback("👁 Read", Callback::ShowSecret(fingerprint)),
    ),
  }
}
