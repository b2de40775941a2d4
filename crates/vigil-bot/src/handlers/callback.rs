//! The button-press router.
//!
//! Payloads are parsed into a [`Callback`] and matched; settings actions are
//! admin-gated here, game, ephemeral and whitelist actions check their own
//! preconditions.

use vigil_core::{
  callback::{Callback, MenuPage},
  chat::{ChatId, MessageId, UserId},
  ephemeral::{EphemeralKind, Fingerprint, RevealError},
  event::ButtonPress,
  game::Contender,
  policy::PolicyChange,
  store::ModerationStore,
};

use super::contender;
use crate::{
  App, Error, Result,
  games::GameNotice,
  platform::ChatPlatform,
  ui::{
    self, Screen, escape, mention, notice,
    settings::{self, Page},
  },
};

pub const ADMINS_ONLY: &str = "admins only";

/// The acknowledgement shown to the presser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
  pub text:  Option<String>,
  /// Modal popup instead of a toast.
  pub alert: bool,
}

impl Answer {
  pub fn silent() -> Self { Self::default() }

  pub fn toast(text: impl Into<String>) -> Self { Self { text: Some(text.into()), alert: false } }

  pub fn alert(text: impl Into<String>) -> Self { Self { text: Some(text.into()), alert: true } }
}

impl From<GameNotice> for Answer {
  fn from(notice: GameNotice) -> Self { Self::toast(notice.text()) }
}

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  /// Route a press and always answer it.
  pub async fn on_press(&self, press: &ButtonPress) -> Result<()> {
    self.remember_user(&press.from).await;
    let answer = match press.data.parse::<Callback>() {
      Ok(callback) => match self.route(press, callback).await {
        Ok(answer) => answer,
        Err(e) => {
          tracing::error!(data = %press.data, error = %e, "button handler failed");
          Answer::alert("something went wrong, try again")
        }
      },
      Err(e) => {
        tracing::debug!(data = %press.data, error = %e, "invalid button payload");
        Answer::alert("this button is not valid")
      }
    };
    self.answer(&press.id, answer.text, answer.alert).await;
    Ok(())
  }

  pub async fn route(&self, press: &ButtonPress, callback: Callback) -> Result<Answer> {
    let host = press.chat.as_ref().map(|c| c.id).zip(press.message_id);
    let user = press.from.id;

    if callback.requires_admin() {
      let chat = press.chat.as_ref().ok_or(Error::NoChat)?;
      if !chat.is_group || !self.is_admin(chat.id, user).await {
        return Ok(Answer::alert(ADMINS_ONLY));
      }
    }

    match callback {
      // ── Navigation ────────────────────────────────────────────────────
      Callback::Close => {
        if let Some((chat, message)) = host {
          self.delete(chat, vec![message]).await;
        }
        Ok(Answer::silent())
      }
      Callback::Help => self.show(host, ui::help()).await,
      Callback::BackToMain => match &press.chat {
        Some(chat) if chat.is_group => self.settings_page(host, Page::Root).await,
        _ => self.show(host, ui::help()).await,
      },
      Callback::OtherBots => Ok(Answer::alert(ui::OTHER_BOTS)),
      Callback::DonateInfo => Ok(Answer::alert(ui::DONATE)),
      Callback::Menu(page) => {
        let page = match page {
          MenuPage::Toggles => Page::Toggles,
          MenuPage::Notifications => Page::Notifications,
          MenuPage::Game => Page::Game(self.timings.game_inactivity),
          MenuPage::Whitelist => {
            let screen = self.whitelist_screen(group(host)?).await?;
            return self.show(host, screen).await;
          }
        };
        self.settings_page(host, page).await
      }

      // ── Policy ────────────────────────────────────────────────────────
      Callback::Toggle(toggle) => self.change(host, PolicyChange::Flip(toggle), Page::Toggles).await,
      Callback::ConfigCategory(category) => self.settings_page(host, Page::Category(category)).await,
      Callback::OpenWarnLimit(category) => self.settings_page(host, Page::WarnLimit(category)).await,
      Callback::SetLimit(category, n) => {
        self.change(host, PolicyChange::Threshold(category, n), Page::Category(category)).await
      }
      Callback::SetPunishment(punishment, category) => {
        self.change(host, PolicyChange::Punishment(category, punishment), Page::Category(category)).await
      }
      Callback::SetNotifTime(ttl) => {
        self.change(host, PolicyChange::NotificationTtl(ttl), Page::Notifications).await
      }

      // ── Members ───────────────────────────────────────────────────────
      Callback::Whitelist(target) => {
        let chat = group(host)?;
        if !self.is_admin(chat, user).await {
          return Ok(Answer::alert(ADMINS_ONLY));
        }
        let added = self.store.add_whitelist(chat, target).await.map_err(|e| Error::Store(Box::new(e)))?;
        self.store.reset_warnings(chat, target).await.map_err(|e| Error::Store(Box::new(e)))?;
        tracing::info!(%chat, user = %target, admin = %user, "whitelisted");
        let name = self.user_name(target).await;
        self.show(host, notice::whitelisted(target, &name, &press.from)).await?;
        Ok(Answer::toast(if added { "whitelisted" } else { "already whitelisted" }))
      }
      Callback::Unwhitelist(target) => {
        let chat = group(host)?;
        if !self.is_admin(chat, user).await {
          return Ok(Answer::alert(ADMINS_ONLY));
        }
        let removed = self.store.remove_whitelist(chat, target).await.map_err(|e| Error::Store(Box::new(e)))?;
        tracing::info!(%chat, user = %target, admin = %user, "removed from whitelist");
        let screen = self.whitelist_screen(chat).await?;
        self.show(host, screen).await?;
        Ok(Answer::toast(if removed { "removed from whitelist" } else { "not whitelisted" }))
      }
      Callback::CancelWarn(target) => {
        let chat = group(host)?;
        self.store.reset_warnings(chat, target).await.map_err(|e| Error::Store(Box::new(e)))?;
        tracing::info!(%chat, user = %target, admin = %user, "warnings cancelled");
        let name = self.user_name(target).await;
        self.show(host, notice::warnings_cleared(target, &name, &press.from)).await?;
        Ok(Answer::toast("warnings cleared"))
      }
      Callback::Unmute(target, group_id) => {
        let chat = group(host)?;
        if chat != group_id {
          return Ok(Answer::alert("this button belongs to another group"));
        }
        let restored = self.restrict(chat, target, true).await;
        self.store.reset_warnings(chat, target).await.map_err(|e| Error::Store(Box::new(e)))?;
        if !restored {
          return Ok(Answer::toast("could not unmute, check my admin rights"));
        }
        tracing::info!(%chat, user = %target, admin = %user, "unmuted");
        let name = self.user_name(target).await;
        self.show(host, notice::unmuted(target, &name, &press.from)).await?;
        Ok(Answer::toast("unmuted"))
      }

      // ── Game ──────────────────────────────────────────────────────────
      Callback::GameCell(index) => {
        let Some((chat, message)) = host else { return Ok(GameNotice::GameOver.into()) };
        Ok(match self.games.play(chat, user, index, message).await {
          Ok(_) => Answer::silent(),
          Err(notice) => notice.into(),
        })
      }
      Callback::GameJoin(starter) => {
        let Some((chat, message)) = host else { return Ok(GameNotice::GameOver.into()) };
        Ok(match self.games.join(chat, contender(&press.from), starter, message).await {
          Ok(()) => Answer::silent(),
          Err(notice) => notice.into(),
        })
      }
      Callback::GameNewStarter(starter) => {
        let Some((chat, message)) = host else { return Ok(GameNotice::GameOver.into()) };
        let starter = if starter == user {
          contender(&press.from)
        } else {
          Contender { id: starter, name: self.user_name(starter).await }
        };
        Ok(match self.games.rematch(chat, starter, contender(&press.from), message).await {
          Ok(()) => Answer::silent(),
          Err(notice) => notice.into(),
        })
      }

      // ── Ephemeral messages ────────────────────────────────────────────
      Callback::ShowLock(fingerprint) | Callback::ShowSecret(fingerprint) => {
        self.reveal(host, &fingerprint, user).await
      }
    }
  }

  async fn reveal(&self, host: Option<(ChatId, MessageId)>, fingerprint: &Fingerprint, presser: UserId) -> Result<Answer> {
    let record = match self.ephemeral.reveal(fingerprint, presser) {
      Ok(record) => record,
      Err(e) => return Ok(Answer::alert(e.to_string())),
    };
    tracing::info!(group = %record.group, target = %presser, kind = ?record.kind, "hidden message revealed");

    match (record.kind, host) {
      (EphemeralKind::Locked, Some((chat, message))) => {
        let text = format!(
          "🔓 {} → {}\n\n{}",
          mention(record.sender, &record.sender_name),
          mention(record.target, &record.target_name),
          escape(&record.payload),
        );
        if !self.edit(chat, message, text, None).await {
          return Ok(Answer::alert(record.payload));
        }
        self.delete_later(chat, message, self.timings.locked_reveal);
        Ok(Answer::silent())
      }
      (EphemeralKind::Locked, None) | (EphemeralKind::Secret, _) => Ok(Answer::alert(record.payload)),
    }
  }

  // ── Settings helpers ────────────────────────────────────────────────────

  async fn show(&self, host: Option<(ChatId, MessageId)>, screen: Screen) -> Result<Answer> {
    match host {
      Some((chat, message)) => {
        self.edit(chat, message, screen.text.clone(), screen.markup()).await;
        Ok(Answer::silent())
      }
      None => Ok(Answer::alert(RevealError::Gone.to_string())),
    }
  }

  async fn settings_page(&self, host: Option<(ChatId, MessageId)>, page: Page) -> Result<Answer> {
    let chat = group(host)?;
    let policy = self.policy(chat).await;
    self.show(host, settings::render(page, &policy)).await
  }

  async fn change(&self, host: Option<(ChatId, MessageId)>, change: PolicyChange, page: Page) -> Result<Answer> {
    let chat = group(host)?;
    let policy = self.store.update_policy(chat, change).await.map_err(|e| Error::Store(Box::new(e)))?;
    tracing::info!(%chat, ?change, "policy updated");
    self.show(host, settings::render(page, &policy)).await?;
    Ok(Answer::toast("saved"))
  }

  async fn whitelist_screen(&self, chat: ChatId) -> Result<Screen> {
    let users = self.store.list_whitelist(chat).await.map_err(|e| Error::Store(Box::new(e)))?;
    let mut members = Vec::with_capacity(users.len());
    for user in users {
      members.push((user, self.user_name(user).await));
    }
    Ok(settings::whitelist(&members))
  }
}

fn group(host: Option<(ChatId, MessageId)>) -> Result<ChatId> {
  host.map(|(chat, _)| chat).ok_or(Error::NoChat)
}
