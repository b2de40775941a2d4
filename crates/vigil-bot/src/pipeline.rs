//! The moderation pipeline: exempt, classify, delete, count, escalate,
//! notify.

use std::fmt;

use vigil_core::{
  chat::{ChatId, UserId},
  classify::{Verdict, ViolationKind, classify, contains_link},
  event::IncomingMessage,
  policy::{Category, GroupPolicy, Punishment},
  store::ModerationStore,
};

use crate::{
  App, Error, Result,
  platform::{ChatPlatform, retrying, settle},
  ui::notice,
};

/// Why a message skipped classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
  OwnMessage,
  Admin,
  Whitelisted,
}

/// What the pipeline did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Exempt(Exemption),
  Clean,
  EditRemoved,
  LinkRemoved,
  Warned { category: Category, count: u32, threshold: u32 },
  Punished { category: Category, punishment: Punishment, count: u32 },
}

impl Decision {
  fn count(self) -> Option<u32> {
    match self {
      Self::Warned { count, .. } | Self::Punished { count, .. } => Some(count),
      _ => None,
    }
  }
}

impl fmt::Display for Decision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Exempt(Exemption::OwnMessage) => f.write_str("exempt_self"),
      Self::Exempt(Exemption::Admin) => f.write_str("exempt_admin"),
      Self::Exempt(Exemption::Whitelisted) => f.write_str("exempt_whitelist"),
      Self::Clean => f.write_str("clean"),
      Self::EditRemoved => f.write_str("edit_removed"),
      Self::LinkRemoved => f.write_str("link_removed"),
      Self::Warned { category, .. } => write!(f, "warned_{category}"),
      Self::Punished { category, punishment, .. } => write!(f, "{punishment}_{category}"),
    }
  }
}

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  /// The group's policy; defaults when none is stored or the store fails.
  pub async fn policy(&self, chat: ChatId) -> GroupPolicy {
    match self.store.get_policy(chat).await {
      Ok(policy) => policy.unwrap_or_default(),
      Err(e) => {
        tracing::error!(%chat, error = %e, "could not read policy; using defaults");
        GroupPolicy::default()
      }
    }
  }

  /// Whitelist membership; a failed lookup counts as not whitelisted.
  pub async fn is_whitelisted(&self, chat: ChatId, user: UserId) -> bool {
    match self.store.is_whitelisted(chat, user).await {
      Ok(listed) => listed,
      Err(e) => {
        tracing::error!(%chat, %user, error = %e, "could not read whitelist");
        false
      }
    }
  }

  /// Run one posted or edited group message through the pipeline.
  pub async fn moderate(&self, msg: &IncomingMessage, is_edit: bool) -> Result<Decision> {
    let chat = msg.chat.id;
    let user = msg.sender.id;

    let decision = if let Some(exemption) = self.exemption(chat, user).await {
      Decision::Exempt(exemption)
    } else {
      let policy = self.policy(chat).await;
      match classify(&policy, &self.matcher, &msg.text, is_edit) {
        Verdict::Clean => Decision::Clean,
        Verdict::EditedMessage => {
          self.delete(chat, vec![msg.message_id]).await;
          self.notify(chat, notice::edited(&msg.sender), policy.notification_ttl).await;
          Decision::EditRemoved
        }
        Verdict::Violation(kind) => self.violation(msg, &policy, kind).await?,
        Verdict::CheckBiography => {
          if self.biography_has_link(chat, user).await {
            self.violation(msg, &policy, ViolationKind::Biolink).await?
          } else {
            Decision::Clean
          }
        }
      }
    };

    match decision {
      Decision::Exempt(_) | Decision::Clean => {
        tracing::debug!(%chat, %user, kind = %decision, "message passed");
      }
      _ => {
        tracing::info!(%chat, %user, kind = %decision, count = ?decision.count(), "moderation decision");
      }
    }
    Ok(decision)
  }

  async fn exemption(&self, chat: ChatId, user: UserId) -> Option<Exemption> {
    if user == self.platform.bot_id() {
      Some(Exemption::OwnMessage)
    } else if self.is_admin(chat, user).await {
      Some(Exemption::Admin)
    } else if self.is_whitelisted(chat, user).await {
      Some(Exemption::Whitelisted)
    } else {
      None
    }
  }

  async fn biography_has_link(&self, chat: ChatId, user: UserId) -> bool {
    let bio = retrying("get biography", || self.platform.biography(user)).await;
    settle("get biography", chat, bio).flatten().is_some_and(|bio| contains_link(&bio))
  }

  async fn violation(&self, msg: &IncomingMessage, policy: &GroupPolicy, kind: ViolationKind) -> Result<Decision> {
    let chat = msg.chat.id;
    let Some(category) = kind.category() else {
      self.delete(chat, vec![msg.message_id]).await;
      self.notify(chat, notice::link_removed(&msg.sender), policy.notification_ttl).await;
      return Ok(Decision::LinkRemoved);
    };

    let rule = policy.escalation(category);
    let threshold = rule.threshold.get();
    let counted = self.store.increment_warning(chat, msg.sender.id, category).await;
    // The ledger is authoritative; the message goes even if counting failed.
    self.delete(chat, vec![msg.message_id]).await;
    let count = counted.map_err(|e| Error::Store(Box::new(e)))?;

    if count < threshold {
      let screen = notice::warned(&msg.sender, kind, count, threshold);
      self.notify(chat, screen, policy.notification_ttl).await;
      return Ok(Decision::Warned { category, count, threshold });
    }

    match rule.punishment {
      Punishment::Mute => self.restrict(chat, msg.sender.id, false).await,
      Punishment::Ban => self.ban(chat, msg.sender.id).await,
    };
    let screen = notice::punished(&msg.sender, chat, category, rule.punishment, threshold);
    self.notify(chat, screen, policy.notification_ttl).await;
    Ok(Decision::Punished { category, punishment: rule.punishment, count })
  }
}
