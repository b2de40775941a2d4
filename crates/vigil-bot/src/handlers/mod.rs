//! Event handlers, one module per event family.

pub mod callback;
pub mod command;
pub mod members;
pub mod message;

pub use callback::Answer;

use vigil_core::{
  chat::{UserId, UserRef},
  event::IncomingMessage,
  game::Contender,
  store::{ModerationStore, UserRecord},
};

use crate::{App, platform::ChatPlatform};

pub(crate) fn contender(user: &UserRef) -> Contender {
  Contender { id: user.id, name: user.display_name() }
}

impl<P, S> App<P, S>
where
  P: ChatPlatform + 'static,
  S: ModerationStore + 'static,
{
  pub(crate) async fn remember_user(&self, user: &UserRef) {
    if let Err(e) = self.store.upsert_user(UserRecord::observed(user)).await {
      tracing::warn!(user = %user.id, error = %e, "could not update user registry");
    }
  }

  /// Display name from the registry, falling back to the numeric id.
  pub(crate) async fn user_name(&self, user: UserId) -> String {
    match self.store.get_user(user).await {
      Ok(Some(record)) => record.to_ref().display_name(),
      Ok(None) => user.to_string(),
      Err(e) => {
        tracing::warn!(%user, error = %e, "could not read user registry");
        user.to_string()
      }
    }
  }

  /// Resolve `@handle` through the message's entities, then the registry.
  pub(crate) async fn resolve_handle(&self, msg: &IncomingMessage, handle: &str) -> Option<UserRef> {
    let named = |u: &&UserRef| u.username.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(handle));
    if let Some(user) = msg.mentions.iter().chain(msg.reply_to.iter()).find(named) {
      return Some(user.clone());
    }
    match self.store.find_user_by_username(handle.to_owned()).await {
      Ok(record) => record.map(|r| r.to_ref()),
      Err(e) => {
        tracing::warn!(handle, error = %e, "could not search user registry");
        None
      }
    }
  }
}
