//! The chat-platform seam.
//!
//! [`ChatPlatform`] is the consumer-facing contract the moderator needs from
//! the platform client. The Telegram implementation lives in
//! [`crate::telegram`]; tests use a recording mock.

use std::{future::Future, time::Duration};

use thiserror::Error;
use vigil_core::{
  chat::{ChatId, MemberStatus, MessageId, UserId},
  keyboard::Keyboard,
};

/// Wait before the single retry of a network failure.
const NETWORK_RETRY_WAIT: Duration = Duration::from_secs(1);

// ─── Errors ──────────────────────────────────────────────────────────────────

/// How a platform failure is treated by the moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Rate limit or network failure; retried once.
  Transient,
  /// Missing admin rights; logged, the chat gets a one-time hint.
  PermissionDenied,
  /// User, chat or message is gone; swallowed.
  NotFound,
  /// The request itself was malformed.
  Invalid,
  Internal,
}

#[derive(Debug, Clone, Error)]
pub enum PlatformError {
  #[error("rate limited; retry after {0:?}")]
  RateLimited(Duration),

  #[error("network error: {0}")]
  Network(String),

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid request: {0}")]
  Invalid(String),

  #[error("platform error: {0}")]
  Other(String),
}

impl PlatformError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::RateLimited(_) | Self::Network(_) => ErrorKind::Transient,
      Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Invalid(_) => ErrorKind::Invalid,
      Self::Other(_) => ErrorKind::Internal,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Queries and effects the moderator performs against the chat platform.
pub trait ChatPlatform: Send + Sync {
  /// The bot's own user id.
  fn bot_id(&self) -> UserId;

  /// The bot's handle without `@`, used to match addressed commands.
  fn bot_username(&self) -> &str;

  fn member_status(
    &self,
    chat: ChatId,
    user: UserId,
  ) -> impl Future<Output = Result<MemberStatus, PlatformError>> + Send + '_;

  /// Profile biography; `None` when the user has none.
  fn biography(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Option<String>, PlatformError>> + Send + '_;

  /// Post an HTML message with link previews disabled.
  fn send_message(
    &self,
    chat: ChatId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> impl Future<Output = Result<MessageId, PlatformError>> + Send + '_;

  /// Replace text and keyboard of a message; `None` removes the keyboard.
  fn edit_message(
    &self,
    chat: ChatId,
    message: MessageId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> impl Future<Output = Result<(), PlatformError>> + Send + '_;

  fn delete_messages(
    &self,
    chat: ChatId,
    messages: Vec<MessageId>,
  ) -> impl Future<Output = Result<(), PlatformError>> + Send + '_;

  /// Grant (`true`) or revoke (`false`) the right to send messages.
  fn set_can_send(
    &self,
    chat: ChatId,
    user: UserId,
    allowed: bool,
  ) -> impl Future<Output = Result<(), PlatformError>> + Send + '_;

  fn ban_member(
    &self,
    chat: ChatId,
    user: UserId,
  ) -> impl Future<Output = Result<(), PlatformError>> + Send + '_;

  /// Acknowledge a button press, optionally with a popup.
  fn answer_press(
    &self,
    press: String,
    text: Option<String>,
    alert: bool,
  ) -> impl Future<Output = Result<(), PlatformError>> + Send + '_;
}

// ─── Failure policy ──────────────────────────────────────────────────────────

/// Run `op`, retrying once after the advisory wait on transient failure.
pub async fn retrying<T, F, Fut>(action: &str, mut op: F) -> Result<T, PlatformError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, PlatformError>>,
{
  let wait = match op().await {
    Err(PlatformError::RateLimited(wait)) => wait,
    Err(PlatformError::Network(_)) => NETWORK_RETRY_WAIT,
    other => return other,
  };
  tracing::debug!(action, ?wait, "transient platform failure; retrying once");
  tokio::time::sleep(wait).await;
  op().await
}

/// Log a failed platform effect according to its kind and drop it.
pub fn settle<T>(action: &str, chat: ChatId, result: Result<T, PlatformError>) -> Option<T> {
  match result {
    Ok(value) => Some(value),
    Err(e) => {
      match e.kind() {
        ErrorKind::NotFound => tracing::debug!(action, %chat, error = %e, "platform target gone"),
        ErrorKind::PermissionDenied | ErrorKind::Transient => {
          tracing::warn!(action, %chat, error = %e, "platform effect failed")
        }
        ErrorKind::Invalid | ErrorKind::Internal => {
          tracing::error!(action, %chat, error = %e, "platform effect failed")
        }
      }
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn retries_rate_limit_once_after_advisory_wait() {
    let calls = AtomicUsize::new(0);
    let started = tokio::time::Instant::now();
    let result = retrying("send", || {
      let n = calls.fetch_add(1, Ordering::SeqCst);
      async move {
        if n == 0 { Err(PlatformError::RateLimited(Duration::from_secs(7))) } else { Ok(n) }
      }
    })
    .await;
    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(7));
  }

  #[tokio::test(start_paused = true)]
  async fn gives_up_after_second_transient_failure() {
    let calls = AtomicUsize::new(0);
    let result: Result<(), _> = retrying("send", || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Err(PlatformError::Network("reset".into())) }
    })
    .await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Transient);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn permission_errors_are_not_retried() {
    let calls = AtomicUsize::new(0);
    let result: Result<(), _> = retrying("delete", || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Err(PlatformError::PermissionDenied("not admin".into())) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(settle("delete", ChatId(-1), result), None);
  }
}
