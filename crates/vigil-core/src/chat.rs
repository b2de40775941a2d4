//! Identifiers and lightweight references for chat-platform entities.
//!
//! The numeric layout mirrors the platform: chats are signed (groups are
//! negative), users are unsigned, messages are 32-bit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A group (or private) chat.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub struct ChatId(pub i64);

/// A platform user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub struct UserId(pub u64);

/// A message within a chat.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub struct MessageId(pub i32);

impl fmt::Display for ChatId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for MessageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Enough of a user to address and mention them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub id:         UserId,
  pub first_name: String,
  pub username:   Option<String>,
  pub is_bot:     bool,
}

impl UserRef {
  /// Name shown in notifications: the first name, falling back to the
  /// handle, falling back to the numeric id.
  pub fn display_name(&self) -> String {
    if !self.first_name.trim().is_empty() {
      self.first_name.clone()
    } else if let Some(username) = &self.username {
      format!("@{username}")
    } else {
      self.id.to_string()
    }
  }
}

/// The chat an event happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
  pub id:       ChatId,
  pub title:    Option<String>,
  /// `true` for groups and supergroups; moderation only runs there.
  pub is_group: bool,
}

/// Membership status as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
  Owner,
  Administrator,
  Member,
  Restricted,
  Banned,
  Left,
}

impl MemberStatus {
  /// Owners and administrators.
  pub fn is_admin(self) -> bool {
    matches!(self, Self::Owner | Self::Administrator)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_name_falls_back_to_handle_then_id() {
    let mut user = UserRef {
      id:         UserId(7),
      first_name: "Ada".into(),
      username:   Some("ada".into()),
      is_bot:     false,
    };
    assert_eq!(user.display_name(), "Ada");
    user.first_name = "  ".into();
    assert_eq!(user.display_name(), "@ada");
    user.username = None;
    assert_eq!(user.display_name(), "7");
  }

  #[test]
  fn only_owner_and_admin_are_admins() {
    assert!(MemberStatus::Owner.is_admin());
    assert!(MemberStatus::Administrator.is_admin());
    assert!(!MemberStatus::Member.is_admin());
    assert!(!MemberStatus::Restricted.is_admin());
  }
}
