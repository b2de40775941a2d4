//! The `ModerationStore` trait and the registry records it persists.
//!
//! The trait is implemented by storage backends (e.g. `vigil-store-sqlite`).
//! The bot depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  chat::{ChatId, ChatRef, UserId, UserRef},
  policy::{Category, GroupPolicy, PolicyChange},
};

// ─── Registry records ────────────────────────────────────────────────────────

/// A user the bot has observed in any chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
  pub user_id:    UserId,
  pub username:   Option<String>,
  pub first_name: String,
  pub last_seen:  DateTime<Utc>,
}

impl UserRecord {
  pub fn observed(user: &UserRef) -> Self {
    Self {
      user_id:    user.id,
      username:   user.username.clone(),
      first_name: user.first_name.clone(),
      last_seen:  Utc::now(),
    }
  }

  pub fn to_ref(&self) -> UserRef {
    UserRef {
      id:         self.user_id,
      first_name: self.first_name.clone(),
      username:   self.username.clone(),
      is_bot:     false,
    }
  }
}

/// A group the bot has been added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
  pub group_id:  ChatId,
  pub title:     Option<String>,
  pub active:    bool,
  pub last_seen: DateTime<Utc>,
}

impl GroupRecord {
  /// An active group seen just now.
  pub fn observed(chat: &ChatRef) -> Self {
    Self { group_id: chat.id, title: chat.title.clone(), active: true, last_seen: Utc::now() }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the durable state of the moderator: group policies, the
/// warning ledger, whitelists, the user and group registries, and the
/// profanity vocabulary.
///
/// All methods return `Send` futures so the store can be shared across
/// event tasks on a multi-threaded runtime.
pub trait ModerationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Policies ──────────────────────────────────────────────────────────

  /// The stored policy, or `None` if the group was never configured.
  fn get_policy(
    &self,
    group: ChatId,
  ) -> impl Future<Output = Result<Option<GroupPolicy>, Self::Error>> + Send + '_;

  /// Apply a single-field change atomically and return the new policy.
  /// A group without a policy starts from [`GroupPolicy::default`].
  fn update_policy(
    &self,
    group: ChatId,
    change: PolicyChange,
  ) -> impl Future<Output = Result<GroupPolicy, Self::Error>> + Send + '_;

  // ── Warning ledger ────────────────────────────────────────────────────

  /// Increment the counter and return its new value. Concurrent calls for
  /// the same key observe distinct, consecutive values.
  fn increment_warning(
    &self,
    group: ChatId,
    user: UserId,
    category: Category,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  fn warning_count(
    &self,
    group: ChatId,
    user: UserId,
    category: Category,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Reset every category counter of `user` in `group` to zero.
  fn reset_warnings(
    &self,
    group: ChatId,
    user: UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Whitelist ─────────────────────────────────────────────────────────

  /// Returns `false` if the user was already whitelisted.
  fn add_whitelist(
    &self,
    group: ChatId,
    user: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if the user was not whitelisted.
  fn remove_whitelist(
    &self,
    group: ChatId,
    user: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_whitelisted(
    &self,
    group: ChatId,
    user: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Whitelisted users in insertion order.
  fn list_whitelist(
    &self,
    group: ChatId,
  ) -> impl Future<Output = Result<Vec<UserId>, Self::Error>> + Send + '_;

  // ── Registries ────────────────────────────────────────────────────────

  fn upsert_user(
    &self,
    user: UserRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup without the leading `@`.
  fn find_user_by_username(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  fn upsert_group(
    &self,
    group: GroupRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn deactivate_group(
    &self,
    group: ChatId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_group(
    &self,
    group: ChatId,
  ) -> impl Future<Output = Result<Option<GroupRecord>, Self::Error>> + Send + '_;

  // ── Vocabulary ────────────────────────────────────────────────────────

  fn vocabulary(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Insert tokens, ignoring duplicates; returns how many were new.
  fn add_vocabulary(
    &self,
    tokens: Vec<String>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
