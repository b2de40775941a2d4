//! Per-group moderation policy.
//!
//! A [`GroupPolicy`] holds four independent toggles, an escalation rule for
//! each escalating [`Category`], and the lifetime of the bot's own
//! notifications. Every group has exactly one policy; a group that was never
//! configured reads as [`GroupPolicy::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// A violation category that accumulates warnings and escalates.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Profane,
  Biolink,
}

impl Category {
  pub const ALL: [Self; 2] = [Self::Profane, Self::Biolink];

  /// Human-readable reason used in notifications.
  pub fn reason(self) -> &'static str {
    match self {
      Self::Profane => "profane language",
      Self::Biolink => "link in profile bio",
    }
  }
}

/// What happens once a user reaches the warn threshold.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Punishment {
  /// Revoke the right to send messages.
  #[default]
  Mute,
  /// Remove from the group.
  Ban,
}

/// One of the four boolean switches of a policy. The literal is the key
/// used in `toggle_<key>` button payloads.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
  Profane,
  Edited,
  Links,
  Biolink,
}

impl Toggle {
  pub const ALL: [Self; 4] = [Self::Profane, Self::Edited, Self::Links, Self::Biolink];

  pub fn label(self) -> &'static str {
    match self {
      Self::Profane => "Delete profanity",
      Self::Edited => "Delete edited messages",
      Self::Links => "Delete links in messages",
      Self::Biolink => "Delete users with links in bio",
    }
  }
}

// ─── Bounded values ──────────────────────────────────────────────────────────

/// A warn threshold; always one of 3, 4 or 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WarnThreshold(u8);

impl WarnThreshold {
  pub const ALLOWED: [u8; 3] = [3, 4, 5];

  pub fn get(self) -> u32 { u32::from(self.0) }
}

impl Default for WarnThreshold {
  fn default() -> Self { Self(3) }
}

impl TryFrom<u8> for WarnThreshold {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> {
    if Self::ALLOWED.contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::InvalidThreshold(value))
    }
  }
}

impl From<WarnThreshold> for u8 {
  fn from(value: WarnThreshold) -> Self { value.0 }
}

/// Minutes after which a notification is deleted; zero keeps it forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct NotificationTtl(u16);

impl NotificationTtl {
  pub const ALLOWED: [u16; 5] = [0, 1, 5, 10, 60];

  pub fn minutes(self) -> u16 { self.0 }

  /// `None` when notifications persist.
  pub fn as_duration(self) -> Option<Duration> {
    (self.0 > 0).then(|| Duration::from_secs(u64::from(self.0) * 60))
  }
}

impl TryFrom<u16> for NotificationTtl {
  type Error = Error;

  fn try_from(value: u16) -> Result<Self> {
    if Self::ALLOWED.contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::InvalidTtl(value))
    }
  }
}

impl From<NotificationTtl> for u16 {
  fn from(value: NotificationTtl) -> Self { value.0 }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Threshold and punishment for one escalating category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscalationRule {
  pub threshold:  WarnThreshold,
  pub punishment: Punishment,
}

/// The moderation settings of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPolicy {
  pub delete_profane:          bool,
  pub delete_edited:           bool,
  pub delete_links_in_message: bool,
  pub delete_profile_biolink:  bool,
  pub profane:                 EscalationRule,
  pub biolink:                 EscalationRule,
  pub notification_ttl:        NotificationTtl,
}

impl Default for GroupPolicy {
  fn default() -> Self {
    Self {
      delete_profane:          true,
      delete_edited:           true,
      delete_links_in_message: true,
      delete_profile_biolink:  true,
      profane:                 EscalationRule::default(),
      biolink:                 EscalationRule::default(),
      notification_ttl:        NotificationTtl::default(),
    }
  }
}

/// A single-field change to a policy; the unit of persistence updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChange {
  Flip(Toggle),
  Threshold(Category, WarnThreshold),
  Punishment(Category, Punishment),
  NotificationTtl(NotificationTtl),
}

impl GroupPolicy {
  pub fn toggle(&self, toggle: Toggle) -> bool {
    match toggle {
      Toggle::Profane => self.delete_profane,
      Toggle::Edited => self.delete_edited,
      Toggle::Links => self.delete_links_in_message,
      Toggle::Biolink => self.delete_profile_biolink,
    }
  }

  fn toggle_mut(&mut self, toggle: Toggle) -> &mut bool {
    match toggle {
      Toggle::Profane => &mut self.delete_profane,
      Toggle::Edited => &mut self.delete_edited,
      Toggle::Links => &mut self.delete_links_in_message,
      Toggle::Biolink => &mut self.delete_profile_biolink,
    }
  }

  pub fn escalation(&self, category: Category) -> EscalationRule {
    match category {
      Category::Profane => self.profane,
      Category::Biolink => self.biolink,
    }
  }

  fn escalation_mut(&mut self, category: Category) -> &mut EscalationRule {
    match category {
      Category::Profane => &mut self.profane,
      Category::Biolink => &mut self.biolink,
    }
  }

  pub fn apply(&mut self, change: PolicyChange) {
    match change {
      PolicyChange::Flip(toggle) => {
        let slot = self.toggle_mut(toggle);
        *slot = !*slot;
      }
      PolicyChange::Threshold(category, threshold) => {
        self.escalation_mut(category).threshold = threshold;
      }
      PolicyChange::Punishment(category, punishment) => {
        self.escalation_mut(category).punishment = punishment;
      }
      PolicyChange::NotificationTtl(ttl) => self.notification_ttl = ttl,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_enable_everything_with_mute_at_three() {
    let policy = GroupPolicy::default();
    assert!(Toggle::ALL.iter().all(|t| policy.toggle(*t)));
    for category in Category::ALL {
      let rule = policy.escalation(category);
      assert_eq!(rule.threshold.get(), 3);
      assert_eq!(rule.punishment, Punishment::Mute);
    }
    assert_eq!(policy.notification_ttl.as_duration(), None);
  }

  #[test]
  fn flipping_twice_is_identity() {
    for toggle in Toggle::ALL {
      let original = GroupPolicy::default();
      let mut policy = original.clone();
      policy.apply(PolicyChange::Flip(toggle));
      assert_ne!(policy, original);
      policy.apply(PolicyChange::Flip(toggle));
      assert_eq!(policy, original);
    }
  }

  #[test]
  fn threshold_set_then_read() {
    let mut policy = GroupPolicy::default();
    let five = WarnThreshold::try_from(5).unwrap();
    policy.apply(PolicyChange::Threshold(Category::Biolink, five));
    assert_eq!(policy.escalation(Category::Biolink).threshold, five);
    assert_eq!(policy.escalation(Category::Profane).threshold.get(), 3);
  }

  #[test]
  fn bounded_values_reject_out_of_range() {
    assert!(WarnThreshold::try_from(2).is_err());
    assert!(WarnThreshold::try_from(6).is_err());
    assert!(NotificationTtl::try_from(2).is_err());
    let hour = NotificationTtl::try_from(60).unwrap();
    assert_eq!(hour.as_duration(), Some(Duration::from_secs(3600)));
  }

  #[test]
  fn literals_match_payload_keys() {
    assert_eq!(Toggle::Links.to_string(), "links");
    assert_eq!("biolink".parse::<Category>().unwrap(), Category::Biolink);
    assert_eq!("ban".parse::<Punishment>().unwrap(), Punishment::Ban);
  }
}
