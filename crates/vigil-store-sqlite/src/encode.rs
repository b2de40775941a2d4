//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Enumerations are stored as
//! their snake_case literal. Ids are stored as integers; `rusqlite` range-checks
//! the unsigned user ids on the way in and out.

use chrono::{DateTime, Utc};
use vigil_core::{
  chat::{ChatId, UserId},
  policy::{
    Category, EscalationRule, GroupPolicy, NotificationTtl, Punishment,
    WarnThreshold,
  },
  store::{GroupRecord, UserRecord},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str {
  match c {
    Category::Profane => "profane",
    Category::Biolink => "biolink",
  }
}

// ─── Punishment ──────────────────────────────────────────────────────────────

pub fn encode_punishment(p: Punishment) -> &'static str {
  match p {
    Punishment::Mute => "mute",
    Punishment::Ban => "ban",
  }
}

pub fn decode_punishment(s: &str) -> Result<Punishment> {
  s.parse().map_err(|_| {
    Error::Core(vigil_core::Error::UnknownLiteral {
      kind:  "punishment",
      value: s.to_owned(),
    })
  })
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// A `group_policies` row joined with its `notification_ttls` row.
pub struct RawPolicy {
  pub delete_profane:     Option<bool>,
  pub delete_edited:      Option<bool>,
  pub delete_links:       Option<bool>,
  pub delete_biolink:     Option<bool>,
  pub profane_threshold:  Option<u8>,
  pub profane_punishment: Option<String>,
  pub biolink_threshold:  Option<u8>,
  pub biolink_punishment: Option<String>,
  pub ttl_minutes:        Option<u16>,
}

fn decode_rule(threshold: Option<u8>, punishment: Option<&str>) -> Result<EscalationRule> {
  let defaults = EscalationRule::default();
  Ok(EscalationRule {
    threshold:  threshold
      .map(WarnThreshold::try_from)
      .transpose()?
      .unwrap_or(defaults.threshold),
    punishment: punishment
      .map(decode_punishment)
      .transpose()?
      .unwrap_or(defaults.punishment),
  })
}

impl RawPolicy {
  pub fn from_policy(policy: &GroupPolicy) -> Self {
    Self {
      delete_profane:     Some(policy.delete_profane),
      delete_edited:      Some(policy.delete_edited),
      delete_links:       Some(policy.delete_links_in_message),
      delete_biolink:     Some(policy.delete_profile_biolink),
      profane_threshold:  Some(policy.profane.threshold.into()),
      profane_punishment: Some(encode_punishment(policy.profane.punishment).to_owned()),
      biolink_threshold:  Some(policy.biolink.threshold.into()),
      biolink_punishment: Some(encode_punishment(policy.biolink.punishment).to_owned()),
      ttl_minutes:        Some(policy.notification_ttl.into()),
    }
  }

  pub fn into_policy(self) -> Result<GroupPolicy> {
    let defaults = GroupPolicy::default();
    Ok(GroupPolicy {
      delete_profane:          self.delete_profane.unwrap_or(defaults.delete_profane),
      delete_edited:           self.delete_edited.unwrap_or(defaults.delete_edited),
      delete_links_in_message: self.delete_links.unwrap_or(defaults.delete_links_in_message),
      delete_profile_biolink:  self.delete_biolink.unwrap_or(defaults.delete_profile_biolink),
      profane:                 decode_rule(
        self.profane_threshold,
        self.profane_punishment.as_deref(),
      )?,
      biolink:                 decode_rule(
        self.biolink_threshold,
        self.biolink_punishment.as_deref(),
      )?,
      notification_ttl:        self
        .ttl_minutes
        .map(NotificationTtl::try_from)
        .transpose()?
        .unwrap_or(defaults.notification_ttl),
    })
  }
}

pub struct RawUser {
  pub user_id:    u64,
  pub username:   Option<String>,
  pub first_name: String,
  pub last_seen:  String,
}

impl RawUser {
  pub fn into_record(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user_id:    UserId(self.user_id),
      username:   self.username,
      first_name: self.first_name,
      last_seen:  decode_dt(&self.last_seen)?,
    })
  }
}

pub struct RawGroup {
  pub group_id:  i64,
  pub title:     Option<String>,
  pub active:    bool,
  pub last_seen: String,
}

impl RawGroup {
  pub fn into_record(self) -> Result<GroupRecord> {
    Ok(GroupRecord {
      group_id:  ChatId(self.group_id),
      title:     self.title,
      active:    self.active,
      last_seen: decode_dt(&self.last_seen)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn all_null_row_decodes_as_default() {
    let raw = RawPolicy {
      delete_profane:     None,
      delete_edited:      None,
      delete_links:       None,
      delete_biolink:     None,
      profane_threshold:  None,
      profane_punishment: None,
      biolink_threshold:  None,
      biolink_punishment: None,
      ttl_minutes:        None,
    };
    assert_eq!(raw.into_policy().unwrap(), GroupPolicy::default());
  }

  #[test]
  fn out_of_range_threshold_is_an_error() {
    let mut raw = RawPolicy::from_policy(&GroupPolicy::default());
    raw.biolink_threshold = Some(9);
    assert!(raw.into_policy().is_err());
  }

  #[test]
  fn punishment_literals_round_trip() {
    for p in [Punishment::Mute, Punishment::Ban] {
      assert_eq!(decode_punishment(encode_punishment(p)).unwrap(), p);
    }
    assert!(decode_punishment("exile").is_err());
  }

  #[test]
  fn timestamps_round_trip() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }
}
