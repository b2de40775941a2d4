//! Message classification against a [`GroupPolicy`].
//!
//! Rules are evaluated in a fixed priority: edit, profanity, link in message,
//! profile biography. The biography lives on the platform, so the classifier
//! only signals that it must be fetched; [`contains_link`] is then applied
//! to the fetched text.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
  policy::{Category, GroupPolicy},
  profanity::ProfanityMatcher,
};

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(?:https?://|www\.|t\.me/|telegra\.ph/)[^\s]+\b|@\w+")
    .expect("link pattern is valid")
});

/// Whether `text` contains a URL or a standalone `@handle`.
pub fn contains_link(text: &str) -> bool { LINK_PATTERN.is_match(text) }

/// What a message was found to violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
  Profane,
  LinkInMessage,
  Biolink,
}

impl ViolationKind {
  /// The escalating category, or `None` for informational-only violations.
  pub fn category(self) -> Option<Category> {
    match self {
      Self::Profane => Some(Category::Profane),
      Self::Biolink => Some(Category::Biolink),
      Self::LinkInMessage => None,
    }
  }

  pub fn reason(self) -> &'static str {
    match self {
      Self::Profane => Category::Profane.reason(),
      Self::Biolink => Category::Biolink.reason(),
      Self::LinkInMessage => "link in message",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Clean,
  EditedMessage,
  Violation(ViolationKind),
  /// No text rule fired; the sender's biography must be checked.
  CheckBiography,
}

pub fn classify(
  policy: &GroupPolicy,
  matcher: &ProfanityMatcher,
  text: &str,
  is_edit: bool,
) -> Verdict {
  if text.is_empty() {
    return Verdict::Clean;
  }
  if is_edit && policy.delete_edited {
    return Verdict::EditedMessage;
  }
  if policy.delete_profane && matcher.matches(text) {
    return Verdict::Violation(ViolationKind::Profane);
  }
  if policy.delete_links_in_message && contains_link(text) {
    return Verdict::Violation(ViolationKind::LinkInMessage);
  }
  if policy.delete_profile_biolink {
    return Verdict::CheckBiography;
  }
  Verdict::Clean
}
