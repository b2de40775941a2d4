//! Token-membership profanity matcher.

use std::collections::HashSet;

/// A set of normalised tokens. A text matches when any of its
/// whitespace-delimited words, normalised the same way, is in the set.
#[derive(Debug, Clone, Default)]
pub struct ProfanityMatcher {
  tokens: HashSet<String>,
}

/// Lowercase and keep only alphanumeric characters.
pub fn normalize(token: &str) -> String {
  token
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(char::to_lowercase)
    .collect()
}

impl ProfanityMatcher {
  pub fn new<I, T>(tokens: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
  {
    let tokens = tokens
      .into_iter()
      .map(|t| normalize(t.as_ref()))
      .filter(|t| !t.is_empty())
      .collect();
    Self { tokens }
  }

  pub fn len(&self) -> usize { self.tokens.len() }

  pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

  pub fn matches(&self, text: &str) -> bool {
    if self.tokens.is_empty() {
      return false;
    }
    text
      .split_whitespace()
      .map(normalize)
      .any(|word| !word.is_empty() && self.tokens.contains(&word))
  }
}
