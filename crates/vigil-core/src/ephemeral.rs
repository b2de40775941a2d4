//! Single-delivery holder for locked and secret messages.
//!
//! Records live in process memory only and are keyed by an opaque
//! [`Fingerprint`]. A record can be taken exactly once, and only by its
//! target; a wrong presser leaves it in place.

use std::{
  collections::HashMap,
  fmt,
  str::FromStr,
  sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
  },
};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{
  chat::{ChatId, UserId},
  Error, Result,
};

/// Hex characters kept from the SHA-256 digest.
const FINGERPRINT_LEN: usize = 16;

/// Opaque lowercase-hex key of an ephemeral record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
  fn derive(group: ChatId, sender: UserId, target: UserId, sequence: u64) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(group.0.to_be_bytes());
    hasher.update(sender.0.to_be_bytes());
    hasher.update(target.0.to_be_bytes());
    hasher.update(sequence.to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    Self(digest[..FINGERPRINT_LEN].to_owned())
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for Fingerprint {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let valid = !s.is_empty()
      && s.len() <= 2 * FINGERPRINT_LEN
      && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if valid {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidFingerprint(s.to_owned()))
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EphemeralKind {
  /// Revealed by editing the carrier message, which then self-destructs.
  Locked,
  /// Revealed in a popup only.
  Secret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralRecord {
  pub group:       ChatId,
  pub sender:      UserId,
  pub sender_name: String,
  pub target:      UserId,
  pub target_name: String,
  pub payload:     String,
  pub kind:        EphemeralKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RevealError {
  #[error("no longer available")]
  Gone,
  #[error("not for you")]
  NotForYou,
}

#[derive(Debug, Default)]
pub struct EphemeralStore {
  records:  Mutex<HashMap<Fingerprint, EphemeralRecord>>,
  sequence: AtomicU64,
}

impl EphemeralStore {
  pub fn new() -> Self { Self::default() }

  /// Store `record` under a fresh fingerprint.
  pub fn insert(&self, record: EphemeralRecord) -> Fingerprint {
    let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
    let fingerprint = Fingerprint::derive(record.group, record.sender, record.target, sequence);
    self.lock().insert(fingerprint.clone(), record);
    fingerprint
  }

  /// Take the record if `presser` is its target.
  pub fn reveal(&self, fingerprint: &Fingerprint, presser: UserId) -> Result<EphemeralRecord, RevealError> {
    let mut records = self.lock();
    match records.get(fingerprint) {
      None => Err(RevealError::Gone),
      Some(record) if record.target != presser => Err(RevealError::NotForYou),
      Some(_) => records.remove(fingerprint).ok_or(RevealError::Gone),
    }
  }

  /// Drop a record whose carrier could not be posted.
  pub fn discard(&self, fingerprint: &Fingerprint) -> bool { self.lock().remove(fingerprint).is_some() }

  pub fn contains(&self, fingerprint: &Fingerprint) -> bool { self.lock().contains_key(fingerprint) }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Fingerprint, EphemeralRecord>> {
    // A poisoned map still holds consistent entries; each mutation is a
    // single map operation.
    self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(kind: EphemeralKind) -> EphemeralRecord {
    EphemeralRecord {
      group: ChatId(-100),
      sender: UserId(1),
      sender_name: "S".into(),
      target: UserId(2),
      target_name: "T".into(),
      payload: "hello".into(),
      kind,
    }
  }

  #[test]
  fn fingerprints_are_fresh_and_parseable() {
    let store = EphemeralStore::new();
    let a = store.insert(record(EphemeralKind::Locked));
    let b = store.insert(record(EphemeralKind::Locked));
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), FINGERPRINT_LEN);
    assert_eq!(a.to_string().parse::<Fingerprint>().unwrap(), a);
  }

  #[test]
  fn wrong_presser_leaves_record_in_place() {
    let store = EphemeralStore::new();
    let fp = store.insert(record(EphemeralKind::Secret));
    assert_eq!(store.reveal(&fp, UserId(3)), Err(RevealError::NotForYou));
    assert!(store.contains(&fp));
  }

  #[test]
  fn reveal_happens_at_most_once() {
    let store = EphemeralStore::new();
    let fp = store.insert(record(EphemeralKind::Locked));
    let revealed = store.reveal(&fp, UserId(2)).unwrap();
    assert_eq!(revealed.payload, "hello");
    assert_eq!(store.reveal(&fp, UserId(2)), Err(RevealError::Gone));
    assert!(store.is_empty());
  }

  #[test]
  fn rejects_non_hex_fingerprints() {
    assert!("".parse::<Fingerprint>().is_err());
    assert!("ABCDEF".parse::<Fingerprint>().is_err());
    assert!("0123456789abcdef0123456789abcdef0".parse::<Fingerprint>().is_err());
  }
}
