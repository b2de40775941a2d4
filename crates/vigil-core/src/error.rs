//! Error types for `vigil-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid button payload: {0:?}")]
  InvalidPayload(String),

  #[error("button payload exceeds 64 bytes: {0:?}")]
  PayloadTooLong(String),

  #[error("warn threshold must be 3, 4 or 5, got {0}")]
  InvalidThreshold(u8),

  #[error("notification ttl must be 0, 1, 5, 10 or 60 minutes, got {0}")]
  InvalidTtl(u16),

  #[error("unknown {kind} literal: {value:?}")]
  UnknownLiteral { kind: &'static str, value: String },

  #[error("invalid fingerprint: {0:?}")]
  InvalidFingerprint(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
