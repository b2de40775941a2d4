//! Error type for event handlers.
//!
//! No error escapes an event task; handlers return these to the task root,
//! which logs them.

use thiserror::Error;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("platform error: {0}")]
  Platform(#[from] PlatformError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("core error: {0}")]
  Core(#[from] vigil_core::Error),

  #[error("button press has no group context")]
  NoChat,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
