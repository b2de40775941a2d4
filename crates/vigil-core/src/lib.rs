//! Domain model of the Vigil group moderator: policies, classification,
//! commands and callback payloads, the tic-tac-toe rules, hidden messages,
//! and the [`store::ModerationStore`] trait.
//!
//! Nothing here talks to Telegram or SQLite.

pub mod board;
pub mod callback;
pub mod chat;
pub mod classify;
pub mod command;
pub mod ephemeral;
pub mod error;
pub mod event;
pub mod game;
pub mod keyboard;
pub mod policy;
pub mod profanity;
pub mod store;

pub use error::{Error, Result};
