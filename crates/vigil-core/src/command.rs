//! Slash-command grammar.

use thiserror::Error;

/// Longest payload the platform shows in an alert popup.
pub const SECRET_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Start,
  Help,
  Settings,
  /// Zero, one or two `@handle` opponents.
  TicTac { handles: Vec<String> },
  /// `target` is `None` when the command replies to the recipient.
  Lock { target: Option<String>, text: String },
  Secret { target: Option<String>, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  #[error("usage: {0}")]
  Usage(&'static str),
  #[error("secret messages are limited to {SECRET_MAX_CHARS} characters")]
  SecretTooLong,
}

const LOCK_USAGE: &str = "/lock @user text (or reply with /lock text)";
const SECRET_USAGE: &str = "/secret @user text (or reply with /secret text)";
const TICTAC_USAGE: &str = "/tictac [@opponent] or /tictac @player1 @player2";

fn handle(token: &str) -> Option<&str> {
  token
    .strip_prefix('@')
    .filter(|h| !h.is_empty() && h.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

fn addressed(args: &str, usage: &'static str) -> Result<(Option<String>, String), CommandError> {
  let args = args.trim();
  let (first, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
  let (target, text) = match handle(first) {
    Some(h) => (Some(h.to_owned()), rest.trim()),
    None => (None, args),
  };
  if text.is_empty() {
    return Err(CommandError::Usage(usage));
  }
  Ok((target, text.to_owned()))
}

/// Parse `text` as a command for the bot named `bot_username`.
///
/// Returns `None` when the text is not a known command or is addressed to
/// another bot.
pub fn parse(text: &str, bot_username: &str) -> Option<Result<Command, CommandError>> {
  let body = text.strip_prefix('/')?;
  let (head, args) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
  let name = match head.split_once('@') {
    Some((name, bot)) if bot.eq_ignore_ascii_case(bot_username) => name,
    Some(_) => return None,
    None => head,
  };

  let parsed = match name.to_ascii_lowercase().as_str() {
    "start" => Ok(Command::Start),
    "help" => Ok(Command::Help),
    "settings" => Ok(Command::Settings),
    "tictac" => {
      let tokens: Vec<&str> = args.split_whitespace().collect();
      let handles: Option<Vec<String>> =
        tokens.iter().map(|t| handle(t).map(str::to_owned)).collect();
      match handles {
        Some(handles) if handles.len() <= 2 => Ok(Command::TicTac { handles }),
        _ => Err(CommandError::Usage(TICTAC_USAGE)),
      }
    }
    "lock" => addressed(args, LOCK_USAGE).map(|(target, text)| Command::Lock { target, text }),
    "secret" => addressed(args, SECRET_USAGE).and_then(|(target, text)| {
      if text.chars().count() > SECRET_MAX_CHARS {
        Err(CommandError::SecretTooLong)
      } else {
        Ok(Command::Secret { target, text })
      }
    }),
    _ => return None,
  };
  Some(parsed)
}
