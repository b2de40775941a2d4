//! Stateless renderers: each returns HTML text and an inline keyboard.

pub mod game;
pub mod notice;
pub mod settings;

use std::time::Duration;

use teloxide::utils::html;
use vigil_core::{
  callback::Callback,
  chat::{UserId, UserRef},
  keyboard::{Button, Keyboard},
};

/// A rendered message: HTML body plus its buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
  pub text:     String,
  pub keyboard: Keyboard,
}

impl Screen {
  pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
    Self { text: text.into(), keyboard }
  }

  /// `None` when there are no buttons, as the platform expects.
  pub fn markup(&self) -> Option<Keyboard> {
    (!self.keyboard.rows.is_empty()).then(|| self.keyboard.clone())
  }
}

pub fn escape(text: &str) -> String { html::escape(text) }

/// A clickable mention that works with or without a username.
pub fn mention(id: UserId, name: &str) -> String {
  format!(r#"<a href="tg://user?id={id}">{}</a>"#, html::escape(name))
}

pub fn mention_user(user: &UserRef) -> String { mention(user.id, &user.display_name()) }

/// A whole-unit duration for display: "5 minutes", "1 minute", "90 seconds".
pub fn span(duration: Duration) -> String {
  let secs = duration.as_secs();
  let (n, unit) = if secs >= 60 && secs % 60 == 0 { (secs / 60, "minute") } else { (secs, "second") };
  if n == 1 { format!("1 {unit}") } else { format!("{n} {unit}s") }
}

pub fn close_button() -> Button { Button::callback("✖️ Close", Callback::Close) }

pub fn back_button(to: Callback) -> Button { Button::callback("⬅️ Back", to) }

const HELP: &str = "\
<b>Vigil</b> keeps your group clean.

• Deletes profanity, links, and edited messages
• Warns repeat offenders, then mutes or bans them
• Removes users who advertise links in their bio

<b>Commands</b>
/settings  configure moderation (admins)
/tictac [@user]  play tic-tac-toe
/lock @user text  a message only they can open
/secret @user text  a popup only they can read

Make me an admin with delete and restrict rights.";

pub fn help() -> Screen {
  Screen::new(
    HELP,
    Keyboard::new()
      .row(vec![
        Button::callback("🤖 Other bots", Callback::OtherBots),
        Button::callback("💝 Donate", Callback::DonateInfo),
      ])
      .button(close_button()),
  )
}

pub fn welcome() -> Screen {
  Screen::new(
    "👋 Thanks for adding me! An admin can configure moderation with /settings.",
    Keyboard::new().button(Button::callback("❓ Help", Callback::Help)),
  )
}

pub const OTHER_BOTS: &str = "More bots from the same developers are listed in the bot's profile.";

pub const DONATE: &str = "Vigil is free. If it helps your group, consider supporting its hosting.";

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spans_prefer_whole_minutes() {
    assert_eq!(span(Duration::from_secs(300)), "5 minutes");
    assert_eq!(span(Duration::from_secs(60)), "1 minute");
    assert_eq!(span(Duration::from_secs(90)), "90 seconds");
    assert_eq!(span(Duration::from_secs(1)), "1 second");
  }
}
