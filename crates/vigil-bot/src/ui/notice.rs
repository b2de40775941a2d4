//! Moderation notifications posted to the group.

use vigil_core::{
  callback::Callback,
  chat::{ChatId, UserId, UserRef},
  classify::ViolationKind,
  keyboard::{Button, Keyboard},
  policy::{Category, Punishment},
};

use super::{Screen, close_button, mention, mention_user};

fn whitelist_button(user: UserId) -> Button {
  Button::callback("✅ Whitelist", Callback::Whitelist(user))
}

/// A warning below the threshold.
pub fn warned(user: &UserRef, kind: ViolationKind, count: u32, threshold: u32) -> Screen {
  let text = format!(
    "⚠️ {}, your message was removed.\n<b>Reason:</b> {}\n<b>Warning:</b> {count}/{threshold}",
    mention_user(user),
    kind.reason(),
  );
  let keyboard = Keyboard::new()
    .row(vec![
      whitelist_button(user.id),
      Button::callback("↩️ Cancel warning", Callback::CancelWarn(user.id)),
    ])
    .button(close_button());
  Screen::new(text, keyboard)
}

pub fn punished(
  user: &UserRef,
  chat: ChatId,
  category: Category,
  punishment: Punishment,
  threshold: u32,
) -> Screen {
  let (icon, verb) = match punishment {
    Punishment::Mute => ("🔇", "muted"),
    Punishment::Ban => ("⛔", "banned"),
  };
  let text = format!(
    "{icon} {}, you have been {verb}.\n<b>Reason:</b> {}\nReached maximum of {threshold} warnings.",
    mention_user(user),
    category.reason(),
  );
  let keyboard = match punishment {
    Punishment::Mute => Keyboard::new()
      .button(Button::callback("🔊 Unmute", Callback::Unmute(user.id, chat)))
      .button(close_button()),
    Punishment::Ban => Keyboard::new().button(close_button()),
  };
  Screen::new(text, keyboard)
}

pub fn edited(user: &UserRef) -> Screen {
  Screen::new(
    format!("✏️ {}, your edited message was removed.", mention_user(user)),
    Keyboard::new().button(close_button()),
  )
}

/// Links never escalate, so no counter is shown.
pub fn link_removed(user: &UserRef) -> Screen {
  Screen::new(
    format!(
      "🔗 {}, your message was removed.\n<b>Reason:</b> {}",
      mention_user(user),
      ViolationKind::LinkInMessage.reason(),
    ),
    Keyboard::new().row(vec![whitelist_button(user.id), close_button()]),
  )
}

pub fn whitelisted(user: UserId, name: &str, admin: &UserRef) -> Screen {
  Screen::new(
    format!(
      "✅ {} was whitelisted by {}. Their warnings were cleared.",
      mention(user, name),
      mention_user(admin),
    ),
    Keyboard::new().button(close_button()),
  )
}

pub fn warnings_cleared(user: UserId, name: &str, admin: &UserRef) -> Screen {
  Screen::new(
    format!("↩️ Warnings for {} were cleared by {}.", mention(user, name), mention_user(admin)),
    Keyboard::new().button(close_button()),
  )
}

pub fn unmuted(user: UserId, name: &str, admin: &UserRef) -> Screen {
  Screen::new(
    format!("🔊 {} was unmuted by {}.", mention(user, name), mention_user(admin)),
    Keyboard::new().button(close_button()),
  )
}

pub fn missing_rights() -> String {
  "🙏 I need admin rights to delete messages and restrict members here.".to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user() -> UserRef {
    UserRef { id: UserId(42), first_name: "<Eve>".into(), username: None, is_bot: false }
  }

  #[test]
  fn warn_shows_reason_and_count_and_escapes_names() {
    let screen = warned(&user(), ViolationKind::Profane, 1, 3);
    assert!(screen.text.contains("your message was removed"));
    assert!(screen.text.contains("profane language"));
    assert!(screen.text.contains("1/3"));
    assert!(screen.text.contains("&lt;Eve&gt;"));
    let callbacks: Vec<_> = screen.keyboard.callbacks().cloned().collect();
    assert_eq!(callbacks, vec![
      Callback::Whitelist(UserId(42)),
      Callback::CancelWarn(UserId(42)),
      Callback::Close,
    ]);
  }

  #[test]
  fn mute_carries_unmute_with_user_and_group() {
    let screen = punished(&user(), ChatId(-100), Category::Profane, Punishment::Mute, 3);
    assert!(screen.text.contains("you have been muted"));
    assert!(screen.text.contains("maximum of 3"));
    assert!(screen.keyboard.callbacks().any(|cb| *cb == Callback::Unmute(UserId(42), ChatId(-100))));
  }

  #[test]
  fn ban_has_only_close() {
    let screen = punished(&user(), ChatId(-100), Category::Biolink, Punishment::Ban, 5);
    assert!(screen.text.contains("you have been banned"));
    assert_eq!(screen.keyboard.callbacks().collect::<Vec<_>>(), vec![&Callback::Close]);
  }

  #[test]
  fn link_notice_has_no_counter() {
    let screen = link_removed(&user());
    assert!(!screen.text.contains("Warning"));
    assert!(screen.keyboard.callbacks().any(|cb| *cb == Callback::Whitelist(UserId(42))));
  }
}
