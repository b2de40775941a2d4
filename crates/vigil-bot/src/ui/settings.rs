//! The settings menu tree, rendered from a [`GroupPolicy`].

use std::time::Duration;

use vigil_core::{
  callback::{Callback, MenuPage},
  chat::UserId,
  keyboard::{Button, Keyboard},
  policy::{Category, GroupPolicy, NotificationTtl, Punishment, Toggle, WarnThreshold},
};

use super::{Screen, back_button, close_button, escape, span};

/// A settings screen other than the whitelist, which needs the member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
  Root,
  Toggles,
  Notifications,
  /// Carries the configured inactivity period.
  Game(Duration),
  Category(Category),
  WarnLimit(Category),
}

fn check(on: bool) -> &'static str { if on { "✅" } else { "❌" } }

fn selected(label: String, on: bool) -> String { if on { format!("• {label} •") } else { label } }

fn category_title(category: Category) -> &'static str {
  match category {
    Category::Profane => "Profanity",
    Category::Biolink => "Links in bio",
  }
}

fn ttl_label(ttl: NotificationTtl) -> String {
  match ttl.minutes() {
    0 => "Keep".to_owned(),
    m => format!("{m} min"),
  }
}

pub fn render(page: Page, policy: &GroupPolicy) -> Screen {
  match page {
    Page::Root => root(),
    Page::Toggles => toggles(policy),
    Page::Notifications => notifications(policy),
    Page::Game(inactivity) => game(inactivity),
    Page::Category(category) => category_page(policy, category),
    Page::WarnLimit(category) => warn_limit(policy, category),
  }
}

fn root() -> Screen {
  let keyboard = Keyboard::new()
    .button(Button::callback("🛡 Moderation", Callback::Menu(MenuPage::Toggles)))
    .row(
      Category::ALL
        .into_iter()
        .map(|c| Button::callback(format!("⚠️ {}", category_title(c)), Callback::ConfigCategory(c)))
        .collect(),
    )
    .row(vec![
      Button::callback("✅ Whitelist", Callback::Menu(MenuPage::Whitelist)),
      Button::callback("⏱ Notifications", Callback::Menu(MenuPage::Notifications)),
    ])
    .button(Button::callback("🎮 Game", Callback::Menu(MenuPage::Game)))
    .row(vec![Button::callback("❓ Help", Callback::Help), close_button()]);
  Screen::new("⚙️ <b>Group settings</b>\nChoose what to configure.", keyboard)
}

fn toggles(policy: &GroupPolicy) -> Screen {
  let mut keyboard = Keyboard::new();
  for toggle in Toggle::ALL {
    keyboard = keyboard.button(Button::callback(
      format!("{} {}", check(policy.toggle(toggle)), toggle.label()),
      Callback::Toggle(toggle),
    ));
  }
  keyboard = keyboard.button(back_button(Callback::BackToMain));
  Screen::new("🛡 <b>Moderation</b>\nTap a rule to switch it on or off.", keyboard)
}

fn category_page(policy: &GroupPolicy, category: Category) -> Screen {
  let rule = policy.escalation(category);
  let text = format!(
    "⚠️ <b>{}</b>\nWarnings before punishment: {}\nPunishment: {}",
    category_title(category),
    rule.threshold.get(),
    rule.punishment,
  );
  let punishments = [(Punishment::Mute, "🔇 Mute"), (Punishment::Ban, "⛔ Ban")]
    .into_iter()
    .map(|(p, label)| {
      Button::callback(selected(label.to_owned(), rule.punishment == p), Callback::SetPunishment(p, category))
    })
    .collect();
  let keyboard = Keyboard::new()
    .button(Button::callback(
      format!("🔢 Warn limit: {}", rule.threshold.get()),
      Callback::OpenWarnLimit(category),
    ))
    .row(punishments)
    .button(back_button(Callback::BackToMain));
  Screen::new(text, keyboard)
}

fn warn_limit(policy: &GroupPolicy, category: Category) -> Screen {
  let current = policy.escalation(category).threshold;
  let choices = WarnThreshold::ALLOWED
    .into_iter()
    .filter_map(|n| WarnThreshold::try_from(n).ok())
    .map(|n| {
      Button::callback(selected(n.get().to_string(), n == current), Callback::SetLimit(category, n))
    })
    .collect();
  Screen::new(
    format!("🔢 <b>{}</b>\nHow many warnings before punishment?", category_title(category)),
    Keyboard::new().row(choices).button(back_button(Callback::ConfigCategory(category))),
  )
}

fn notifications(policy: &GroupPolicy) -> Screen {
  let choices = NotificationTtl::ALLOWED
    .into_iter()
    .filter_map(|m| NotificationTtl::try_from(m).ok())
    .map(|ttl| {
      Button::callback(selected(ttl_label(ttl), ttl == policy.notification_ttl), Callback::SetNotifTime(ttl))
    })
    .collect();
  Screen::new(
    "⏱ <b>Notifications</b>\nDelete my notices after:",
    Keyboard::new().row(choices).button(back_button(Callback::BackToMain)),
  )
}

fn game(inactivity: Duration) -> Screen {
  Screen::new(
    format!(
      "🎮 <b>Tic-tac-toe</b>\nStart with /tictac, /tictac @user, or /tictac @player1 @player2.\n\
       Games are cancelled after {} without a move.",
      span(inactivity),
    ),
    Keyboard::new().button(back_button(Callback::BackToMain)),
  )
}

/// The whitelist page; `members` are `(id, display name)` in insertion order.
pub fn whitelist(members: &[(UserId, String)]) -> Screen {
  let text = if members.is_empty() {
    "✅ <b>Whitelist</b>\nNobody is whitelisted. Use the Whitelist button on a warning.".to_owned()
  } else {
    let mut text = "✅ <b>Whitelist</b>\nTap a member to remove them.".to_owned();
    for (id, name) in members {
      text.push_str(&format!("\n• {} ({id})", escape(name)));
    }
    text
  };
  let mut keyboard = Keyboard::new();
  for (id, name) in members {
    keyboard = keyboard.button(Button::callback(format!("🗑 {name}"), Callback::Unwhitelist(*id)));
  }
  Screen::new(text, keyboard.button(back_button(Callback::BackToMain)))
}

#[cfg(test)]
mod tests {
  use vigil_core::policy::PolicyChange;

  use super::*;

  #[test]
  fn every_payload_fits_the_limit() {
    let policy = GroupPolicy::default();
    let pages = [
      Page::Root,
      Page::Toggles,
      Page::Notifications,
      Page::Game(Duration::from_secs(300)),
      Page::Category(Category::Profane),
      Page::WarnLimit(Category::Biolink),
    ];
    for page in pages {
      for cb in render(page, &policy).keyboard.callbacks() {
        assert!(cb.encode().is_ok(), "{cb:?}");
      }
    }
  }

  #[test]
  fn toggles_reflect_policy() {
    let mut policy = GroupPolicy::default();
    policy.apply(PolicyChange::Flip(Toggle::Edited));
    let screen = render(Page::Toggles, &policy);
    assert!(screen.keyboard.find("❌ Delete edited messages").is_some());
    assert!(screen.keyboard.find("✅ Delete profanity").is_some());
  }

  #[test]
  fn warn_limit_offers_allowed_thresholds() {
    let screen = render(Page::WarnLimit(Category::Profane), &GroupPolicy::default());
    assert!(screen.keyboard.find("• 3 •").is_some());
    assert!(screen.keyboard.find("4").is_some());
    assert!(screen.keyboard.find("5").is_some());
  }

  #[test]
  fn game_page_states_configured_inactivity() {
    let screen = render(Page::Game(Duration::from_secs(120)), &GroupPolicy::default());
    assert!(screen.text.contains("after 2 minutes without"), "{}", screen.text);
  }

  #[test]
  fn whitelist_lists_members_with_remove_buttons() {
    let screen = whitelist(&[(UserId(7), "Ada".into())]);
    assert!(screen.text.contains("Ada (7)"));
    assert!(screen.keyboard.callbacks().any(|cb| *cb == Callback::Unwhitelist(UserId(7))));
  }
}
