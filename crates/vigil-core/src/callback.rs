//! The inline-button payload grammar.
//!
//! Payloads are underscore-delimited ASCII: the leading tokens name the
//! action, trailing tokens are decimal identifiers or enum literals. Every
//! payload fits the platform's 64-byte limit. [`Callback`] is the parsed
//! form; `Display` renders it back.

use std::{fmt, str::FromStr};

use crate::{
  chat::{ChatId, UserId},
  ephemeral::Fingerprint,
  policy::{Category, NotificationTtl, Punishment, Toggle, WarnThreshold},
  Error, Result,
};

pub const MAX_PAYLOAD_LEN: usize = 64;

/// Settings sub-menus reachable from the root menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPage {
  Toggles,
  Whitelist,
  Notifications,
  Game,
}

impl MenuPage {
  fn literal(self) -> &'static str {
    match self {
      Self::Toggles => "toggles",
      Self::Whitelist => "whitelist",
      Self::Notifications => "notif",
      Self::Game => "game",
    }
  }

  fn from_literal(s: &str) -> Option<Self> {
    match s {
      "toggles" => Some(Self::Toggles),
      "whitelist" => Some(Self::Whitelist),
      "notif" => Some(Self::Notifications),
      "game" => Some(Self::Game),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
  // ── Navigation ───────────────────────────────────────────────────────
  Close,
  Help,
  BackToMain,
  OtherBots,
  DonateInfo,
  Menu(MenuPage),

  // ── Policy ───────────────────────────────────────────────────────────
  Toggle(Toggle),
  ConfigCategory(Category),
  OpenWarnLimit(Category),
  SetLimit(Category, WarnThreshold),
  SetPunishment(Punishment, Category),
  SetNotifTime(NotificationTtl),

  // ── Members ──────────────────────────────────────────────────────────
  Whitelist(UserId),
  Unwhitelist(UserId),
  CancelWarn(UserId),
  Unmute(UserId, ChatId),

  // ── Game ─────────────────────────────────────────────────────────────
  /// Cell index as pressed; range is checked by the game, not the parser.
  GameCell(u8),
  GameJoin(UserId),
  GameNewStarter(UserId),

  // ── Ephemeral messages ───────────────────────────────────────────────
  ShowLock(Fingerprint),
  ShowSecret(Fingerprint),
}

impl Callback {
  /// Whether the router must verify the presser is a group administrator
  /// before dispatch. Navigation is open; game, ephemeral and whitelist
  /// actions are gated by their own handlers.
  pub fn requires_admin(&self) -> bool {
    matches!(
      self,
      Self::Menu(_)
        | Self::Toggle(_)
        | Self::ConfigCategory(_)
        | Self::OpenWarnLimit(_)
        | Self::SetLimit(..)
        | Self::SetPunishment(..)
        | Self::SetNotifTime(_)
        | Self::CancelWarn(_)
        | Self::Unmute(..)
    )
  }

  /// Render and check the 64-byte limit.
  pub fn encode(&self) -> Result<String> {
    let payload = self.to_string();
    if payload.len() > MAX_PAYLOAD_LEN {
      return Err(Error::PayloadTooLong(payload));
    }
    Ok(payload)
  }
}

impl fmt::Display for Callback {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Close => f.write_str("close"),
      Self::Help => f.write_str("help"),
      Self::BackToMain => f.write_str("back_main"),
      Self::OtherBots => f.write_str("other_bots"),
      Self::DonateInfo => f.write_str("donate_info"),
      Self::Menu(page) => write!(f, "menu_{}", page.literal()),
      Self::Toggle(toggle) => write!(f, "toggle_{toggle}"),
      Self::ConfigCategory(cat) => write!(f, "config_{cat}"),
      Self::OpenWarnLimit(cat) => write!(f, "set_warn_limit_{cat}"),
      Self::SetLimit(cat, n) => write!(f, "set_limit_{cat}_{}", n.get()),
      Self::SetPunishment(kind, cat) => write!(f, "set_punishment_{kind}_{cat}"),
      Self::SetNotifTime(ttl) => write!(f, "set_notif_time_{}", ttl.minutes()),
      Self::Whitelist(user) => write!(f, "whitelist_{user}"),
      Self::Unwhitelist(user) => write!(f, "unwhitelist_{user}"),
      Self::CancelWarn(user) => write!(f, "cancel_warn_{user}"),
      Self::Unmute(user, chat) => write!(f, "unmute_{user}_{chat}"),
      Self::GameCell(index) => write!(f, "tictac_{index}"),
      Self::GameJoin(user) => write!(f, "tictac_join_game_{user}"),
      Self::GameNewStarter(user) => write!(f, "tictac_new_game_starter_{user}"),
      Self::ShowLock(fp) => write!(f, "show_lock_{fp}"),
      Self::ShowSecret(fp) => write!(f, "show_secret_{fp}"),
    }
  }
}

fn literal<T: FromStr>(kind: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownLiteral { kind, value: value.to_owned() })
}

fn number<T: FromStr>(payload: &str, value: &str) -> Result<T> {
  // Reject leading '+' and whitespace; `FromStr` for integers accepts '+'.
  if value.is_empty() || value.starts_with('+') {
    return Err(Error::InvalidPayload(payload.to_owned()));
  }
  value.parse().map_err(|_| Error::InvalidPayload(payload.to_owned()))
}

impl FromStr for Callback {
  type Err = Error;

  fn from_str(payload: &str) -> Result<Self> {
    let invalid = || Error::InvalidPayload(payload.to_owned());
    if payload.len() > MAX_PAYLOAD_LEN || !payload.is_ascii() {
      return Err(invalid());
    }

    let parsed = match payload {
      "close" => Self::Close,
      "help" => Self::Help,
      "back_main" => Self::BackToMain,
      "other_bots" => Self::OtherBots,
      "donate_info" => Self::DonateInfo,
      _ => {
        if let Some(rest) = payload.strip_prefix("menu_") {
          Self::Menu(MenuPage::from_literal(rest).ok_or_else(invalid)?)
        } else if let Some(rest) = payload.strip_prefix("toggle_") {
          Self::Toggle(literal("toggle", rest)?)
        } else if let Some(rest) = payload.strip_prefix("config_") {
          Self::ConfigCategory(literal("category", rest)?)
        } else if let Some(rest) = payload.strip_prefix("set_warn_limit_") {
          Self::OpenWarnLimit(literal("category", rest)?)
        } else if let Some(rest) = payload.strip_prefix("set_limit_") {
          let (cat, n) = rest.rsplit_once('_').ok_or_else(invalid)?;
          let threshold = WarnThreshold::try_from(number::<u8>(payload, n)?)?;
          Self::SetLimit(literal("category", cat)?, threshold)
        } else if let Some(rest) = payload.strip_prefix("set_punishment_") {
          let (kind, cat) = rest.split_once('_').ok_or_else(invalid)?;
          Self::SetPunishment(literal("punishment", kind)?, literal("category", cat)?)
        } else if let Some(rest) = payload.strip_prefix("set_notif_time_") {
          Self::SetNotifTime(NotificationTtl::try_from(number::<u16>(payload, rest)?)?)
        } else if let Some(rest) = payload.strip_prefix("whitelist_") {
          Self::Whitelist(UserId(number(payload, rest)?))
        } else if let Some(rest) = payload.strip_prefix("unwhitelist_") {
          Self::Unwhitelist(UserId(number(payload, rest)?))
        } else if let Some(rest) = payload.strip_prefix("cancel_warn_") {
          Self::CancelWarn(UserId(number(payload, rest)?))
        } else if let Some(rest) = payload.strip_prefix("unmute_") {
          let (user, chat) = rest.split_once('_').ok_or_else(invalid)?;
          Self::Unmute(UserId(number(payload, user)?), ChatId(number(payload, chat)?))
        } else if let Some(rest) = payload.strip_prefix("tictac_join_game_") {
          Self::GameJoin(UserId(number(payload, rest)?))
        } else if let Some(rest) = payload.strip_prefix("tictac_new_game_starter_") {
          Self::GameNewStarter(UserId(number(payload, rest)?))
        } else if let Some(rest) = payload.strip_prefix("tictac_") {
          Self::GameCell(number(payload, rest)?)
        } else if let Some(rest) = payload.strip_prefix("show_lock_") {
          Self::ShowLock(rest.parse()?)
        } else if let Some(rest) = payload.strip_prefix("show_secret_") {
          Self::ShowSecret(rest.parse()?)
        } else {
          return Err(invalid());
        }
      }
    };
    Ok(parsed)
  }
}
