//! Telegram backend: [`ChatPlatform`] over teloxide, update conversion, and
//! the dispatcher loop.

use std::sync::Arc;

use teloxide::{
  ApiError, Bot, RequestError,
  dispatching::{Dispatcher, UpdateFilterExt},
  dptree,
  payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
  requests::{Requester, ResponseResult},
  types::{
    self as tg, CallbackQuery, ChatMemberStatus, ChatPermissions, InlineKeyboardButton,
    InlineKeyboardMarkup, LinkPreviewOptions, Message, MessageEntityKind, ParseMode, Update,
  },
};
use vigil_core::{
  chat::{ChatId, ChatRef, MemberStatus, MessageId, UserId, UserRef},
  event::{ButtonPress, ChatEvent, IncomingMessage},
  keyboard::Keyboard,
  store::ModerationStore,
};

use crate::{
  App,
  platform::{ChatPlatform, PlatformError},
};

// ─── Platform ────────────────────────────────────────────────────────────────

pub struct TelegramPlatform {
  bot:      Bot,
  id:       UserId,
  username: String,
}

impl TelegramPlatform {
  /// Look up the bot's own identity.
  pub async fn connect(bot: Bot) -> Result<Self, PlatformError> {
    let me = bot.get_me().await.map_err(classify)?;
    Ok(Self { id: UserId(me.user.id.0), username: me.username().to_owned(), bot })
  }
}

fn tg_chat(chat: ChatId) -> tg::ChatId { tg::ChatId(chat.0) }

fn tg_user(user: UserId) -> tg::UserId { tg::UserId(user.0) }

fn no_preview() -> LinkPreviewOptions {
  LinkPreviewOptions {
    is_disabled:        true,
    url:                None,
    prefer_small_media: false,
    prefer_large_media: false,
    show_above_text:    false,
  }
}

fn markup(keyboard: &Keyboard) -> Result<InlineKeyboardMarkup, PlatformError> {
  let mut rows = Vec::with_capacity(keyboard.rows.len());
  for row in &keyboard.rows {
    let mut buttons = Vec::with_capacity(row.len());
    for button in row {
      let payload = button.callback.encode().map_err(|e| PlatformError::Invalid(e.to_string()))?;
      buttons.push(InlineKeyboardButton::callback(button.text.clone(), payload));
    }
    rows.push(buttons);
  }
  Ok(InlineKeyboardMarkup::new(rows))
}

impl ChatPlatform for TelegramPlatform {
  fn bot_id(&self) -> UserId { self.id }

  fn bot_username(&self) -> &str { &self.username }

  async fn member_status(&self, chat: ChatId, user: UserId) -> Result<MemberStatus, PlatformError> {
    let member = self.bot.get_chat_member(tg_chat(chat), tg_user(user)).await.map_err(classify)?;
    Ok(match member.status() {
      ChatMemberStatus::Owner => MemberStatus::Owner,
      ChatMemberStatus::Administrator => MemberStatus::Administrator,
      ChatMemberStatus::Member => MemberStatus::Member,
      ChatMemberStatus::Restricted => MemberStatus::Restricted,
      ChatMemberStatus::Left => MemberStatus::Left,
      ChatMemberStatus::Banned => MemberStatus::Banned,
    })
  }

  async fn biography(&self, user: UserId) -> Result<Option<String>, PlatformError> {
    let chat = self.bot.get_chat(tg::ChatId::from(tg_user(user))).await.map_err(classify)?;
    Ok(chat.bio().map(str::to_owned))
  }

  async fn send_message(
    &self,
    chat: ChatId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> Result<MessageId, PlatformError> {
    let mut request = self
      .bot
      .send_message(tg_chat(chat), html)
      .parse_mode(ParseMode::Html)
      .link_preview_options(no_preview());
    if let Some(keyboard) = &keyboard {
      request = request.reply_markup(markup(keyboard)?);
    }
    let sent = request.await.map_err(classify)?;
    Ok(MessageId(sent.id.0))
  }

  async fn edit_message(
    &self,
    chat: ChatId,
    message: MessageId,
    html: String,
    keyboard: Option<Keyboard>,
  ) -> Result<(), PlatformError> {
    let mut request = self
      .bot
      .edit_message_text(tg_chat(chat), tg::MessageId(message.0), html)
      .parse_mode(ParseMode::Html)
      .link_preview_options(no_preview());
    if let Some(keyboard) = &keyboard {
      request = request.reply_markup(markup(keyboard)?);
    }
    request.await.map_err(classify)?;
    Ok(())
  }

  async fn delete_messages(&self, chat: ChatId, messages: Vec<MessageId>) -> Result<(), PlatformError> {
    let mut first_error = None;
    for message in messages {
      if let Err(e) = self.bot.delete_message(tg_chat(chat), tg::MessageId(message.0)).await {
        first_error.get_or_insert(classify(e));
      }
    }
    first_error.map_or(Ok(()), Err)
  }

  async fn set_can_send(&self, chat: ChatId, user: UserId, allowed: bool) -> Result<(), PlatformError> {
    let permissions = if allowed { ChatPermissions::all() } else { ChatPermissions::empty() };
    self
      .bot
      .restrict_chat_member(tg_chat(chat), tg_user(user), permissions)
      .await
      .map_err(classify)?;
    Ok(())
  }

  async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
    self.bot.ban_chat_member(tg_chat(chat), tg_user(user)).await.map_err(classify)?;
    Ok(())
  }

  async fn answer_press(&self, press: String, text: Option<String>, alert: bool) -> Result<(), PlatformError> {
    let mut request = self.bot.answer_callback_query(press).show_alert(alert);
    if let Some(text) = text {
      request = request.text(text);
    }
    request.await.map_err(classify)?;
    Ok(())
  }
}

// ─── Error classification ────────────────────────────────────────────────────

fn classify(e: RequestError) -> PlatformError {
  match e {
    RequestError::RetryAfter(wait) => PlatformError::RateLimited(wait.duration()),
    RequestError::Network(e) => PlatformError::Network(e.to_string()),
    RequestError::Io(e) => PlatformError::Network(e.to_string()),
    RequestError::Api(api) => classify_api(api),
    other => PlatformError::Other(other.to_string()),
  }
}

fn classify_api(api: ApiError) -> PlatformError {
  let text = api.to_string();
  match api {
    ApiError::MessageToDeleteNotFound
    | ApiError::MessageToEditNotFound
    | ApiError::MessageNotModified
    | ApiError::ChatNotFound
    | ApiError::UserNotFound => PlatformError::NotFound(text),
    ApiError::MessageCantBeDeleted | ApiError::NotEnoughRightsToRestrict | ApiError::BotKicked => {
      PlatformError::PermissionDenied(text)
    }
    _ => classify_description(text),
  }
}

/// Fallback for descriptions teloxide has no variant for.
fn classify_description(text: String) -> PlatformError {
  let lower = text.to_lowercase();
  if lower.contains("not enough rights")
    || lower.contains("administrator")
    || lower.contains("can't be deleted")
    || lower.contains("have no rights")
  {
    PlatformError::PermissionDenied(text)
  } else if lower.contains("not found") {
    PlatformError::NotFound(text)
  } else if lower.contains("bad request") {
    PlatformError::Invalid(text)
  } else {
    PlatformError::Other(text)
  }
}

// ─── Update conversion ───────────────────────────────────────────────────────

fn user_ref(user: &tg::User) -> UserRef {
  UserRef {
    id:         UserId(user.id.0),
    first_name: user.first_name.clone(),
    username:   user.username.clone(),
    is_bot:     user.is_bot,
  }
}

fn chat_ref(chat: &tg::Chat) -> ChatRef {
  ChatRef {
    id:       ChatId(chat.id.0),
    title:    chat.title().map(str::to_owned),
    is_group: chat.is_group() || chat.is_supergroup(),
  }
}

/// Convert a message update; membership service messages become member
/// events. Messages without a sender are dropped.
pub fn message_event(msg: &Message, edited: bool) -> Option<ChatEvent> {
  let chat = chat_ref(&msg.chat);
  if let Some(users) = msg.new_chat_members() {
    return Some(ChatEvent::MembersJoined { chat, users: users.iter().map(user_ref).collect() });
  }
  if let Some(user) = msg.left_chat_member() {
    return Some(ChatEvent::MemberLeft { chat, user: user_ref(user) });
  }

  let sender = msg.from.as_ref()?;
  let text = msg.text().or_else(|| msg.caption()).unwrap_or_default().to_owned();
  let entities = msg.entities().or_else(|| msg.caption_entities()).unwrap_or_default();
  let mentions = entities
    .iter()
    .filter_map(|e| match &e.kind {
      MessageEntityKind::TextMention { user } => Some(user_ref(user)),
      _ => None,
    })
    .collect();
  let incoming = IncomingMessage {
    chat,
    sender: user_ref(sender),
    message_id: MessageId(msg.id.0),
    text,
    reply_to: msg.reply_to_message().and_then(|r| r.from.as_ref()).map(user_ref),
    mentions,
  };
  Some(if edited { ChatEvent::Edited(incoming) } else { ChatEvent::Posted(incoming) })
}

pub fn press_event(q: &CallbackQuery) -> Option<ChatEvent> {
  let data = q.data.clone()?;
  let host = q.message.as_ref();
  Some(ChatEvent::ButtonPress(ButtonPress {
    id: q.id.clone(),
    from: user_ref(&q.from),
    chat: host.map(|m| chat_ref(m.chat())),
    message_id: host.map(|m| MessageId(m.id().0)),
    data,
  }))
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

type SharedApp<S> = Arc<App<TelegramPlatform, S>>;

async fn on_message<S: ModerationStore + 'static>(msg: Message, app: SharedApp<S>) -> ResponseResult<()> {
  if let Some(event) = message_event(&msg, false) {
    app.handle(event).await;
  }
  Ok(())
}

async fn on_edited_message<S: ModerationStore + 'static>(msg: Message, app: SharedApp<S>) -> ResponseResult<()> {
  if let Some(event) = message_event(&msg, true) {
    app.handle(event).await;
  }
  Ok(())
}

async fn on_callback_query<S: ModerationStore + 'static>(q: CallbackQuery, app: SharedApp<S>) -> ResponseResult<()> {
  if let Some(event) = press_event(&q) {
    app.handle(event).await;
  }
  Ok(())
}

/// Long-poll updates until interrupted. Updates from one chat are handled in
/// order; chats are handled concurrently.
pub async fn run<S: ModerationStore + 'static>(bot: Bot, app: SharedApp<S>) {
  let handler = dptree::entry()
    .branch(Update::filter_message().endpoint(on_message::<S>))
    .branch(Update::filter_edited_message().endpoint(on_edited_message::<S>))
    .branch(Update::filter_callback_query().endpoint(on_callback_query::<S>));

  Dispatcher::builder(bot, handler)
    .dependencies(dptree::deps![app])
    .default_handler(|_| async {})
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}
