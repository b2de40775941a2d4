//! End-to-end tests: events in, recorded platform effects out.

use std::{sync::Arc, time::Duration};

use vigil_core::{
  board::{Board, Mark},
  callback::Callback,
  chat::{ChatId, ChatRef, MemberStatus, MessageId, UserId, UserRef},
  event::{ButtonPress, ChatEvent, IncomingMessage},
  game::{GameState, Match},
  policy::{Category, NotificationTtl, PolicyChange, Punishment},
  profanity::ProfanityMatcher,
  store::ModerationStore,
};
use vigil_store_sqlite::SqliteStore;

use crate::{
  App, Timings,
  games::{GameCoordinator, GameNotice},
  handlers::contender,
  mock::{Effect, MockPlatform},
  ui::{game::NEW_GAME, notice},
};

const BOT: UserId = UserId(1);
const GROUP: ChatId = ChatId(-100);

fn group() -> ChatRef { ChatRef { id: GROUP, title: Some("Test group".into()), is_group: true } }

fn user(id: u64, name: &str) -> UserRef {
  UserRef { id: UserId(id), first_name: name.into(), username: Some(name.to_lowercase()), is_bot: false }
}

fn bot_user() -> UserRef {
  UserRef { id: BOT, first_name: "Vigil".into(), username: Some("vigil_bot".into()), is_bot: true }
}

async fn app() -> App<MockPlatform, SqliteStore> {
  App::new(
    MockPlatform::new(BOT),
    SqliteStore::open_in_memory().await.unwrap(),
    ProfanityMatcher::new(["fuck"]),
    Timings::default(),
  )
}

fn incoming(sender: &UserRef, message: i32, text: &str) -> IncomingMessage {
  IncomingMessage {
    chat:       group(),
    sender:     sender.clone(),
    message_id: MessageId(message),
    text:       text.into(),
    reply_to:   None,
    mentions:   vec![],
  }
}

fn post(sender: &UserRef, message: i32, text: &str) -> ChatEvent { ChatEvent::Posted(incoming(sender, message, text)) }

fn press(from: &UserRef, host: Option<MessageId>, data: impl ToString) -> ChatEvent {
  ChatEvent::ButtonPress(ButtonPress {
    id:         "press".into(),
    from:       from.clone(),
    chat:       Some(group()),
    message_id: host,
    data:       data.to_string(),
  })
}

fn restrictions(platform: &MockPlatform) -> Vec<Effect> {
  platform
    .effects()
    .into_iter()
    .filter(|e| matches!(e, Effect::CanSend { .. } | Effect::Banned { .. }))
    .collect()
}

// ── Moderation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_profane_posts_warn_twice_then_mute() {
  let app = app().await;
  let eve = user(42, "Eve");
  for message in 10..13 {
    app.handle(post(&eve, message, "fuck this")).await;
  }

  let platform = &app.platform;
  assert_eq!(platform.deleted(), vec![MessageId(10), MessageId(11), MessageId(12)]);
  let sent = platform.sent();
  assert_eq!(sent.len(), 3);
  assert!(sent[0].1.contains("1/3"), "{}", sent[0].1);
  assert!(sent[1].1.contains("2/3"), "{}", sent[1].1);
  assert!(sent[2].1.contains("you have been muted"), "{}", sent[2].1);
  assert_eq!(restrictions(platform), vec![Effect::CanSend { chat: GROUP, user: eve.id, allowed: false }]);
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 3);
}

#[tokio::test]
async fn ban_punishment_removes_the_member() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.store.update_policy(GROUP, PolicyChange::Punishment(Category::Profane, Punishment::Ban)).await.unwrap();
  for message in 10..13 {
    app.handle(post(&eve, message, "fuck")).await;
  }
  assert_eq!(restrictions(&app.platform), vec![Effect::Banned { chat: GROUP, user: eve.id }]);
  assert!(app.platform.sent()[2].1.contains("you have been banned"));
}

#[tokio::test]
async fn admin_links_are_left_alone() {
  let app = app().await;
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Administrator);
  app.handle(post(&admin, 10, "https://x")).await;

  assert!(app.platform.deleted().is_empty());
  assert!(app.platform.sent().is_empty());
  assert_eq!(app.store.warning_count(GROUP, admin.id, Category::Profane).await.unwrap(), 0);
}

#[tokio::test]
async fn whitelisted_members_skip_classification() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.store.add_whitelist(GROUP, eve.id).await.unwrap();
  app.handle(post(&eve, 10, "fuck")).await;

  assert!(app.platform.deleted().is_empty());
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 0);
}

#[tokio::test]
async fn own_messages_are_ignored() {
  let app = app().await;
  app.handle(post(&bot_user(), 10, "fuck")).await;
  assert!(app.platform.effects().is_empty());
}

#[tokio::test]
async fn concurrent_offences_punish_exactly_once() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.store.increment_warning(GROUP, eve.id, Category::Profane).await.unwrap();

  tokio::join!(app.handle(post(&eve, 11, "fuck")), app.handle(post(&eve, 12, "fuck")));

  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 3);
  assert_eq!(restrictions(&app.platform).len(), 1);
  let sent = app.platform.sent();
  assert_eq!(sent.iter().filter(|(_, html, _)| html.contains("2/3")).count(), 1);
  assert_eq!(sent.iter().filter(|(_, html, _)| html.contains("you have been muted")).count(), 1);
}

#[tokio::test]
async fn handle_only_message_is_a_link_without_counter() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.handle(post(&eve, 10, "@someone")).await;

  assert_eq!(app.platform.deleted(), vec![MessageId(10)]);
  let sent = app.platform.sent();
  assert_eq!(sent.len(), 1);
  assert!(sent[0].1.contains("link in message"));
  for category in Category::ALL {
    assert_eq!(app.store.warning_count(GROUP, eve.id, category).await.unwrap(), 0);
  }
}

#[tokio::test]
async fn link_in_bio_escalates() {
  let app = app().await;
  let eve = user(42, "Eve");
  let bob = user(43, "Bob");
  app.platform.set_bio(eve.id, "www.x");
  app.platform.set_bio(bob.id, "");
  app.handle(post(&eve, 10, "hello")).await;
  app.handle(post(&bob, 11, "hello")).await;

  assert_eq!(app.platform.deleted(), vec![MessageId(10)]);
  assert!(app.platform.sent()[0].1.contains("link in profile bio"));
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Biolink).await.unwrap(), 1);
  assert_eq!(app.store.warning_count(GROUP, bob.id, Category::Biolink).await.unwrap(), 0);
}

#[tokio::test]
async fn edits_are_removed_when_enabled() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.handle(ChatEvent::Edited(incoming(&eve, 10, "harmless"))).await;

  assert_eq!(app.platform.deleted(), vec![MessageId(10)]);
  assert!(app.platform.sent()[0].1.contains("your edited message was removed"));
}

#[tokio::test]
async fn empty_text_is_clean() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.platform.set_bio(eve.id, "www.x");
  app.handle(post(&eve, 10, "")).await;
  assert!(app.platform.deleted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn notifications_expire_after_ttl() {
  let app = app().await;
  let eve = user(42, "Eve");
  let ttl = NotificationTtl::try_from(1).unwrap();
  app.store.update_policy(GROUP, PolicyChange::NotificationTtl(ttl)).await.unwrap();
  app.handle(post(&eve, 10, "fuck")).await;
  let (notice, ..) = app.platform.sent()[0].clone();

  tokio::time::sleep(Duration::from_secs(59)).await;
  assert_eq!(app.platform.deleted(), vec![MessageId(10)]);
  tokio::time::sleep(Duration::from_secs(2)).await;
  assert_eq!(app.platform.deleted(), vec![MessageId(10), notice]);
}

#[tokio::test]
async fn permission_hint_is_posted_once_and_counting_continues() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.platform.deny_deletes();
  app.handle(post(&eve, 10, "fuck")).await;
  app.handle(post(&eve, 11, "fuck")).await;

  let sent = app.platform.sent();
  assert_eq!(sent.iter().filter(|(_, html, _)| *html == notice::missing_rights()).count(), 1);
  assert!(sent.iter().any(|(_, html, _)| html.contains("2/3")));
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_notification_is_retried() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.platform.rate_limit_sends(1);
  app.handle(post(&eve, 10, "fuck")).await;

  let sent = app.platform.sent();
  assert_eq!(sent.len(), 1);
  assert!(sent[0].1.contains("1/3"));
}

// ── Settings and member actions ─────────────────────────────────────────────

#[tokio::test]
async fn settings_actions_are_admin_only() {
  let app = app().await;
  let eve = user(42, "Eve");
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Owner);

  app.handle(press(&eve, Some(MessageId(500)), "toggle_profane")).await;
  assert_eq!(app.platform.answers().pop(), Some((Some("admins only".to_owned()), true)));
  assert_eq!(app.store.get_policy(GROUP).await.unwrap(), None);

  app.handle(press(&admin, Some(MessageId(500)), "toggle_profane")).await;
  let policy = app.store.get_policy(GROUP).await.unwrap().unwrap();
  assert!(!policy.delete_profane);
  let (message, _, keyboard) = app.platform.edits().pop().unwrap();
  assert_eq!(message, MessageId(500));
  assert!(keyboard.unwrap().find("❌ Delete profanity").is_some());
}

#[tokio::test]
async fn threshold_and_ttl_buttons_update_policy() {
  let app = app().await;
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Administrator);
  app.handle(press(&admin, Some(MessageId(500)), "set_limit_biolink_5")).await;
  app.handle(press(&admin, Some(MessageId(500)), "set_notif_time_10")).await;

  let policy = app.store.get_policy(GROUP).await.unwrap().unwrap();
  assert_eq!(policy.biolink.threshold.get(), 5);
  assert_eq!(policy.notification_ttl.minutes(), 10);
}

#[tokio::test]
async fn whitelist_button_exempts_and_resets() {
  let app = app().await;
  let eve = user(42, "Eve");
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Administrator);
  app.handle(post(&eve, 10, "fuck")).await;
  let host = app.platform.host_of(&Callback::Whitelist(eve.id)).unwrap();

  app.handle(press(&eve, Some(host), Callback::Whitelist(eve.id))).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some("admins only"));
  assert!(!app.store.is_whitelisted(GROUP, eve.id).await.unwrap());

  app.handle(press(&admin, Some(host), Callback::Whitelist(eve.id))).await;
  assert!(app.store.is_whitelisted(GROUP, eve.id).await.unwrap());
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 0);
  assert!(app.platform.edits().pop().unwrap().1.contains("was whitelisted"));

  app.handle(post(&eve, 11, "fuck")).await;
  assert_eq!(app.platform.deleted(), vec![MessageId(10)]);
}

#[tokio::test]
async fn unmute_restores_send_right_and_resets() {
  let app = app().await;
  let eve = user(42, "Eve");
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Administrator);
  for message in 10..13 {
    app.handle(post(&eve, message, "fuck")).await;
  }
  let unmute = Callback::Unmute(eve.id, GROUP);
  let host = app.platform.host_of(&unmute).unwrap();
  app.handle(press(&admin, Some(host), unmute)).await;

  assert_eq!(restrictions(&app.platform).pop(), Some(Effect::CanSend { chat: GROUP, user: eve.id, allowed: true }));
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 0);
}

#[tokio::test]
async fn refused_unmute_is_not_announced() {
  let app = app().await;
  let eve = user(42, "Eve");
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Administrator);
  for message in 10..13 {
    app.handle(post(&eve, message, "fuck")).await;
  }
  let unmute = Callback::Unmute(eve.id, GROUP);
  let host = app.platform.host_of(&unmute).unwrap();
  app.platform.deny_rights();
  app.handle(press(&admin, Some(host), unmute)).await;

  assert_eq!(
    app.platform.answers().pop(),
    Some((Some("could not unmute, check my admin rights".to_owned()), false))
  );
  assert!(app.platform.edits().is_empty());
  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 0);
}

#[tokio::test]
async fn cancel_warning_resets_counters() {
  let app = app().await;
  let eve = user(42, "Eve");
  let admin = user(7, "Ada");
  app.platform.set_status(GROUP, admin.id, MemberStatus::Administrator);
  app.handle(post(&eve, 10, "fuck")).await;
  let host = app.platform.host_of(&Callback::CancelWarn(eve.id)).unwrap();
  app.handle(press(&admin, Some(host), Callback::CancelWarn(eve.id))).await;

  assert_eq!(app.store.warning_count(GROUP, eve.id, Category::Profane).await.unwrap(), 0);
  assert_eq!(app.platform.last_answer().as_deref(), Some("warnings cleared"));
}

#[tokio::test]
async fn close_deletes_the_host_and_bad_payloads_are_refused() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.handle(press(&eve, Some(MessageId(77)), "close")).await;
  assert_eq!(app.platform.deleted(), vec![MessageId(77)]);

  app.handle(press(&eve, Some(MessageId(77)), "launch_missiles")).await;
  assert_eq!(app.platform.answers().pop().map(|(_, alert)| alert), Some(true));
}

// ── Commands and membership ─────────────────────────────────────────────────

#[tokio::test]
async fn commands_bypass_moderation() {
  let app = app().await;
  let eve = user(42, "Eve");
  app.handle(post(&eve, 10, "/help@vigil_bot")).await;
  app.handle(post(&eve, 11, "/settings")).await;

  assert!(app.platform.deleted().is_empty());
  let sent = app.platform.sent();
  assert!(sent[0].1.contains("Commands"));
  assert!(sent[1].1.contains("Only group admins"));
}

#[tokio::test]
async fn private_chats_only_get_help() {
  let app = app().await;
  let eve = user(42, "Eve");
  let mut start = incoming(&eve, 10, "/start");
  start.chat = ChatRef { id: ChatId(42), title: None, is_group: false };
  let mut rude = start.clone();
  rude.text = "fuck".into();
  app.handle(ChatEvent::Posted(start)).await;
  app.handle(ChatEvent::Posted(rude)).await;

  assert_eq!(app.platform.sent().len(), 1);
  assert!(app.platform.deleted().is_empty());
}

#[tokio::test]
async fn bot_membership_tracks_group_activity() {
  let app = app().await;
  app.handle(ChatEvent::MembersJoined { chat: group(), users: vec![bot_user()] }).await;
  assert!(app.store.get_group(GROUP).await.unwrap().unwrap().active);
  assert!(app.platform.sent()[0].1.contains("/settings"));

  app.handle(ChatEvent::MemberLeft { chat: group(), user: bot_user() }).await;
  assert!(!app.store.get_group(GROUP).await.unwrap().unwrap().active);

  app.handle(ChatEvent::MembersJoined { chat: group(), users: vec![bot_user()] }).await;
  assert!(app.store.get_group(GROUP).await.unwrap().unwrap().active);
  assert_eq!(app.platform.sent().len(), 2);
}

// ── Games ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn out_of_turn_press_is_rejected() {
  let app = app().await;
  let a = user(2, "Ann");
  let b = user(3, "Bob");
  app.games.begin(GROUP, [contender(&b), contender(&a)], None).await.unwrap();
  let board = app.platform.host_of(&Callback::GameCell(0)).unwrap();

  app.handle(press(&a, Some(board), "tictac_0")).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some("not your turn"));
  let Some(GameState::InProgress(game)) = app.games.state(GROUP).await else {
    panic!("game should still be running");
  };
  assert_eq!(game.board().empty_cells(), 9);
  assert_eq!(game.turn_holder().id, b.id);

  app.handle(press(&user(9, "Zed"), Some(board), "tictac_4")).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some("not a player"));
}

#[tokio::test]
async fn winning_move_ends_the_game() {
  let app = app().await;
  let a = user(2, "Ann");
  let b = user(3, "Bob");
  let (x, o) = (Some(Mark::X), Some(Mark::O));
  let board = Board::from_cells([x, x, None, o, o, None, None, None, None]);
  let game = Match::from_position(contender(&a), contender(&b), board, Mark::X);
  app.games.resume(GROUP, game, None).await.unwrap();
  let host = app.platform.host_of(&Callback::GameCell(2)).unwrap();

  app.handle(press(&a, Some(host), "tictac_2")).await;
  assert!(app.games.state(GROUP).await.is_none());
  let (message, html, keyboard) = app.platform.edits().pop().unwrap();
  assert_eq!(message, host);
  assert!(html.contains("wins"));
  let keyboard = keyboard.unwrap();
  assert!(keyboard.find(NEW_GAME).is_some());
  let top: Vec<_> = keyboard.rows[0].iter().map(|b| b.text.as_str()).collect();
  assert_eq!(top, ["❌", "❌", "❌"]);

  app.handle(press(&b, Some(host), "tictac_5")).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some(GameNotice::GameOver.text()));
}

#[tokio::test]
async fn tictac_opens_one_game_per_chat() {
  let app = app().await;
  let a = user(2, "Ann");
  let b = user(3, "Bob");
  app.handle(post(&a, 10, "/tictac")).await;
  let join = Callback::GameJoin(a.id);
  let host = app.platform.host_of(&join).unwrap();

  app.handle(post(&b, 11, "/tictac")).await;
  assert!(app.platform.sent().pop().unwrap().1.contains("game already running"));

  app.handle(press(&a, Some(host), join.clone())).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some(GameNotice::OwnGame.text()));

  app.handle(press(&b, Some(host), join)).await;
  let Some(GameState::InProgress(game)) = app.games.state(GROUP).await else {
    panic!("second player should start the match");
  };
  let mut ids: Vec<_> = game.players().iter().map(|p| p.id).collect();
  ids.sort();
  assert_eq!(ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn tictac_with_two_handles_pairs_them() {
  let app = app().await;
  let a = user(2, "Ann");
  let b = user(3, "Bob");
  app.handle(post(&b, 9, "hi")).await;
  app.handle(post(&a, 10, "/tictac @ann @bob")).await;

  let Some(GameState::InProgress(game)) = app.games.state(GROUP).await else {
    panic!("match should start");
  };
  let first = &game.players()[0];
  assert_eq!(first.mark, Mark::X);
  assert_eq!(game.players()[1].mark, Mark::O);
  assert_eq!(game.turn_holder().id, first.id);
  let mut ids: Vec<_> = game.players().iter().map(|p| p.id).collect();
  ids.sort();
  assert_eq!(ids, vec![a.id, b.id]);
  let other = game.players().iter().find(|p| p.id != game.turn_holder().id).unwrap().id;
  let host = app.platform.host_of(&Callback::GameCell(0)).unwrap();
  let presser = if other == a.id { &a } else { &b };
  app.handle(press(presser, Some(host), "tictac_0")).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some("not your turn"));
}

#[tokio::test(start_paused = true)]
async fn inactivity_cancels_only_after_a_full_idle_period() {
  let platform = Arc::new(MockPlatform::new(BOT));
  let games = GameCoordinator::new(Arc::clone(&platform), Duration::from_secs(300));
  let a = user(2, "Ann");
  let b = user(3, "Bob");
  games.begin(GROUP, [contender(&a), contender(&b)], None).await.unwrap();
  let host = platform.host_of(&Callback::GameCell(0)).unwrap();

  tokio::time::sleep(Duration::from_secs(299)).await;
  games.play(GROUP, a.id, 0, host).await.unwrap();
  tokio::time::sleep(Duration::from_secs(1)).await;
  assert!(games.is_active(GROUP).await);
  assert!(!games.expire(GROUP).await);

  tokio::time::sleep(Duration::from_secs(298)).await;
  assert!(games.is_active(GROUP).await);
  tokio::time::sleep(Duration::from_secs(2)).await;
  assert!(!games.is_active(GROUP).await);
  let (_, html, keyboard) = platform.edits().pop().unwrap();
  assert!(html.contains("cancelled"));
  assert!(keyboard.unwrap().find(NEW_GAME).is_some());
}

#[tokio::test]
async fn new_game_button_reopens_for_the_starter() {
  let platform = Arc::new(MockPlatform::new(BOT));
  let games = GameCoordinator::new(Arc::clone(&platform), Duration::from_secs(300));
  let a = user(2, "Ann");
  games.rematch(GROUP, contender(&a), contender(&a), MessageId(5)).await.unwrap();
  assert!(matches!(games.state(GROUP).await, Some(GameState::WaitingForSecond { .. })));
  assert_eq!(games.begin(GROUP, [contender(&a), contender(&user(3, "Bob"))], None).await, Err(GameNotice::AlreadyRunning));
}

// ── Ephemeral messages ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn locked_message_reveals_once_to_its_target() {
  let app = app().await;
  let sam = user(2, "Sam");
  let tee = user(3, "Tee");
  let rex = user(4, "Rex");
  app.handle(post(&tee, 1, "hi")).await;
  app.handle(post(&sam, 2, "/lock @tee hello")).await;
  assert!(app.platform.deleted().contains(&MessageId(2)));

  let (carrier, _, keyboard) = app.platform.sent().pop().unwrap();
  let Some(Callback::ShowLock(fingerprint)) = keyboard.unwrap().callbacks().next().cloned() else {
    panic!("carrier should hold a reveal button");
  };
  let reveal = Callback::ShowLock(fingerprint.clone());

  app.handle(press(&rex, Some(carrier), reveal.clone())).await;
  assert_eq!(app.platform.answers().pop(), Some((Some("not for you".to_owned()), true)));
  assert!(app.ephemeral.contains(&fingerprint));

  app.handle(press(&tee, Some(carrier), reveal.clone())).await;
  let (edited, html, keyboard) = app.platform.edits().pop().unwrap();
  assert_eq!(edited, carrier);
  assert!(html.contains("hello"));
  assert_eq!(keyboard, None);
  assert!(!app.ephemeral.contains(&fingerprint));

  tokio::time::sleep(Duration::from_secs(59)).await;
  assert!(!app.platform.deleted().contains(&carrier));
  tokio::time::sleep(Duration::from_secs(2)).await;
  assert!(app.platform.deleted().contains(&carrier));

  app.handle(press(&tee, Some(carrier), reveal)).await;
  assert_eq!(app.platform.last_answer().as_deref(), Some("no longer available"));
}

#[tokio::test]
async fn locked_message_falls_back_to_popup_when_carrier_cannot_be_edited() {
  let app = app().await;
  let sam = user(2, "Sam");
  let tee = user(3, "Tee");
  let mut lock = incoming(&sam, 2, "/lock see you at 8");
  lock.reply_to = Some(tee.clone());
  app.handle(ChatEvent::Posted(lock)).await;
  let (carrier, _, keyboard) = app.platform.sent().pop().unwrap();
  let reveal = keyboard.unwrap().callbacks().next().cloned().unwrap();

  app.platform.deny_edits();
  app.handle(press(&tee, Some(carrier), reveal)).await;

  assert_eq!(app.platform.answers().pop(), Some((Some("see you at 8".to_owned()), true)));
  assert!(!app.platform.deleted().contains(&carrier));
  assert!(app.ephemeral.is_empty());
}

#[tokio::test]
async fn secret_message_is_delivered_as_popup() {
  let app = app().await;
  let sam = user(2, "Sam");
  let tee = user(3, "Tee");
  let mut secret = incoming(&sam, 2, "/secret psst");
  secret.reply_to = Some(tee.clone());
  app.handle(ChatEvent::Posted(secret)).await;

  let (carrier, _, keyboard) = app.platform.sent().pop().unwrap();
  let reveal = keyboard.unwrap().callbacks().next().cloned().unwrap();
  assert!(matches!(reveal, Callback::ShowSecret(_)));
  app.handle(press(&tee, Some(carrier), reveal)).await;

  assert_eq!(app.platform.answers().pop(), Some((Some("psst".to_owned()), true)));
  assert!(app.platform.edits().is_empty());
  assert!(app.ephemeral.is_empty());
}
