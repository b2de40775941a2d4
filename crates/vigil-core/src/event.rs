//! Events delivered by the chat platform, in platform-neutral form.

use crate::chat::{ChatRef, MessageId, UserRef};

/// A posted or edited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
  pub chat:       ChatRef,
  pub sender:     UserRef,
  pub message_id: MessageId,
  /// Message text or media caption; empty when neither is present.
  pub text:       String,
  /// Author of the message being replied to.
  pub reply_to:   Option<UserRef>,
  /// Users referenced through text-mention entities.
  pub mentions:   Vec<UserRef>,
}

/// An inline button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
  /// Opaque id used to answer the press.
  pub id:         String,
  pub from:       UserRef,
  /// Chat and message hosting the button, when the host is accessible.
  pub chat:       Option<ChatRef>,
  pub message_id: Option<MessageId>,
  pub data:       String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
  Posted(IncomingMessage),
  Edited(IncomingMessage),
  ButtonPress(ButtonPress),
  MembersJoined { chat: ChatRef, users: Vec<UserRef> },
  MemberLeft { chat: ChatRef, user: UserRef },
}
