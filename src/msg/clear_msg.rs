//! Sent when a single message is deleted.

use super::{parse_message_text, parse_timestamp};
use crate::irc::{Command, IrcMessageRef, Tag};
use chrono::{DateTime, Utc};

/// A single deleted message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClearMsg<'src> {
  /// Login of the channel the message was deleted in.
  pub channel: &'src str,

  /// Login of the user who sent the deleted message.
  pub sender: &'src str,

  /// Unique ID of the deleted message.
  pub message_id: &'src str,

  /// Text of the deleted message.
  pub text: &'src str,

  /// Whether the deleted message was sent with `/me`.
  pub is_action: bool,

  /// Time at which the deletion was executed on Twitch servers.
  pub timestamp: DateTime<Utc>,
}

impl<'src> ClearMsg<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::ClearMsg {
      return None;
    }

    let (text, is_action) = parse_message_text(message.text()?);
    Some(ClearMsg {
      channel: message.channel()?,
      sender: message.tag(Tag::Login)?,
      message_id: message.tag(Tag::TargetMsgId)?,
      text,
      is_action,
      timestamp: parse_timestamp(message.tag(Tag::TmiSentTs)?)?,
    })
  }
}

impl<'src> super::FromIrc<'src> for ClearMsg<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<ClearMsg<'src>> for super::Message<'src> {
  fn from(msg: ClearMsg<'src>) -> Self {
    super::Message::ClearMsg(msg)
  }
}
