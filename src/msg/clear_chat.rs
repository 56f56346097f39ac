//! Sent when chat is cleared, or when a single user is banned or timed out.

use super::{parse_duration_secs, parse_timestamp};
use crate::irc::{Command, IrcMessageRef, Tag};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A moderation action against the chat of a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClearChat<'src> {
  /// Login of the affected channel.
  pub channel: &'src str,

  /// ID of the affected channel.
  pub channel_id: &'src str,

  /// The specific kind of action this command represents.
  pub action: ClearChatAction<'src>,

  /// Time at which the action was executed on Twitch servers.
  pub timestamp: DateTime<Utc>,
}

/// The way in which the chat was cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClearChatAction<'src> {
  /// The entire chat was cleared.
  Clear,

  /// A single user was banned, clearing only their messages.
  Ban {
    /// Login of the banned user.
    user: &'src str,

    /// ID of the banned user.
    user_id: &'src str,
  },

  /// A single user was timed out, clearing only their messages.
  Timeout {
    /// Login of the timed out user.
    user: &'src str,

    /// ID of the timed out user.
    user_id: &'src str,

    /// Duration of the timeout.
    duration: Duration,
  },
}

impl<'src> ClearChat<'src> {
  /// The user which was banned or timed out, if any.
  pub fn target(&self) -> Option<&'src str> {
    match &self.action {
      ClearChatAction::Clear => None,
      ClearChatAction::Ban { user, .. } | ClearChatAction::Timeout { user, .. } => Some(user),
    }
  }

  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::ClearChat {
      return None;
    }

    let action = match (
      message.text(),
      message.tag(Tag::BanDuration).and_then(parse_duration_secs),
    ) {
      (Some(user), Some(duration)) => ClearChatAction::Timeout {
        user,
        user_id: message.tag(Tag::TargetUserId)?,
        duration,
      },
      (Some(user), None) => ClearChatAction::Ban {
        user,
        user_id: message.tag(Tag::TargetUserId)?,
      },
      (None, _) => ClearChatAction::Clear,
    };

    Some(ClearChat {
      channel: message.channel()?,
      channel_id: message.tag(Tag::RoomId)?,
      action,
      timestamp: parse_timestamp(message.tag(Tag::TmiSentTs)?)?,
    })
  }
}

impl<'src> super::FromIrc<'src> for ClearChat<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<ClearChat<'src>> for super::Message<'src> {
  fn from(msg: ClearChat<'src>) -> Self {
    super::Message::ClearChat(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_clearchat_timeout() {
    let msg = IrcMessageRef::parse(
      "@ban-duration=600;room-id=11148817;target-user-id=148973258;tmi-sent-ts=1594553828245 :tmi.twitch.tv CLEARCHAT #pajlada :fabzeef",
    )
    .unwrap();
    let msg = ClearChat::parse(msg).unwrap();

    assert_eq!(msg.channel, "pajlada");
    assert_eq!(msg.target(), Some("fabzeef"));
    assert_eq!(
      msg.action,
      ClearChatAction::Timeout {
        user: "fabzeef",
        user_id: "148973258",
        duration: Duration::from_secs(600),
      }
    );
  }

  #[test]
  fn parse_clearchat_ban() {
    let msg = IrcMessageRef::parse(
      "@room-id=11148817;target-user-id=70948394;tmi-sent-ts=1594561360331 :tmi.twitch.tv CLEARCHAT #pajlada :weeb123",
    )
    .unwrap();
    let msg = ClearChat::parse(msg).unwrap();

    assert_eq!(
      msg.action,
      ClearChatAction::Ban {
        user: "weeb123",
        user_id: "70948394",
      }
    );
  }

  #[test]
  fn parse_clearchat_clear() {
    let msg = IrcMessageRef::parse(
      "@room-id=40286300;tmi-sent-ts=1594561392337 :tmi.twitch.tv CLEARCHAT #randers",
    )
    .unwrap();
    let msg = ClearChat::parse(msg).unwrap();

    assert_eq!(msg.action, ClearChatAction::Clear);
    assert_eq!(msg.target(), None);
  }
}
