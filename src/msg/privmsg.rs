//! Sent when a user sends a chat message to a channel.

use super::{
  is_not_empty, parse_badges, parse_bool, parse_message_text, parse_sender, parse_timestamp,
  Badges, User,
};
use crate::irc::{Command, IrcMessageRef, Tag};
use chrono::{DateTime, Utc};

/// A chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Privmsg<'src> {
  /// Login of the channel the message was sent to.
  pub channel: &'src str,

  /// ID of the channel the message was sent to.
  pub channel_id: &'src str,

  /// Unique ID of the message.
  pub message_id: &'src str,

  /// The user who sent the message.
  pub sender: User<'src>,

  /// Message text, with the `/me` wrapper removed.
  pub text: &'src str,

  /// Whether the message was sent with `/me`.
  pub is_action: bool,

  /// Channel badges enabled by the sender.
  pub badges: Badges<'src>,

  /// The sender's selected name color, if any.
  pub color: Option<&'src str>,

  /// Whether the sender is a moderator in the channel.
  pub is_moderator: bool,

  /// Number of bits attached to the message.
  pub bits: Option<u64>,

  /// Nonce attached by the sending client.
  pub nonce: Option<&'src str>,

  /// ID of the message this one is a reply to.
  pub reply_parent_id: Option<&'src str>,

  /// The time at which the message was sent.
  pub timestamp: DateTime<Utc>,
}

impl<'src> Privmsg<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::Privmsg {
      return None;
    }

    let (text, is_action) = parse_message_text(message.text()?);
    Some(Privmsg {
      channel: message.channel()?,
      channel_id: message.tag(Tag::RoomId)?,
      message_id: message.tag(Tag::Id)?,
      sender: parse_sender(&message)?,
      text,
      is_action,
      badges: message
        .tag(Tag::Badges)
        .map(parse_badges)
        .unwrap_or_default(),
      color: message.tag(Tag::Color).filter(is_not_empty),
      is_moderator: message.tag(Tag::Mod).map(parse_bool).unwrap_or(false),
      bits: message.tag(Tag::Bits).and_then(|v| v.parse().ok()),
      nonce: message.tag(Tag::ClientNonce).filter(is_not_empty),
      reply_parent_id: message.tag(Tag::ReplyParentMsgId).filter(is_not_empty),
      timestamp: parse_timestamp(message.tag(Tag::TmiSentTs)?)?,
    })
  }
}

impl<'src> super::FromIrc<'src> for Privmsg<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<Privmsg<'src>> for super::Message<'src> {
  fn from(msg: Privmsg<'src>) -> Self {
    super::Message::Privmsg(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::msg::Badge;

  #[test]
  fn parse_privmsg_basic() {
    let msg = IrcMessageRef::parse(
      "@badge-info=;badges=;color=#0000FF;display-name=JuN1oRRRR;emotes=;flags=;id=e9d998c3-36f1-430f-89ec-6b887c28af36;mod=0;room-id=11148817;subscriber=0;tmi-sent-ts=1594545155039;turbo=0;user-id=29803735;user-type= :jun1orrrr!jun1orrrr@jun1orrrr.tmi.twitch.tv PRIVMSG #pajlada :dank cam",
    )
    .unwrap();
    let msg = Privmsg::parse(msg).unwrap();

    assert_eq!(msg.channel, "pajlada");
    assert_eq!(msg.channel_id, "11148817");
    assert_eq!(msg.message_id, "e9d998c3-36f1-430f-89ec-6b887c28af36");
    assert_eq!(
      msg.sender,
      User {
        id: "29803735",
        login: "jun1orrrr",
        name: "JuN1oRRRR"
      }
    );
    assert_eq!(msg.text, "dank cam");
    assert!(!msg.is_action);
    assert!(!msg.is_moderator);
    assert_eq!(msg.color, Some("#0000FF"));
    assert!(msg.badges.is_empty());
    assert_eq!(msg.bits, None);
    assert_eq!(msg.nonce, None);
    assert_eq!(msg.reply_parent_id, None);
  }

  #[test]
  fn parse_privmsg_action() {
    let msg = IrcMessageRef::parse(
      "@badges=moderator/1;color=;display-name=Mod;id=1;mod=1;room-id=2;tmi-sent-ts=1594545155039;user-id=3 :mod!mod@mod.tmi.twitch.tv PRIVMSG #pajlada :\u{1}ACTION does a thing\u{1}",
    )
    .unwrap();
    let msg = Privmsg::parse(msg).unwrap();

    assert_eq!(msg.text, "does a thing");
    assert!(msg.is_action);
    assert!(msg.is_moderator);
    assert_eq!(
      msg.badges.as_slice(),
      [Badge {
        name: "moderator",
        version: "1"
      }]
    );
    assert_eq!(msg.color, None);
  }

  #[test]
  fn parse_privmsg_reply_and_bits() {
    let msg = IrcMessageRef::parse(
      "@badges=;bits=100;client-nonce=abc;display-name=A;id=1;mod=0;reply-parent-msg-id=parent-id;room-id=2;tmi-sent-ts=1594545155039;user-id=3 :a!a@a.tmi.twitch.tv PRIVMSG #c :cheer100 hi",
    )
    .unwrap();
    let msg = Privmsg::parse(msg).unwrap();

    assert_eq!(msg.bits, Some(100));
    assert_eq!(msg.nonce, Some("abc"));
    assert_eq!(msg.reply_parent_id, Some("parent-id"));
  }

  #[test]
  fn reject_wrong_command() {
    let msg = IrcMessageRef::parse("PING :tmi.twitch.tv").unwrap();
    assert!(Privmsg::parse(msg).is_none());
  }
}
