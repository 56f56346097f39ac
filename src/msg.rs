//! Typed messages sent by Twitch.
//!
//! Every inbound [`Command`][crate::irc::Command] which carries information
//! has a matching decoder here. Decoders borrow from the underlying line,
//! and turn raw IRCv3 tags into fields with the right shapes.

use crate::irc::{IrcMessageRef, Tag};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;

pub mod clear_chat;
pub use clear_chat::*;
pub mod clear_msg;
pub use clear_msg::*;
pub mod global_user_state;
pub use global_user_state::*;
pub mod join;
pub use join::*;
pub mod notice;
pub use notice::*;
pub mod part;
pub use part::*;
pub mod ping;
pub use ping::*;
pub mod privmsg;
pub use privmsg::*;
pub mod room_state;
pub use room_state::*;
pub mod user_notice;
pub use user_notice::*;
pub mod user_state;
pub use user_state::*;
pub mod whisper;
pub use whisper::*;

/// Decode an [`IrcMessageRef`] into a typed message.
pub trait FromIrc<'src>: Sized {
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self>;
}

impl<'src> IrcMessageRef<'src> {
  /// Decode this message into `T`.
  pub fn cast<T: FromIrc<'src>>(&self) -> Option<T> {
    T::from_irc(self.clone())
  }
}

/// Any typed message.
#[derive(Clone, Debug)]
pub enum Message<'src> {
  ClearChat(ClearChat<'src>),
  ClearMsg(ClearMsg<'src>),
  GlobalUserState(GlobalUserState<'src>),
  Join(Join<'src>),
  Notice(Notice<'src>),
  Part(Part<'src>),
  Ping(Ping<'src>),
  Privmsg(Privmsg<'src>),
  Reconnect,
  RoomState(RoomState<'src>),
  UserNotice(UserNotice<'src>),
  UserState(UserState<'src>),
  Whisper(Whisper<'src>),
}

impl<'src> FromIrc<'src> for Message<'src> {
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    use crate::irc::Command as C;
    let message = match message.command() {
      C::ClearChat => ClearChat::from_irc(message)?.into(),
      C::ClearMsg => ClearMsg::from_irc(message)?.into(),
      C::GlobalUserState => GlobalUserState::from_irc(message)?.into(),
      C::Join => Join::from_irc(message)?.into(),
      C::Notice => Notice::from_irc(message)?.into(),
      C::Part => Part::from_irc(message)?.into(),
      C::Ping => Ping::from_irc(message)?.into(),
      C::Privmsg => Privmsg::from_irc(message)?.into(),
      C::Reconnect => Self::Reconnect,
      C::RoomState => RoomState::from_irc(message)?.into(),
      C::UserNotice => UserNotice::from_irc(message)?.into(),
      C::UserState => UserState::from_irc(message)?.into(),
      C::Whisper => Whisper::from_irc(message)?.into(),
      _ => return None,
    };
    Some(message)
  }
}

/// A user taking part in chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct User<'src> {
  /// ID of the user.
  pub id: &'src str,

  /// Login of the user. Always lowercase ASCII.
  pub login: &'src str,

  /// Display name, as it appears in chat.
  /// May contain arbitrary unicode characters.
  pub name: &'src str,
}

/// A chat badge, e.g. `subscriber/12`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Badge<'src> {
  /// Name of the badge, e.g. `subscriber`.
  pub name: &'src str,

  /// Version of the badge, e.g. the subscribed months for `subscriber`.
  pub version: &'src str,
}

/// The badge list attached to a message.
pub type Badges<'src> = SmallVec<[Badge<'src>; 2]>;

pub(crate) fn parse_badges(badges: &str) -> Badges<'_> {
  if badges.is_empty() {
    return Badges::new();
  }

  badges
    .split(',')
    .flat_map(|badge| badge.split_once('/'))
    .map(|(name, version)| Badge { name, version })
    .collect()
}

pub(crate) fn parse_bool(v: &str) -> bool {
  v.parse::<u8>().map(|n| n > 0).unwrap_or(false)
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  use chrono::TimeZone;
  chrono::Utc.timestamp_millis_opt(s.parse().ok()?).single()
}

pub(crate) fn parse_duration_secs(s: &str) -> Option<std::time::Duration> {
  Some(std::time::Duration::from_secs(s.parse().ok()?))
}

/// Strip the `\u{1}ACTION <text>\u{1}` wrapper from a `/me` message.
pub(crate) fn parse_message_text(s: &str) -> (&str, bool) {
  let Some(s) = s.strip_prefix("\u{0001}ACTION ") else {
    return (s, false);
  };
  let Some(s) = s.strip_suffix('\u{0001}') else {
    return (s, false);
  };
  (s, true)
}

pub(crate) fn is_not_empty(s: &&str) -> bool {
  !s.is_empty()
}

pub(crate) fn parse_sender<'src>(message: &IrcMessageRef<'src>) -> Option<User<'src>> {
  let login = message.prefix().and_then(|prefix| prefix.nick)?;
  Some(User {
    id: message.tag(Tag::UserId)?,
    login,
    name: message
      .tag(Tag::DisplayName)
      .filter(is_not_empty)
      .unwrap_or(login),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_badge_list() {
    let badges = parse_badges("broadcaster/1,subscriber/12");
    assert_eq!(
      badges.as_slice(),
      [
        Badge {
          name: "broadcaster",
          version: "1"
        },
        Badge {
          name: "subscriber",
          version: "12"
        }
      ]
    );
    assert!(parse_badges("").is_empty());
  }

  #[test]
  fn parse_action_wrapper() {
    assert_eq!(
      parse_message_text("\u{1}ACTION waves\u{1}"),
      ("waves", true)
    );
    assert_eq!(parse_message_text("just text"), ("just text", false));
    assert_eq!(
      parse_message_text("\u{1}ACTION unterminated"),
      ("\u{1}ACTION unterminated", false)
    );
  }

  #[test]
  fn parse_numeric_bool() {
    assert!(parse_bool("1"));
    assert!(!parse_bool("0"));
    assert!(!parse_bool(""));
    assert!(!parse_bool("true"));
  }
}
