//! Sent upon joining a channel, and after successfully sending a `PRIVMSG`
//! to a channel. Carries the state of the logged-in user in that channel.

use super::{is_not_empty, parse_badges, parse_bool, Badges};
use crate::irc::{Command, IrcMessageRef, Tag};
use smallvec::SmallVec;

/// State of the logged-in user in some channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserState<'src> {
  /// Login of the channel this state applies to.
  pub channel: &'src str,

  /// Display name of the logged-in user.
  pub user_name: &'src str,

  /// Whether the logged-in user is a moderator in the channel.
  pub is_moderator: bool,

  /// Channel badges enabled by the logged-in user.
  pub badges: Badges<'src>,

  /// Emote sets available to the logged-in user.
  pub emote_sets: SmallVec<[&'src str; 2]>,

  /// The logged-in user's selected name color, if any.
  pub color: Option<&'src str>,
}

impl<'src> UserState<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::UserState {
      return None;
    }

    Some(UserState {
      channel: message.channel()?,
      user_name: message.tag(Tag::DisplayName)?,
      is_moderator: message.tag(Tag::Mod).map(parse_bool).unwrap_or(false),
      badges: message
        .tag(Tag::Badges)
        .map(parse_badges)
        .unwrap_or_default(),
      emote_sets: message
        .tag(Tag::EmoteSets)
        .map(|sets| sets.split(',').filter(|set| !set.is_empty()).collect())
        .unwrap_or_default(),
      color: message.tag(Tag::Color).filter(is_not_empty),
    })
  }
}

impl<'src> super::FromIrc<'src> for UserState<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<UserState<'src>> for super::Message<'src> {
  fn from(msg: UserState<'src>) -> Self {
    super::Message::UserState(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_userstate_plain() {
    let msg = IrcMessageRef::parse(
      "@badge-info=;badges=;color=#FF0000;display-name=TESTUSER;emote-sets=0;mod=0;subscriber=0;user-type= :tmi.twitch.tv USERSTATE #randers",
    )
    .unwrap();
    let msg = UserState::parse(msg).unwrap();

    assert_eq!(msg.channel, "randers");
    assert_eq!(msg.user_name, "TESTUSER");
    assert!(!msg.is_moderator);
    assert_eq!(msg.emote_sets.as_slice(), ["0"]);
    assert_eq!(msg.color, Some("#FF0000"));
  }

  #[test]
  fn parse_userstate_moderator() {
    let msg = IrcMessageRef::parse(
      "@badge-info=;badges=moderator/1;color=;display-name=TESTUSER;emote-sets=0,75c09c7b-332a-43ec-8be8-1d4571706155;mod=1;subscriber=0;user-type=mod :tmi.twitch.tv USERSTATE #randers",
    )
    .unwrap();
    let msg = UserState::parse(msg).unwrap();

    assert!(msg.is_moderator);
    assert_eq!(
      msg.emote_sets.as_slice(),
      ["0", "75c09c7b-332a-43ec-8be8-1d4571706155"]
    );
    assert_eq!(msg.color, None);
  }
}
