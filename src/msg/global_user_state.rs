//! Sent once upon a successful login. Carries the global state of the
//! logged-in user.

use super::{is_not_empty, parse_badges, Badges};
use crate::irc::{Command, IrcMessageRef, Tag};
use smallvec::SmallVec;

/// Global state of the logged-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalUserState<'src> {
  /// ID of the logged-in user.
  pub user_id: &'src str,

  /// Display name of the logged-in user.
  pub user_name: &'src str,

  /// Global badges enabled by the logged-in user.
  pub badges: Badges<'src>,

  /// Emote sets available to the logged-in user.
  pub emote_sets: SmallVec<[&'src str; 2]>,

  /// The logged-in user's selected name color, if any.
  pub color: Option<&'src str>,
}

impl<'src> GlobalUserState<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::GlobalUserState {
      return None;
    }

    Some(GlobalUserState {
      user_id: message.tag(Tag::UserId)?,
      user_name: message.tag(Tag::DisplayName)?,
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

impl<'src> super::FromIrc<'src> for GlobalUserState<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<GlobalUserState<'src>> for super::Message<'src> {
  fn from(msg: GlobalUserState<'src>) -> Self {
    super::Message::GlobalUserState(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_globaluserstate() {
    let msg = IrcMessageRef::parse(
      "@badge-info=;badges=;color=#1E90FF;display-name=randers;emote-sets=0,42,237;user-id=40286300;user-type= :tmi.twitch.tv GLOBALUSERSTATE",
    )
    .unwrap();
    let msg = GlobalUserState::parse(msg).unwrap();

    assert_eq!(msg.user_id, "40286300");
    assert_eq!(msg.user_name, "randers");
    assert_eq!(msg.emote_sets.as_slice(), ["0", "42", "237"]);
    assert_eq!(msg.color, Some("#1E90FF"));
  }
}
