//! Sent when the settings of a channel change, and once in full
//! right after joining a channel.

use super::parse_bool;
use crate::irc::{Command, IrcMessageRef, Tag};
use chrono::Duration;

/// An update to the settings of some channel.
///
/// Twitch sends two shapes of this message: a _full_ one directly after a
/// successful `JOIN`, carrying every field, and a partial one whenever a
/// single setting changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomState<'src> {
  /// Login of the channel this state was applied to.
  pub channel: &'src str,

  /// ID of the channel this state was applied to.
  pub channel_id: &'src str,

  /// Whether the room is in emote-only mode.
  ///
  /// [`None`] means no change.
  pub emote_only: Option<bool>,

  /// Whether the room is in followers-only mode.
  ///
  /// [`None`] means no change.
  pub followers_only: Option<FollowersOnly>,

  /// Whether the room is in unique-message (r9k) mode.
  ///
  /// [`None`] means no change.
  pub unique_mode: Option<bool>,

  /// Minimum time between messages per user.
  ///
  /// [`None`] means no change, a zero duration means slow mode is off.
  pub slow: Option<Duration>,

  /// Whether the room is in subscriber-only mode.
  ///
  /// [`None`] means no change.
  pub subs_only: Option<bool>,
}

/// Followers-only mode configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowersOnly {
  /// Followers-only mode is disabled.
  Disabled,

  /// Followers-only mode is enabled, with an optional minimum follow age.
  Enabled(Option<Duration>),
}

impl<'src> RoomState<'src> {
  /// Whether this is the full room state sent after a successful `JOIN`.
  pub fn is_full(&self) -> bool {
    self.emote_only.is_some()
      && self.followers_only.is_some()
      && self.unique_mode.is_some()
      && self.slow.is_some()
      && self.subs_only.is_some()
  }

  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::RoomState {
      return None;
    }

    Some(RoomState {
      channel: message.channel()?,
      channel_id: message.tag(Tag::RoomId)?,
      emote_only: message.tag(Tag::EmoteOnly).map(parse_bool),
      followers_only: message
        .tag(Tag::FollowersOnly)
        .and_then(|v| v.parse().ok())
        .map(|n: i64| match n {
          n if n > 0 => FollowersOnly::Enabled(Some(Duration::minutes(n))),
          0 => FollowersOnly::Enabled(None),
          _ => FollowersOnly::Disabled,
        }),
      unique_mode: message.tag(Tag::R9K).map(parse_bool),
      slow: message
        .tag(Tag::Slow)
        .and_then(|v| v.parse().ok())
        .map(Duration::seconds),
      subs_only: message.tag(Tag::SubsOnly).map(parse_bool),
    })
  }
}

impl<'src> super::FromIrc<'src> for RoomState<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<RoomState<'src>> for super::Message<'src> {
  fn from(msg: RoomState<'src>) -> Self {
    super::Message::RoomState(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_room_state_full() {
    let msg = IrcMessageRef::parse(
      "@emote-only=0;followers-only=-1;r9k=0;rituals=0;room-id=40286300;slow=0;subs-only=0 :tmi.twitch.tv ROOMSTATE #randers",
    )
    .unwrap();
    let msg = RoomState::parse(msg).unwrap();

    assert!(msg.is_full());
    assert_eq!(msg.channel, "randers");
    assert_eq!(msg.channel_id, "40286300");
    assert_eq!(msg.emote_only, Some(false));
    assert_eq!(msg.followers_only, Some(FollowersOnly::Disabled));
    assert_eq!(msg.unique_mode, Some(false));
    assert_eq!(msg.slow, Some(Duration::zero()));
    assert_eq!(msg.subs_only, Some(false));
  }

  #[test]
  fn parse_room_state_followers_min_age() {
    let msg = IrcMessageRef::parse(
      "@emote-only=1;followers-only=10;r9k=1;rituals=0;room-id=40286300;slow=5;subs-only=1 :tmi.twitch.tv ROOMSTATE #randers",
    )
    .unwrap();
    let msg = RoomState::parse(msg).unwrap();

    assert!(msg.is_full());
    assert_eq!(
      msg.followers_only,
      Some(FollowersOnly::Enabled(Some(Duration::minutes(10))))
    );
    assert_eq!(msg.slow, Some(Duration::seconds(5)));
  }

  #[test]
  fn parse_room_state_partial() {
    let msg =
      IrcMessageRef::parse("@room-id=40286300;slow=5 :tmi.twitch.tv ROOMSTATE #randers").unwrap();
    let msg = RoomState::parse(msg).unwrap();

    assert!(!msg.is_full());
    assert_eq!(msg.slow, Some(Duration::seconds(5)));
    assert_eq!(msg.emote_only, None);
    assert_eq!(msg.followers_only, None);
    assert_eq!(msg.unique_mode, None);
    assert_eq!(msg.subs_only, None);
  }

  #[test]
  fn parse_room_state_followers_all() {
    let msg = IrcMessageRef::parse(
      "@followers-only=0;room-id=40286300 :tmi.twitch.tv ROOMSTATE #randers",
    )
    .unwrap();
    let msg = RoomState::parse(msg).unwrap();

    assert_eq!(msg.followers_only, Some(FollowersOnly::Enabled(None)));
  }
}
