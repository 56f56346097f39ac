//! ## IRC message parser
//!
//! The entrypoint to this module is [`IrcMessageRef`].
//!
//! ⚠ This parser is _not_ compliant with the IRCv3 spec!
//! It assumes that it will only ever parse messages sent by Twitch,
//! which means it handles Twitch-specific quirks, but it also means
//! that it's unlikely to work for IRC messages sent by other servers.

use smallvec::SmallVec;
use std::fmt::{Debug, Display};

/// Split a single WebSocket text frame into IRC lines.
///
/// Twitch batches multiple messages into one frame, separated by `\r\n`.
/// Lines are yielded in their original order; a final line without the
/// terminating `\r\n` is still yielded, and an empty frame yields nothing.
pub fn frame_lines(frame: &str) -> impl Iterator<Item = &str> {
  frame.split("\r\n").filter(|line| !line.is_empty())
}

type Tags<'src> = SmallVec<[(Tag<'src>, &'src str); 16]>;

/// A base IRC message.
///
/// All parts are slices of the line this message was parsed from.
#[derive(Clone)]
pub struct IrcMessageRef<'src> {
  src: &'src str,
  tags: Tags<'src>,
  prefix: Option<Prefix<'src>>,
  command: Command<'src>,
  channel: Option<&'src str>,
  params: Option<&'src str>,
}

impl<'src> IrcMessageRef<'src> {
  /// Parse a single Twitch IRC line, without the trailing `\r\n`.
  pub fn parse(src: &'src str) -> Option<Self> {
    let mut rest = src;

    let tags = match rest.strip_prefix('@') {
      Some(after) => {
        let (tags, after) = after.split_once(' ')?;
        rest = after;
        parse_tags(tags)
      }
      None => Tags::new(),
    };

    let prefix = match rest.strip_prefix(':') {
      Some(after) => {
        let (prefix, after) = after.split_once(' ')?;
        rest = after;
        Some(parse_prefix(prefix))
      }
      None => None,
    };

    let (command, after) = split_token(rest);
    if command.is_empty() {
      return None;
    }
    let command = Command::parse(command);
    rest = after;

    let channel = match rest.starts_with('#') {
      true => {
        let (channel, after) = split_token(rest);
        rest = after;
        Some(&channel[1..])
      }
      false => None,
    };

    let params = (!rest.is_empty()).then_some(rest);

    Some(Self {
      src,
      tags,
      prefix,
      command,
      channel,
      params,
    })
  }

  /// Get the line this message was parsed from.
  pub fn raw(&self) -> &'src str {
    self.src
  }

  /// Get the message [`Command`].
  pub fn command(&self) -> Command<'src> {
    self.command
  }

  /// Get the message [`Prefix`].
  pub fn prefix(&self) -> Option<Prefix<'src>> {
    self.prefix
  }

  /// Get the login of the channel this message was sent to,
  /// without the `#` prefix.
  pub fn channel(&self) -> Option<&'src str> {
    self.channel
  }

  /// Get the raw message params, everything after the command and channel.
  pub fn params(&self) -> Option<&'src str> {
    self.params
  }

  /// Returns the contents of the params after the `:`.
  pub fn text(&self) -> Option<&'src str> {
    match self.params {
      Some(params) => match params.find(':') {
        Some(start) => Some(&params[start + 1..]),
        None => None,
      },
      None => None,
    }
  }

  /// Retrieve the value of `tag`.
  pub fn tag(&self, tag: Tag<'_>) -> Option<&'src str> {
    self
      .tags
      .iter()
      .find(|(key, _)| key.as_str() == tag.as_str())
      .map(|(_, value)| *value)
  }

  /// Get an iterator over the message [`Tag`]s.
  pub fn tags(&self) -> impl Iterator<Item = (Tag<'src>, &'src str)> + '_ {
    self.tags.iter().copied()
  }
}

impl<'src> Debug for IrcMessageRef<'src> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IrcMessageRef")
      .field("tags", &self.tags)
      .field("prefix", &self.prefix)
      .field("command", &self.command)
      .field("channel", &self.channel)
      .field("params", &self.params)
      .finish()
  }
}

/// `COMMAND <rest>`
fn split_token(s: &str) -> (&str, &str) {
  match s.split_once(' ') {
    Some(v) => v,
    None => (s, &s[s.len()..]),
  }
}

/// `@key=value;key=value <rest>`
///
/// Values may contain `=`, so only the first one separates key from value.
/// A key without `=` maps to the empty value.
fn parse_tags(tags: &str) -> Tags<'_> {
  tags
    .split(';')
    .map(|pair| match pair.split_once('=') {
      Some((key, value)) => (Tag::parse(key), value),
      None => (Tag::parse(pair), &pair[pair.len()..]),
    })
    .collect()
}

/// `:nick!user@host <rest>`, with the `nick!user` and `user` parts optional.
fn parse_prefix(prefix: &str) -> Prefix<'_> {
  match prefix.split_once('!') {
    Some((nick, rest)) => match rest.split_once('@') {
      Some((user, host)) => Prefix {
        nick: Some(nick),
        user: Some(user),
        host,
      },
      None => Prefix {
        nick: Some(nick),
        user: None,
        host: rest,
      },
    },
    None => match prefix.split_once('@') {
      Some((nick, host)) => Prefix {
        nick: Some(nick),
        user: None,
        host,
      },
      None => Prefix {
        nick: None,
        user: None,
        host: prefix,
      },
    },
  }
}

/// Message source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prefix<'src> {
  pub nick: Option<&'src str>,
  pub user: Option<&'src str>,
  pub host: &'src str,
}

/// An IRC command sent by Twitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command<'src> {
  Ping,
  Pong,
  /// Join channel
  Join,
  /// Leave channel
  Part,
  /// Twitch Private Message
  Privmsg,
  /// Send message to a single user
  Whisper,
  /// Purge a user's messages
  ClearChat,
  /// Single message removal
  ClearMsg,
  /// Sent upon successful authentication (PASS/NICK command)
  GlobalUserState,
  /// General notices from the server
  Notice,
  /// Request to rejoin channels after a server restart
  Reconnect,
  /// Identifies the channel's chat settings
  RoomState,
  /// Announces Twitch-specific events to the channel
  UserNotice,
  /// Identifies a user's chat settings or properties
  UserState,
  /// Requesting an IRC capability
  Capability,
  /// `001`, the first numeric sent after a successful login
  Welcome,
  /// Unknown command
  Unknown(&'src str),
}

impl<'src> Command<'src> {
  pub fn parse(token: &'src str) -> Self {
    use Command::*;
    match token {
      "PING" => Ping,
      "PONG" => Pong,
      "JOIN" => Join,
      "PART" => Part,
      "PRIVMSG" => Privmsg,
      "WHISPER" => Whisper,
      "CLEARCHAT" => ClearChat,
      "CLEARMSG" => ClearMsg,
      "GLOBALUSERSTATE" => GlobalUserState,
      "NOTICE" => Notice,
      "RECONNECT" => Reconnect,
      "ROOMSTATE" => RoomState,
      "USERNOTICE" => UserNotice,
      "USERSTATE" => UserState,
      "CAP" => Capability,
      "001" => Welcome,
      other => Unknown(other),
    }
  }

  pub fn as_str(&self) -> &'src str {
    use Command::*;
    match self {
      Ping => "PING",
      Pong => "PONG",
      Join => "JOIN",
      Part => "PART",
      Privmsg => "PRIVMSG",
      Whisper => "WHISPER",
      ClearChat => "CLEARCHAT",
      ClearMsg => "CLEARMSG",
      GlobalUserState => "GLOBALUSERSTATE",
      Notice => "NOTICE",
      Reconnect => "RECONNECT",
      RoomState => "ROOMSTATE",
      UserNotice => "USERNOTICE",
      UserState => "USERSTATE",
      Capability => "CAP",
      Welcome => "001",
      Unknown(cmd) => cmd,
    }
  }
}

impl<'src> Display for Command<'src> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

macro_rules! tags_def {
  ($($key:literal = $name:ident),* $(,)?) => {
    /// An IRCv3 tag key.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Tag<'src> {
      $($name,)*
      Unknown(&'src str),
    }

    impl<'src> Tag<'src> {
      pub fn parse(key: &'src str) -> Self {
        match key {
          $($key => Self::$name,)*
          _ => Self::Unknown(key),
        }
      }

      pub fn as_str(&self) -> &'src str {
        match self {
          $(Self::$name => $key,)*
          Self::Unknown(key) => key,
        }
      }
    }
  };
}

tags_def! {
  "msg-id" = MsgId,
  "badges" = Badges,
  "badge-info" = BadgeInfo,
  "display-name" = DisplayName,
  "emote-only" = EmoteOnly,
  "emotes" = Emotes,
  "id" = Id,
  "login" = Login,
  "mod" = Mod,
  "room-id" = RoomId,
  "subscriber" = Subscriber,
  "tmi-sent-ts" = TmiSentTs,
  "turbo" = Turbo,
  "user-id" = UserId,
  "user-type" = UserType,
  "client-nonce" = ClientNonce,
  "first-msg" = FirstMsg,
  "returning-chatter" = ReturningChatter,
  "reply-parent-msg-id" = ReplyParentMsgId,
  "reply-parent-user-id" = ReplyParentUserId,
  "reply-parent-user-login" = ReplyParentUserLogin,
  "reply-parent-display-name" = ReplyParentDisplayName,
  "reply-parent-msg-body" = ReplyParentMsgBody,
  "followers-only" = FollowersOnly,
  "r9k" = R9K,
  "rituals" = Rituals,
  "slow" = Slow,
  "subs-only" = SubsOnly,
  "system-msg" = SystemMsg,
  "emote-sets" = EmoteSets,
  "thread-id" = ThreadId,
  "message-id" = MessageId,
  "color" = Color,
  "vip" = Vip,
  "bits" = Bits,
  "target-user-id" = TargetUserId,
  "target-msg-id" = TargetMsgId,
  "ban-duration" = BanDuration,
  "msg-param-cumulative-months" = MsgParamCumulativeMonths,
  "msg-param-months" = MsgParamMonths,
  "msg-param-streak-months" = MsgParamStreakMonths,
  "msg-param-should-share-streak" = MsgParamShouldShareStreak,
  "msg-param-sub-plan" = MsgParamSubPlan,
  "msg-param-sub-plan-name" = MsgParamSubPlanName,
  "msg-param-recipient-display-name" = MsgParamRecipientDisplayName,
  "msg-param-recipient-id" = MsgParamRecipientId,
  "msg-param-recipient-user-name" = MsgParamRecipientUserName,
  "msg-param-gift-months" = MsgParamGiftMonths,
  "msg-param-mass-gift-count" = MsgParamMassGiftCount,
  "msg-param-sender-count" = MsgParamSenderCount,
  "msg-param-sender-login" = MsgParamSenderLogin,
  "msg-param-sender-name" = MsgParamSenderName,
  "msg-param-login" = MsgParamLogin,
  "msg-param-displayName" = MsgParamDisplayName,
  "msg-param-viewerCount" = MsgParamViewerCount,
  "msg-param-profileImageURL" = MsgParamProfileImageUrl,
  "msg-param-color" = MsgParamColor,
  "msg-param-promo-name" = MsgParamPromoName,
  "msg-param-promo-gift-total" = MsgParamPromoGiftTotal,
}

impl<'src> Display for Tag<'src> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

static_assert_send!(IrcMessageRef<'_>);
static_assert_sync!(IrcMessageRef<'_>);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_frame_into_lines() {
    let frame = "PING :tmi.twitch.tv\r\n:tmi.twitch.tv RECONNECT\r\n";
    let lines = frame_lines(frame).collect::<Vec<_>>();
    assert_eq!(lines, ["PING :tmi.twitch.tv", ":tmi.twitch.tv RECONNECT"]);
  }

  #[test]
  fn split_empty_frame() {
    assert_eq!(frame_lines("").count(), 0);
    assert_eq!(frame_lines("\r\n").count(), 0);
  }

  #[test]
  fn split_frame_without_trailing_crlf() {
    let lines = frame_lines("PING :tmi.twitch.tv").collect::<Vec<_>>();
    assert_eq!(lines, ["PING :tmi.twitch.tv"]);
  }

  #[test]
  fn parse_bare_command() {
    let msg = IrcMessageRef::parse("PING :tmi.twitch.tv").unwrap();
    assert_eq!(msg.command(), Command::Ping);
    assert_eq!(msg.text(), Some("tmi.twitch.tv"));
    assert!(msg.prefix().is_none());
    assert!(msg.channel().is_none());
  }

  #[test]
  fn parse_welcome() {
    let msg = IrcMessageRef::parse(":tmi.twitch.tv 001 alice :Welcome, GLHF!").unwrap();
    assert_eq!(msg.command(), Command::Welcome);
    assert_eq!(
      msg.prefix(),
      Some(Prefix {
        nick: None,
        user: None,
        host: "tmi.twitch.tv"
      })
    );
    assert_eq!(msg.params(), Some("alice :Welcome, GLHF!"));
  }

  #[test]
  fn parse_privmsg() {
    let msg = IrcMessageRef::parse(
      "@badges=;color=#FF0000;display-name=Alice;id=abc-123;mod=0;room-id=11148817;tmi-sent-ts=1594545155039;user-id=444 :alice!alice@alice.tmi.twitch.tv PRIVMSG #pajlada :hello world",
    )
    .unwrap();
    assert_eq!(msg.command(), Command::Privmsg);
    assert_eq!(msg.channel(), Some("pajlada"));
    assert_eq!(msg.text(), Some("hello world"));
    assert_eq!(msg.tag(Tag::DisplayName), Some("Alice"));
    assert_eq!(msg.tag(Tag::Id), Some("abc-123"));
    assert_eq!(msg.tag(Tag::Mod), Some("0"));
    assert_eq!(
      msg.prefix(),
      Some(Prefix {
        nick: Some("alice"),
        user: Some("alice"),
        host: "alice.tmi.twitch.tv"
      })
    );
  }

  #[test]
  fn parse_tag_value_containing_equals() {
    let msg = IrcMessageRef::parse(
      "@reply-parent-msg-body=https://youtu.be/x?list=abc;id=1 :a!a@a.tmi.twitch.tv PRIVMSG #c :hi",
    )
    .unwrap();
    assert_eq!(
      msg.tag(Tag::ReplyParentMsgBody),
      Some("https://youtu.be/x?list=abc")
    );
  }

  #[test]
  fn parse_empty_tag_value() {
    let msg =
      IrcMessageRef::parse("@badges=;vip :a!a@a.tmi.twitch.tv PRIVMSG #c :hi").unwrap();
    assert_eq!(msg.tag(Tag::Badges), Some(""));
    assert_eq!(msg.tag(Tag::Vip), Some(""));
  }

  #[test]
  fn parse_unknown_command() {
    let msg = IrcMessageRef::parse(":tmi.twitch.tv 372 alice :motd").unwrap();
    assert_eq!(msg.command(), Command::Unknown("372"));
  }

  #[test]
  fn parse_whisper_has_no_channel() {
    let msg =
      IrcMessageRef::parse(":alice!alice@alice.tmi.twitch.tv WHISPER bob :psst").unwrap();
    assert_eq!(msg.command(), Command::Whisper);
    assert!(msg.channel().is_none());
    assert_eq!(msg.params(), Some("bob :psst"));
    assert_eq!(msg.text(), Some("psst"));
  }

  #[test]
  fn parse_empty_line() {
    assert!(IrcMessageRef::parse("").is_none());
  }

  #[test]
  fn dispatches_every_line_in_order() {
    let frame = "PING :a\r\nPING :b\r\nPING :c\r\n";
    let texts = frame_lines(frame)
      .map(|line| IrcMessageRef::parse(line).unwrap().text().unwrap().to_owned())
      .collect::<Vec<_>>();
    assert_eq!(texts, ["a", "b", "c"]);
  }
}
