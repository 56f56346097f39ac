//! Sent by Twitch as a response to some command, or in place of some event.

use super::is_not_empty;
use crate::irc::{Command, IrcMessageRef, Tag};

/// A server notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice<'src> {
  /// Login of the channel the notice applies to.
  ///
  /// [`None`] for notices sent before a successful login,
  /// such as `Login authentication failed`.
  pub channel: Option<&'src str>,

  /// Notice ID, e.g. `msg_banned`.
  ///
  /// Only present for notices sent after a successful login.
  pub msg_id: Option<&'src str>,

  /// The notice text.
  pub text: &'src str,
}

impl<'src> Notice<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::Notice {
      return None;
    }

    Some(Notice {
      channel: message.channel(),
      msg_id: message.tag(Tag::MsgId).filter(is_not_empty),
      text: message.text()?,
    })
  }
}

impl<'src> super::FromIrc<'src> for Notice<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<Notice<'src>> for super::Message<'src> {
  fn from(msg: Notice<'src>) -> Self {
    super::Message::Notice(msg)
  }
}
