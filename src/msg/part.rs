//! Sent when a user leaves a channel.
//!
//! Without the `twitch.tv/membership` capability this is only
//! sent for the logged-in user itself.

use crate::irc::{Command, IrcMessageRef};

/// A user leaving a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Part<'src> {
  /// Login of the parted channel.
  pub channel: &'src str,

  /// Login of the user who left.
  pub user: &'src str,
}

impl<'src> Part<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::Part {
      return None;
    }

    Some(Part {
      channel: message.channel()?,
      user: message.prefix().and_then(|prefix| prefix.nick)?,
    })
  }
}

impl<'src> super::FromIrc<'src> for Part<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<Part<'src>> for super::Message<'src> {
  fn from(msg: Part<'src>) -> Self {
    super::Message::Part(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_part() {
    let msg =
      IrcMessageRef::parse(":randers811!randers811@randers811.tmi.twitch.tv PART #pajlada")
        .unwrap();
    let msg = Part::parse(msg).unwrap();

    assert_eq!(msg.channel, "pajlada");
    assert_eq!(msg.user, "randers811");
  }
}
