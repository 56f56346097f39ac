//! Sent when a user joins a channel.
//!
//! Without the `twitch.tv/membership` capability this is only
//! sent for the logged-in user itself.

use crate::irc::{Command, IrcMessageRef};

/// A user joining a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Join<'src> {
  /// Login of the joined channel.
  pub channel: &'src str,

  /// Login of the user who joined.
  pub user: &'src str,
}

impl<'src> Join<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::Join {
      return None;
    }

    Some(Join {
      channel: message.channel()?,
      user: message.prefix().and_then(|prefix| prefix.nick)?,
    })
  }
}

impl<'src> super::FromIrc<'src> for Join<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<Join<'src>> for super::Message<'src> {
  fn from(msg: Join<'src>) -> Self {
    super::Message::Join(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_join() {
    let msg =
      IrcMessageRef::parse(":randers811!randers811@randers811.tmi.twitch.tv JOIN #pajlada")
        .unwrap();
    let msg = Join::parse(msg).unwrap();

    assert_eq!(msg.channel, "pajlada");
    assert_eq!(msg.user, "randers811");
  }
}
