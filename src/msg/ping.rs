//! Sent by Twitch periodically to check whether the connection is alive.
//! Must be answered with a `PONG` carrying the same nonce.

use crate::irc::{Command, IrcMessageRef};

/// A liveness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ping<'src> {
  /// Nonce to echo back in the `PONG` reply.
  pub nonce: Option<&'src str>,
}

impl<'src> Ping<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::Ping {
      return None;
    }

    Some(Ping {
      nonce: message.text(),
    })
  }
}

impl<'src> super::FromIrc<'src> for Ping<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<Ping<'src>> for super::Message<'src> {
  fn from(msg: Ping<'src>) -> Self {
    super::Message::Ping(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_ping_with_nonce() {
    let msg = IrcMessageRef::parse("PING :tmi.twitch.tv").unwrap();
    let msg = Ping::parse(msg).unwrap();
    assert_eq!(msg.nonce, Some("tmi.twitch.tv"));
  }

  #[test]
  fn parse_ping_bare() {
    let msg = IrcMessageRef::parse("PING").unwrap();
    let msg = Ping::parse(msg).unwrap();
    assert_eq!(msg.nonce, None);
  }
}
