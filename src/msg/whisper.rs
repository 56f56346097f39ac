//! Sent when a user sends a direct message to the logged-in user.

use super::{parse_message_text, parse_sender, User};
use crate::irc::{Command, IrcMessageRef};

/// A direct message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Whisper<'src> {
  /// The user who sent the whisper.
  pub sender: User<'src>,

  /// Login of the recipient, which is always the logged-in user.
  pub recipient: &'src str,

  /// Message text, with the `/me` wrapper removed.
  pub text: &'src str,

  /// Whether the whisper was sent with `/me`.
  pub is_action: bool,
}

impl<'src> Whisper<'src> {
  fn parse(message: IrcMessageRef<'src>) -> Option<Self> {
    if message.command() != Command::Whisper {
      return None;
    }

    // `WHISPER <recipient> :<text>` carries the recipient where
    // other commands carry the channel
    let recipient = message.params()?.split(' ').next()?;
    let (text, is_action) = parse_message_text(message.text()?);
    Some(Whisper {
      sender: parse_sender(&message)?,
      recipient,
      text,
      is_action,
    })
  }
}

impl<'src> super::FromIrc<'src> for Whisper<'src> {
  #[inline]
  fn from_irc(message: IrcMessageRef<'src>) -> Option<Self> {
    Self::parse(message)
  }
}

impl<'src> From<Whisper<'src>> for super::Message<'src> {
  fn from(msg: Whisper<'src>) -> Self {
    super::Message::Whisper(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_whisper_basic() {
    let msg = IrcMessageRef::parse(
      "@badges=;color=#2E8B57;display-name=pajbot;emotes=;message-id=41;thread-id=40286300_82008718;turbo=0;user-id=82008718;user-type= :pajbot!pajbot@pajbot.tmi.twitch.tv WHISPER randers :Riftey Kappa",
    )
    .unwrap();
    let msg = Whisper::parse(msg).unwrap();

    assert_eq!(
      msg.sender,
      User {
        id: "82008718",
        login: "pajbot",
        name: "pajbot"
      }
    );
    assert_eq!(msg.recipient, "randers");
    assert_eq!(msg.text, "Riftey Kappa");
    assert!(!msg.is_action);
  }
}
