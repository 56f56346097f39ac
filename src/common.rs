//! Types and utilities shared between the parser, the decoders, and the client.

use std::borrow::Cow;
use std::fmt::Display;

/// A validated Twitch channel login.
///
/// Stored without the leading `#`, always lowercase. When written into an
/// IRC frame the `#` prefix is added back by the send surface.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(String);

impl Channel {
  /// Parse a string into a channel login.
  ///
  /// Accepts both `forsen` and `#forsen`. Logins are lowercased, and must
  /// consist of ASCII alphanumerics and underscores.
  pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidChannelName> {
    let s = s.as_ref();
    let login = s.strip_prefix('#').unwrap_or(s);
    if login.is_empty()
      || !login
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
      return Err(InvalidChannelName);
    }
    Ok(Self(login.to_ascii_lowercase()))
  }

  /// Get the bare login, without the `#` prefix.
  pub fn login(&self) -> &str {
    &self.0
  }
}

impl Display for Channel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

impl AsRef<str> for Channel {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Failed to parse a channel name.
#[derive(Debug)]
pub struct InvalidChannelName;

impl Display for InvalidChannelName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("channel name must be a twitch login, optionally prefixed by \"#\"")
  }
}

impl std::error::Error for InvalidChannelName {}

/// Unescape an IRCv3 tag value.
///
/// Returns a borrowed value unless the input actually contains an escape
/// sequence, in which case a new string is allocated.
pub(crate) fn maybe_unescape(value: &str) -> Cow<'_, str> {
  match value.find('\\') {
    Some(at) => Cow::Owned(unescape_from(value, at)),
    None => Cow::Borrowed(value),
  }
}

fn unescape_from(input: &str, start: usize) -> String {
  let mut out = String::with_capacity(input.len());
  out.push_str(&input[..start]);

  let mut escape = false;
  for char in input[start..].chars() {
    match char {
      ':' if escape => {
        out.push(';');
        escape = false;
      }
      's' if escape => {
        out.push(' ');
        escape = false;
      }
      '\\' if escape => {
        out.push('\\');
        escape = false;
      }
      'r' if escape => {
        out.push('\r');
        escape = false;
      }
      'n' if escape => {
        out.push('\n');
        escape = false;
      }
      '\\' => escape = true,
      c => {
        escape = false;
        out.push(c);
      }
    }
  }

  out
}

static_assert_send!(Channel);
static_assert_sync!(Channel);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_accepts_bare_and_prefixed_logins() {
    assert_eq!(Channel::parse("forsen").unwrap().login(), "forsen");
    assert_eq!(Channel::parse("#forsen").unwrap().login(), "forsen");
    assert_eq!(Channel::parse("#Forsen").unwrap().login(), "forsen");
  }

  #[test]
  fn channel_rejects_invalid_logins() {
    assert!(Channel::parse("").is_err());
    assert!(Channel::parse("#").is_err());
    assert!(Channel::parse("has space").is_err());
    assert!(Channel::parse("#chan#nel").is_err());
  }

  #[test]
  fn channel_display_restores_prefix() {
    assert_eq!(Channel::parse("forsen").unwrap().to_string(), "#forsen");
  }

  #[test]
  fn unescape_borrows_when_clean() {
    assert!(matches!(maybe_unescape("hello world"), Cow::Borrowed(_)));
  }

  #[test]
  fn unescape_handles_all_sequences() {
    assert_eq!(
      maybe_unescape(r"10\smonths\:\\\r\n"),
      "10 months;\\\r\n".to_string()
    );
  }

  #[test]
  fn unescape_ignores_dangling_backslash() {
    assert_eq!(maybe_unescape(r"trailing\"), "trailing");
  }
}
