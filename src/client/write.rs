//! The send surface: raw frames, chat messages, joins and parts.
//!
//! Every operation here follows the same policy: misuse and transport
//! failures are logged and swallowed, and rate-limited operations wait
//! their turn instead of failing.

use super::transport::Transport;
use super::{Client, JOIN_RETRY_DELAY, JOIN_TIMEOUT, SEND_RETRY_DELAY};
use crate::common::Channel;
use crate::msg;
use std::fmt::Write as _;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// A chat message in the works.
///
/// Created by [`Client::privmsg`], sent by [`PrivmsgBuilder::send`].
pub struct PrivmsgBuilder<'a, T: Transport> {
  client: &'a Client<T>,
  channel: &'a str,
  text: &'a str,
  reply_parent: Option<&'a str>,
  nonce: Option<&'a str>,
  action: bool,
}

impl<T: Transport> Client<T> {
  /// Send a raw, CRLF-terminated IRC frame.
  ///
  /// ⚠ This call is not rate limited in any way.
  pub async fn send_raw(&self, frame: &str) {
    if !frame.ends_with("\r\n") {
      error!("raw frames must be terminated by CRLF");
      return;
    }
    if let Err(e) = self.inner.write(frame, false).await {
      error!(error = %e, "failed to send frame");
    }
  }

  /// Create a chat message for `channel`.
  ///
  /// Additional properties are set through the builder methods on
  /// [`PrivmsgBuilder`], and the message goes out with
  /// [`PrivmsgBuilder::send`]:
  ///
  /// ```rust,no_run
  /// # async fn run(client: twitch_ws::Client) {
  /// client.privmsg("forsen", "hello").send().await;
  /// client.privmsg("forsen", "waves").action().send().await;
  /// # }
  /// ```
  pub fn privmsg<'a>(&'a self, channel: &'a str, text: &'a str) -> PrivmsgBuilder<'a, T> {
    PrivmsgBuilder {
      client: self,
      channel,
      text,
      reply_parent: None,
      nonce: None,
      action: false,
    }
  }

  /// Send a chat message to `channel`.
  pub async fn say(&self, channel: &str, text: &str) {
    self.privmsg(channel, text).send().await;
  }

  /// Send a chat message replying to `parent`.
  pub async fn reply(&self, parent: &msg::Privmsg<'_>, text: &str) {
    self
      .privmsg(parent.channel, text)
      .reply_to(parent.message_id)
      .send()
      .await;
  }

  /// Join `channel`.
  ///
  /// Waits for the rate limiter to allow the join, then for the server to
  /// confirm it with the channel's room state. Returns `false` if the
  /// confirmation does not arrive within 10 seconds.
  pub async fn join(&self, channel: &str) -> bool {
    let Ok(channel) = Channel::parse(channel) else {
      error!(channel, "invalid channel name");
      return false;
    };
    if !self.is_connected() {
      error!(channel = %channel, "cannot join: not connected");
      return false;
    }

    loop {
      let permitted = self.inner.limiter.lock().unwrap().try_join(Instant::now());
      if permitted {
        break;
      }
      debug!(channel = %channel, "join rate limit hit, retrying in 1s");
      tokio::time::sleep(JOIN_RETRY_DELAY).await;
    }

    if let Err(e) = self.inner.write(&format!("JOIN {channel}\r\n"), false).await {
      error!(error = %e, channel = %channel, "failed to send JOIN");
      return false;
    }

    let confirmed = self.inner.room_state.wait(JOIN_TIMEOUT).await;
    if !confirmed {
      error!(channel = %channel, "timed out waiting for room state");
    }
    confirmed
  }

  /// Join every channel in `channels`.
  ///
  /// Returns `true` only if every join was confirmed.
  pub async fn join_all(
    &self,
    channels: impl IntoIterator<Item = impl AsRef<str>>,
  ) -> bool {
    let mut all_confirmed = true;
    for channel in channels {
      all_confirmed &= self.join(channel.as_ref()).await;
    }
    all_confirmed
  }

  /// Leave `channel`.
  pub async fn part(&self, channel: &str) {
    let Ok(channel) = Channel::parse(channel) else {
      error!(channel, "invalid channel name");
      return;
    };
    if !self.is_connected() {
      error!(channel = %channel, "cannot part: not connected");
      return;
    }
    if let Err(e) = self.inner.write(&format!("PART {channel}\r\n"), false).await {
      error!(error = %e, channel = %channel, "failed to send PART");
    }
  }
}

impl<'a, T: Transport> PrivmsgBuilder<'a, T> {
  /// Send the message as a `/me` action.
  pub fn action(mut self) -> Self {
    self.action = true;
    self
  }

  /// Attach a client nonce, which identifies this message in the `NOTICE`
  /// Twitch may send as a response to it. Must not contain spaces.
  pub fn nonce(mut self, nonce: &'a str) -> Self {
    self.nonce = Some(nonce);
    self
  }

  /// Send the message as a reply to the message with the given ID.
  pub fn reply_to(mut self, message_id: &'a str) -> Self {
    self.reply_parent = Some(message_id);
    self
  }

  /// Send the message.
  ///
  /// Waits for the rate limiter to allow the send. Refused without writing
  /// when disconnected, anonymous, or when the nonce contains a space.
  pub async fn send(self) {
    let Self {
      client,
      channel,
      text,
      reply_parent,
      nonce,
      action,
    } = self;

    let Ok(channel) = Channel::parse(channel) else {
      error!(channel, "invalid channel name");
      return;
    };
    if !client.is_connected() {
      error!(channel = %channel, "cannot send message: not connected");
      return;
    }
    if client.is_anonymous() {
      error!(channel = %channel, "cannot send messages as an anonymous user");
      return;
    }
    if nonce.map(|nonce| nonce.contains(' ')).unwrap_or(false) {
      error!(channel = %channel, "client nonce must not contain spaces");
      return;
    }

    loop {
      let is_moderator = client.inner.state().moderated.contains(channel.login());
      let permitted = client
        .inner
        .limiter
        .lock()
        .unwrap()
        .try_message(channel.login(), is_moderator, Instant::now());
      if permitted {
        break;
      }
      debug!(channel = %channel, "message rate limit hit");
      warn!(channel = %channel, "rate limited, retrying in 2.5s");
      tokio::time::sleep(SEND_RETRY_DELAY).await;
    }

    let mut frame = String::with_capacity(text.len() + 64);
    if reply_parent.is_some() || nonce.is_some() {
      frame.push('@');
      if let Some(message_id) = reply_parent {
        let _ = write!(frame, "reply-parent-msg-id={message_id}");
        if nonce.is_some() {
          frame.push(';');
        }
      }
      if let Some(nonce) = nonce {
        let _ = write!(frame, "client-nonce={nonce}");
      }
      frame.push(' ');
    }
    let _ = write!(frame, "PRIVMSG {channel} :");
    if action {
      frame.push_str(".me ");
    }
    frame.push_str(text);
    frame.push_str("\r\n");

    if let Err(e) = client.inner.write(&frame, false).await {
      error!(error = %e, channel = %channel, "failed to send message");
    }
  }
}
