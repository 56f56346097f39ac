//! The user-facing event sink.
//!
//! Implement [`EventHandler`] on your own type and override the hooks you
//! care about; every hook has a default no-op implementation. Hooks are
//! invoked by the dispatcher in a fire-and-forget manner: they run to
//! completion per inbound line, but a panicking hook is isolated and routed
//! to [`EventHandler::on_handler_panic`] instead of tearing the client down.

use super::JoinedChannel;
use crate::msg::{
  ClearChat, ClearMsg, FollowersOnly, GlobalUserState, Notice, Part, Privmsg, UserNotice,
  UserState, Whisper,
};
use std::any::Any;
use tracing::error;

#[allow(unused_variables)]
pub trait EventHandler: Send + Sync + 'static {
  /// The first successful login of this client's lifetime.
  fn on_connect(&self) {}

  /// A successful login after the first one, or a server-requested
  /// reconnect.
  fn on_reconnect(&self) {}

  /// The transport went down, gracefully or not.
  fn on_disconnect(&self) {}

  /// A chat message.
  fn on_message(&self, msg: &Privmsg<'_>) {}

  /// A direct message to the logged-in user.
  fn on_whisper(&self, msg: &Whisper<'_>) {}

  /// The server confirmed a channel join by sending its full room state.
  fn on_channel_join(&self, channel: &JoinedChannel) {}

  /// A channel was left.
  fn on_channel_part(&self, part: &Part<'_>) {}

  /// The entire chat of a channel was cleared.
  fn on_chat_clear(&self, event: &ClearChat<'_>) {}

  /// A user was permanently banned.
  fn on_user_ban(&self, event: &ClearChat<'_>) {}

  /// A user was timed out.
  fn on_user_timeout(&self, event: &ClearChat<'_>) {}

  /// A single message was deleted.
  fn on_message_delete(&self, event: &ClearMsg<'_>) {}

  /// A user subscribed or resubscribed on their own.
  fn on_subscription(&self, event: &UserNotice<'_>) {}

  /// A user was gifted a subscription.
  fn on_gifted_subscription(&self, event: &UserNotice<'_>) {}

  /// A user is gifting a batch of subscriptions to random users.
  fn on_mystery_gift(&self, event: &UserNotice<'_>) {}

  /// A user continued the subscription they were gifted.
  fn on_paid_upgrade(&self, event: &UserNotice<'_>) {}

  /// A user converted their Prime subscription into a paid one.
  fn on_prime_upgrade(&self, event: &UserNotice<'_>) {}

  /// The channel was raided.
  fn on_raid(&self, event: &UserNotice<'_>) {}

  /// Someone sent an `/announcement`.
  fn on_announcement(&self, event: &UserNotice<'_>) {}

  /// Emote-only mode was turned on or off.
  fn on_emote_only_mode(&self, channel: &str, enabled: bool) {}

  /// Followers-only mode changed.
  fn on_follower_mode(&self, channel: &str, mode: FollowersOnly) {}

  /// Unique-message (r9k) mode was turned on or off.
  fn on_unique_mode(&self, channel: &str, enabled: bool) {}

  /// Slow mode changed. [`None`] means slow mode was turned off.
  fn on_slow_mode(&self, channel: &str, delay: Option<chrono::Duration>) {}

  /// Subscriber-only mode was turned on or off.
  fn on_sub_mode(&self, channel: &str, enabled: bool) {}

  /// State of the logged-in user in some channel.
  fn on_user_state(&self, event: &UserState<'_>) {}

  /// Global state of the logged-in user.
  fn on_global_user_state(&self, event: &GlobalUserState<'_>) {}

  /// A server notice.
  fn on_notice(&self, event: &Notice<'_>) {}

  /// Some other hook panicked while handling `event`.
  ///
  /// The panic never propagates into the dispatcher, so a failing handler
  /// cannot prevent later lines from being dispatched.
  fn on_handler_panic(&self, event: &'static str, payload: Box<dyn Any + Send>) {
    error!(event, panic = panic_message(payload.as_ref()), "event handler panicked");
  }
}

/// Extract a printable message out of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message
  } else {
    "<opaque panic payload>"
  }
}

/// An [`EventHandler`] which discards every event.
///
/// Useful for write-only clients and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn panic_message_extraction() {
    assert_eq!(panic_message(&"static str" as &(dyn Any + Send)), "static str");
    let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
    assert_eq!(panic_message(owned.as_ref()), "owned");
    let opaque: Box<dyn Any + Send> = Box::new(42u32);
    assert_eq!(panic_message(opaque.as_ref()), "<opaque panic payload>");
  }
}
