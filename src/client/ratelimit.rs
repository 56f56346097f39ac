//! Sliding-window rate limiting for message sends and channel joins.
//!
//! Twitch enforces two separate regimes: messages are limited per 30 second
//! window, with a higher cap for channels where the user is a moderator, and
//! channel joins are limited per 10 second window. The ledgers here record
//! the timestamp of every approved action and are trimmed lazily whenever a
//! new decision is made, so no timers are involved.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) const MESSAGE_WINDOW: Duration = Duration::from_secs(30);
pub(crate) const JOIN_WINDOW: Duration = Duration::from_secs(10);

/// Rate limit configuration.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
  /// Maximum messages per 30 second window. Defaults to 20.
  pub messages: u32,

  /// Maximum messages per 30 second window in channels where the
  /// logged-in user is a moderator. Defaults to 100.
  pub mod_messages: u32,

  /// Maximum channel joins per 10 second window. Defaults to 20.
  pub joins: u32,

  /// Whether the message limits apply across all channels combined
  /// instead of per channel. Defaults to `false`.
  pub global: bool,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self {
      messages: 20,
      mod_messages: 100,
      joins: 20,
      global: false,
    }
  }
}

pub(crate) struct RateLimiter {
  config: RateLimitConfig,
  messages: HashMap<String, VecDeque<Instant>>,
  joins: VecDeque<Instant>,
}

impl RateLimiter {
  pub fn new(config: RateLimitConfig) -> Self {
    Self {
      config,
      messages: HashMap::new(),
      joins: VecDeque::new(),
    }
  }

  /// Decide whether a message may be sent to `channel` right now.
  ///
  /// A `true` result has already recorded the send.
  pub fn try_message(&mut self, channel: &str, is_moderator: bool, now: Instant) -> bool {
    if !self.messages.contains_key(channel) {
      self.messages.insert(channel.to_owned(), VecDeque::new());
    }

    if self.config.global {
      let mut total = 0;
      for ledger in self.messages.values_mut() {
        trim(ledger, now, MESSAGE_WINDOW);
        total += ledger.len();
      }
      // everyone needs headroom against the moderator cap, and
      // non-moderators are additionally capped at the base limit
      if total >= self.config.mod_messages as usize {
        return false;
      }
      if total >= self.config.messages as usize && !is_moderator {
        return false;
      }
    } else if let Some(ledger) = self.messages.get_mut(channel) {
      trim(ledger, now, MESSAGE_WINDOW);
      let cap = match is_moderator {
        true => self.config.mod_messages,
        false => self.config.messages,
      };
      if ledger.len() >= cap as usize {
        return false;
      }
    }

    self
      .messages
      .entry(channel.to_owned())
      .or_default()
      .push_back(now);
    true
  }

  /// Decide whether a channel may be joined right now.
  ///
  /// A `true` result has already recorded the join.
  pub fn try_join(&mut self, now: Instant) -> bool {
    trim(&mut self.joins, now, JOIN_WINDOW);
    if self.joins.len() >= self.config.joins as usize {
      return false;
    }
    self.joins.push_back(now);
    true
  }
}

/// An entry is retained only while strictly younger than the window.
fn trim(ledger: &mut VecDeque<Instant>, now: Instant, window: Duration) {
  while let Some(&front) = ledger.front() {
    if now.duration_since(front) >= window {
      ledger.pop_front();
    } else {
      break;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn limiter(messages: u32, mod_messages: u32, joins: u32, global: bool) -> RateLimiter {
    RateLimiter::new(RateLimitConfig {
      messages,
      mod_messages,
      joins,
      global,
    })
  }

  #[test]
  fn per_channel_cap() {
    let mut rl = limiter(2, 100, 20, false);
    let now = Instant::now();

    assert!(rl.try_message("a", false, now));
    assert!(rl.try_message("a", false, now));
    assert!(!rl.try_message("a", false, now));
    // a different channel has its own ledger
    assert!(rl.try_message("b", false, now));
  }

  #[test]
  fn moderator_uplift_is_per_channel() {
    let mut rl = limiter(1, 3, 20, false);
    let now = Instant::now();

    assert!(rl.try_message("a", true, now));
    assert!(rl.try_message("a", true, now));
    assert!(rl.try_message("a", true, now));
    assert!(!rl.try_message("a", true, now));

    assert!(rl.try_message("b", false, now));
    assert!(!rl.try_message("b", false, now));
  }

  #[test]
  fn window_slides() {
    let mut rl = limiter(1, 100, 20, false);
    let now = Instant::now();

    assert!(rl.try_message("a", false, now));
    assert!(!rl.try_message("a", false, now + Duration::from_secs(29)));
    // an entry aged exactly one window is expired
    assert!(rl.try_message("a", false, now + MESSAGE_WINDOW));
  }

  #[test]
  fn global_mode_sums_across_channels() {
    let mut rl = limiter(2, 4, 20, true);
    let now = Instant::now();

    assert!(rl.try_message("a", false, now));
    assert!(rl.try_message("b", false, now));
    // base cap reached across channels
    assert!(!rl.try_message("c", false, now));
    // moderators may keep going up to the moderator cap
    assert!(rl.try_message("c", true, now));
    assert!(rl.try_message("d", true, now));
    assert!(!rl.try_message("d", true, now));
  }

  #[test]
  fn join_cap_and_window() {
    let mut rl = limiter(20, 100, 2, false);
    let now = Instant::now();

    assert!(rl.try_join(now));
    assert!(rl.try_join(now));
    assert!(!rl.try_join(now));
    assert!(!rl.try_join(now + Duration::from_secs(9)));
    assert!(rl.try_join(now + JOIN_WINDOW));
  }

  #[test]
  fn denied_attempts_consume_no_slot() {
    let mut rl = limiter(1, 100, 20, false);
    let now = Instant::now();

    assert!(rl.try_message("a", false, now));
    for _ in 0..10 {
      assert!(!rl.try_message("a", false, now + Duration::from_secs(1)));
    }
    assert!(rl.try_message("a", false, now + MESSAGE_WINDOW));
  }
}
