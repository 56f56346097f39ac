//! Routes inbound lines to state updates and user hooks.

use super::transport::Transport;
use super::{Client, Inner, JoinedChannel, Phase, REJOIN_PACING};
use crate::irc::{frame_lines, Command, IrcMessageRef};
use crate::msg::{
  ClearChat, ClearChatAction, ClearMsg, GlobalUserState, Notice, Part, Ping, Privmsg, RoomState,
  UserNotice, UserNoticeEvent, UserState, Whisper,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Dispatch every line of a single inbound frame, in order.
pub(super) async fn dispatch_frame<T: Transport>(inner: &Arc<Inner<T>>, frame: &str) {
  for line in frame_lines(frame) {
    match IrcMessageRef::parse(line) {
      Some(message) => dispatch(inner, message).await,
      None => warn!(line, "failed to parse line"),
    }
  }
}

async fn dispatch<T: Transport>(inner: &Arc<Inner<T>>, message: IrcMessageRef<'_>) {
  let command = message.command();
  if inner.config.ignored.contains(&command) {
    return;
  }

  match command {
    Command::Privmsg => match message.cast::<Privmsg>() {
      Some(msg) => shield(inner, "message", || inner.handler.on_message(&msg)),
      None => warn!(line = message.raw(), "malformed PRIVMSG"),
    },
    Command::Welcome => on_welcome(inner),
    Command::Reconnect => {
      info!("server requested a reconnect");
      inner.restart.notify_one();
      shield(inner, "reconnect", || inner.handler.on_reconnect());
    }
    Command::Ping => {
      let pong = match message.cast::<Ping>().and_then(|ping| ping.nonce) {
        Some(nonce) => format!("PONG :{nonce}\r\n"),
        None => String::from("PONG\r\n"),
      };
      if let Err(e) = inner.write(&pong, false).await {
        error!(error = %e, "failed to answer PING");
      }
    }
    // unrecognized `msg-id`s are dropped without a sound
    Command::UserNotice => {
      if let Some(msg) = message.cast::<UserNotice>() {
        on_user_notice(inner, &msg);
      }
    }
    Command::ClearChat => match message.cast::<ClearChat>() {
      Some(msg) => match &msg.action {
        ClearChatAction::Clear => {
          shield(inner, "chat_clear", || inner.handler.on_chat_clear(&msg))
        }
        ClearChatAction::Ban { .. } => {
          shield(inner, "user_ban", || inner.handler.on_user_ban(&msg))
        }
        ClearChatAction::Timeout { .. } => {
          shield(inner, "user_timeout", || inner.handler.on_user_timeout(&msg))
        }
      },
      None => warn!(line = message.raw(), "malformed CLEARCHAT"),
    },
    Command::ClearMsg => match message.cast::<ClearMsg>() {
      Some(msg) => shield(inner, "message_delete", || {
        inner.handler.on_message_delete(&msg)
      }),
      None => warn!(line = message.raw(), "malformed CLEARMSG"),
    },
    Command::RoomState => on_room_state(inner, &message),
    Command::Part => on_part(inner, &message),
    Command::Notice => on_notice(inner, &message),
    Command::UserState => on_user_state(inner, &message),
    Command::GlobalUserState => match message.cast::<GlobalUserState>() {
      Some(msg) => shield(inner, "global_user_state", || {
        inner.handler.on_global_user_state(&msg)
      }),
      None => warn!(line = message.raw(), "malformed GLOBALUSERSTATE"),
    },
    Command::Whisper => match message.cast::<Whisper>() {
      Some(msg) => shield(inner, "whisper", || inner.handler.on_whisper(&msg)),
      None => warn!(line = message.raw(), "malformed WHISPER"),
    },
    Command::Join => {
      if let Some(channel) = message.channel() {
        debug!(channel, "join acknowledged");
      }
    }
    _ => {}
  }
}

/// Invoke a user hook behind a panic shield.
///
/// A panicking hook reaches the panic sink and nothing else.
pub(super) fn shield<T: Transport>(inner: &Inner<T>, event: &'static str, hook: impl FnOnce()) {
  if let Err(payload) = catch_unwind(AssertUnwindSafe(hook)) {
    let sink = AssertUnwindSafe(move || inner.handler.on_handler_panic(event, payload));
    if catch_unwind(sink).is_err() {
      error!(event, "panic sink panicked");
    }
  }
}

fn on_welcome<T: Transport>(inner: &Arc<Inner<T>>) {
  let first = {
    let mut state = inner.state();
    state.phase = Phase::Authenticated;
    let first = !state.has_connected;
    state.has_connected = true;
    first
  };
  inner.connected.release();

  if first {
    info!("logged in");
    shield(inner, "connect", || inner.handler.on_connect());
  } else {
    info!("logged back in");
    shield(inner, "reconnect", || inner.handler.on_reconnect());
    let client = Client {
      inner: Arc::clone(inner),
    };
    tokio::spawn(rejoin_all(client));
  }
}

/// Rejoin every channel in the joined set after a reconnect,
/// pacing the attempts well below the join rate limit.
async fn rejoin_all<T: Transport>(client: Client<T>) {
  for channel in client.joined_channels() {
    match client.join(&channel.login).await {
      true => info!(channel = %channel.login, "rejoined channel"),
      false => warn!(channel = %channel.login, "failed to rejoin channel"),
    }
    tokio::time::sleep(REJOIN_PACING).await;
  }
}

fn on_user_notice<T: Transport>(inner: &Arc<Inner<T>>, msg: &UserNotice<'_>) {
  let handler = &inner.handler;
  match &msg.event {
    UserNoticeEvent::Subscription { .. } => {
      shield(inner, "subscription", || handler.on_subscription(msg))
    }
    UserNoticeEvent::SubGift { .. } => shield(inner, "gifted_subscription", || {
      handler.on_gifted_subscription(msg)
    }),
    UserNoticeEvent::SubMysteryGift { .. } => {
      shield(inner, "mystery_gift", || handler.on_mystery_gift(msg))
    }
    UserNoticeEvent::GiftPaidUpgrade { .. } => {
      shield(inner, "paid_upgrade", || handler.on_paid_upgrade(msg))
    }
    UserNoticeEvent::PrimeUpgrade { .. } => {
      shield(inner, "prime_upgrade", || handler.on_prime_upgrade(msg))
    }
    UserNoticeEvent::Raid { .. } => shield(inner, "raid", || handler.on_raid(msg)),
    UserNoticeEvent::Announcement { .. } => {
      shield(inner, "announcement", || handler.on_announcement(msg))
    }
  }
}

fn on_room_state<T: Transport>(inner: &Arc<Inner<T>>, message: &IrcMessageRef<'_>) {
  let Some(msg) = message.cast::<RoomState>() else {
    warn!(line = message.raw(), "malformed ROOMSTATE");
    return;
  };

  if msg.is_full() {
    // the full room state doubles as the join acknowledgement
    let descriptor = {
      let mut state = inner.state();
      match state.joined.iter_mut().find(|c| c.login == msg.channel) {
        Some(existing) => {
          existing.apply(&msg);
          existing.clone()
        }
        None => {
          let channel = JoinedChannel::new(&msg);
          state.joined.push(channel.clone());
          channel
        }
      }
    };
    inner.room_state.release();
    shield(inner, "channel_join", || {
      inner.handler.on_channel_join(&descriptor)
    });
    return;
  }

  {
    let mut state = inner.state();
    if let Some(channel) = state.joined.iter_mut().find(|c| c.login == msg.channel) {
      channel.apply(&msg);
    }
  }

  let handler = &inner.handler;
  if let Some(enabled) = msg.emote_only {
    shield(inner, "emote_only_mode", || {
      handler.on_emote_only_mode(msg.channel, enabled)
    });
  } else if let Some(mode) = msg.followers_only {
    shield(inner, "follower_mode", || {
      handler.on_follower_mode(msg.channel, mode)
    });
  } else if let Some(enabled) = msg.unique_mode {
    shield(inner, "unique_mode", || {
      handler.on_unique_mode(msg.channel, enabled)
    });
  } else if let Some(delay) = msg.slow {
    shield(inner, "slow_mode", || {
      handler.on_slow_mode(msg.channel, (!delay.is_zero()).then_some(delay))
    });
  } else if let Some(enabled) = msg.subs_only {
    shield(inner, "sub_mode", || handler.on_sub_mode(msg.channel, enabled));
  } else {
    warn!(line = message.raw(), "unrecognized ROOMSTATE shape");
  }
}

fn on_part<T: Transport>(inner: &Arc<Inner<T>>, message: &IrcMessageRef<'_>) {
  let Some(msg) = message.cast::<Part>() else {
    warn!(line = message.raw(), "malformed PART");
    return;
  };

  {
    let mut state = inner.state();
    let before = state.joined.len();
    state.joined.retain(|c| c.login != msg.channel);
    if state.joined.len() != before {
      debug!(channel = msg.channel, "left channel");
    }
  }
  shield(inner, "channel_part", || inner.handler.on_channel_part(&msg));
}

fn on_notice<T: Transport>(inner: &Arc<Inner<T>>, message: &IrcMessageRef<'_>) {
  let Some(msg) = message.cast::<Notice>() else {
    warn!(line = message.raw(), "malformed NOTICE");
    return;
  };

  let bad_auth = msg
    .msg_id
    .map(|id| id.contains("bad_auth"))
    .unwrap_or(false)
    || msg.text.eq_ignore_ascii_case("login authentication failed")
    || msg.text.eq_ignore_ascii_case("improperly formatted auth");

  if bad_auth {
    error!(text = msg.text, "authentication rejected, the token is invalid or expired");
  } else if msg.msg_id == Some("msg_channel_suspended") {
    error!(channel = ?msg.channel, "channel is suspended");
  }

  shield(inner, "notice", || inner.handler.on_notice(&msg));
}

fn on_user_state<T: Transport>(inner: &Arc<Inner<T>>, message: &IrcMessageRef<'_>) {
  let Some(msg) = message.cast::<UserState>() else {
    warn!(line = message.raw(), "malformed USERSTATE");
    return;
  };

  {
    let mut state = inner.state();
    if msg.is_moderator {
      if !state.moderated.contains(msg.channel) {
        debug!(channel = msg.channel, "moderator status granted");
        state.moderated.insert(msg.channel.to_owned());
      }
    } else if state.moderated.remove(msg.channel) {
      debug!(channel = msg.channel, "moderator status removed");
    }
  }
  shield(inner, "user_state", || inner.handler.on_user_state(&msg));
}
