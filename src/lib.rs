//! ## twitch-ws
//!
//! A client for Twitch chat over WebSockets.
//!
//! The crate is split into three layers:
//! - [`irc`]: a zero-copy parser for the Twitch flavor of IRC
//! - [`msg`]: typed decoders for every message Twitch sends
//! - [`client`]: the connection itself, with login, reconnects, rate
//!   limiting, channel state tracking, and an event hook interface
//!
//! Getting into chat takes a [`Config`], an [`EventHandler`], and a
//! [`Client`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! struct Handler;
//!
//! impl twitch_ws::EventHandler for Handler {
//!   fn on_message(&self, msg: &twitch_ws::Privmsg<'_>) {
//!     println!("{}: {}", msg.sender.name, msg.text);
//!   }
//! }
//!
//! # async fn run() {
//! // no credentials: connect anonymously, read-only
//! let client = twitch_ws::Client::new(twitch_ws::Config::default(), Arc::new(Handler));
//! if client.connect().await {
//!   client.join("forsen").await;
//! }
//! # }
//! ```

#[macro_use]
mod macros;

pub mod client;
pub mod common;
pub mod irc;
pub mod msg;

pub use client::events::{EventHandler, NoopHandler};
pub use client::ratelimit::RateLimitConfig;
pub use client::transport::{Transport, TransportError, TransportRx, TransportTx};
pub use client::ws::WsTransport;
pub use client::{
  Client, CommandSet, Config, Credentials, InvalidToken, JoinedChannel, PrivmsgBuilder,
  DEFAULT_SERVER_URI,
};
pub use common::{Channel, InvalidChannelName};
pub use irc::{Command, IrcMessageRef, Prefix, Tag};
pub use msg::*;
