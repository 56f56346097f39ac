//! ## Twitch chat client
//!
//! This is the main interface for interacting with Twitch chat.
//! The entrypoint to this module is the [`Client`].
//!
//! A client is constructed from a [`Config`] and an [`EventHandler`], then
//! driven by [`Client::connect`]:
//!
//! ```rust,no_run
//! # async fn run() {
//! let credentials = twitch_ws::Credentials::new("your_login", "your_token").unwrap();
//! let config = twitch_ws::Config::default().credentials(credentials);
//! let client = twitch_ws::Client::new(config, std::sync::Arc::new(MyHandler));
//!
//! if client.connect().await {
//!   client.join("forsen").await;
//!   client.say("forsen", "hello").await;
//! }
//! # }
//! # struct MyHandler;
//! # impl twitch_ws::EventHandler for MyHandler {}
//! ```
//!
//! Generating an oauth2 token is out of scope for this library.
//! Head over to the [official documentation](https://dev.twitch.tv/docs/irc/authenticate-bot/#getting-an-access-token)
//! to see how you can generate one.
//!
//! The client handles on its own:
//! - Authentication and capability negotiation
//! - `PING`/`PONG` liveness
//! - Rate limiting (both for JOINs and PRIVMSGs)
//! - `RECONNECT` commands and dropped connections, including
//!   rejoining channels

mod dispatch;
pub mod events;
pub mod ratelimit;
pub mod transport;
mod write;
pub mod ws;

use self::events::EventHandler;
use self::ratelimit::{RateLimitConfig, RateLimiter};
use self::transport::{Transport, TransportError, TransportTx};
use self::ws::WsTransport;
use crate::irc::Command;
use crate::msg::{FollowersOnly, RoomState};
use rand::Rng;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, Notify, Semaphore};
use tracing::{debug, error, info, trace};

pub use write::PrivmsgBuilder;

/// The chat endpoint connected to by default.
pub const DEFAULT_SERVER_URI: &str = "wss://irc-ws.chat.twitch.tv:443";

/// How long [`Client::connect`] waits for the server to acknowledge a login.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long [`Client::join`] waits for the server to confirm a join.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const SEND_RETRY_DELAY: Duration = Duration::from_millis(2500);
pub(crate) const JOIN_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub(crate) const REJOIN_PACING: Duration = Duration::from_secs(1);

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Login credentials.
///
/// Without credentials the client connects anonymously: it can read chat,
/// but every attempt to send a message is refused.
#[derive(Clone)]
pub struct Credentials {
  login: String,
  token: String,
}

impl Credentials {
  /// Create credentials from a login and an oauth2 user access token.
  ///
  /// The token may carry the `oauth:` prefix or not; it is stored
  /// normalized without it.
  pub fn new(
    login: impl Into<String>,
    token: impl Into<String>,
  ) -> Result<Self, InvalidToken> {
    let token = token.into();
    let token = token
      .strip_prefix("oauth:")
      .map(str::to_owned)
      .unwrap_or(token);
    if token.is_empty() || token.chars().any(|c| c.is_whitespace()) {
      return Err(InvalidToken);
    }
    Ok(Self {
      login: login.into().to_ascii_lowercase(),
      token,
    })
  }

  /// The login these credentials belong to.
  pub fn login(&self) -> &str {
    &self.login
  }

  pub(crate) fn token(&self) -> &str {
    &self.token
  }
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("login", &self.login)
      .field("token", &"<redacted>")
      .finish()
  }
}

/// The supplied token could not be normalized into an oauth2 token.
#[derive(Debug)]
pub struct InvalidToken;

impl Display for InvalidToken {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("token must be non-empty and free of whitespace")
  }
}

impl std::error::Error for InvalidToken {}

/// A set of inbound commands the dispatcher drops without processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandSet(u32);

impl CommandSet {
  /// The empty set.
  pub const fn empty() -> Self {
    Self(0)
  }

  /// Add `command` to the set.
  ///
  /// Commands without a fixed identity ([`Command::Unknown`]) cannot be
  /// ignored and are left out.
  pub fn with(mut self, command: Command<'static>) -> Self {
    if let Some(bit) = command_bit(&command) {
      self.0 |= bit;
    }
    self
  }

  pub(crate) fn contains(&self, command: &Command<'_>) -> bool {
    command_bit(command)
      .map(|bit| self.0 & bit != 0)
      .unwrap_or(false)
  }
}

fn command_bit(command: &Command<'_>) -> Option<u32> {
  use Command::*;
  Some(match command {
    Privmsg => 1 << 0,
    UserNotice => 1 << 1,
    ClearChat => 1 << 2,
    ClearMsg => 1 << 3,
    Whisper => 1 << 4,
    UserState => 1 << 5,
    GlobalUserState => 1 << 6,
    Join => 1 << 7,
    Part => 1 << 8,
    Notice => 1 << 9,
    RoomState => 1 << 10,
    Ping => 1 << 11,
    Pong => 1 << 12,
    Reconnect => 1 << 13,
    Capability => 1 << 14,
    Welcome => 1 << 15,
    Unknown(_) => return None,
  })
}

/// Client configuration.
#[derive(Clone, Debug)]
pub struct Config {
  /// Login credentials. [`None`] connects anonymously.
  pub credentials: Option<Credentials>,

  /// The chat endpoint to connect to.
  pub server_uri: String,

  /// How long to wait before reopening the transport after it goes down.
  pub reconnect_delay: Duration,

  /// Rate limits applied to message sends and channel joins.
  pub rate_limits: RateLimitConfig,

  /// Inbound commands to drop without processing.
  pub ignored: CommandSet,

  /// Replace credential-bearing frames with a marker in log output.
  pub conceal_credentials: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      credentials: None,
      server_uri: DEFAULT_SERVER_URI.into(),
      reconnect_delay: DEFAULT_RECONNECT_DELAY,
      rate_limits: RateLimitConfig::default(),
      ignored: CommandSet::empty(),
      conceal_credentials: true,
    }
  }
}

impl Config {
  /// Set the login credentials.
  pub fn credentials(mut self, credentials: Credentials) -> Self {
    self.credentials = Some(credentials);
    self
  }

  /// Override the chat endpoint.
  pub fn server_uri(mut self, uri: impl Into<String>) -> Self {
    self.server_uri = uri.into();
    self
  }

  /// Set the delay between reconnect attempts.
  pub fn reconnect_delay(mut self, delay: Duration) -> Self {
    self.reconnect_delay = delay;
    self
  }

  /// Set the rate limit configuration.
  pub fn rate_limits(mut self, limits: RateLimitConfig) -> Self {
    self.rate_limits = limits;
    self
  }

  /// Drop `command` on the inbound side without processing it.
  pub fn ignore(mut self, command: Command<'static>) -> Self {
    self.ignored = self.ignored.with(command);
    self
  }

  /// Set whether credential-bearing frames are concealed in log output.
  pub fn conceal_credentials(mut self, conceal: bool) -> Self {
    self.conceal_credentials = conceal;
    self
  }
}

/// A channel the client is currently joined to, together with its
/// current modes.
///
/// An entry is admitted by the full room state the server sends after a
/// successful `JOIN`, kept up to date by partial room state updates, and
/// removed when the channel is parted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedChannel {
  /// Login of the channel.
  pub login: String,

  /// Whether only emotes may be sent.
  pub emote_only: bool,

  /// Followers-only configuration.
  pub followers_only: FollowersOnly,

  /// Whether only unique messages may be sent.
  pub unique_mode: bool,

  /// Minimum time between messages per user.
  /// [`None`] means slow mode is off.
  pub slow: Option<chrono::Duration>,

  /// Whether only subscribers may send messages.
  pub subs_only: bool,
}

impl JoinedChannel {
  fn new(state: &RoomState<'_>) -> Self {
    Self {
      login: state.channel.to_owned(),
      emote_only: state.emote_only.unwrap_or(false),
      followers_only: state.followers_only.unwrap_or(FollowersOnly::Disabled),
      unique_mode: state.unique_mode.unwrap_or(false),
      slow: state.slow.filter(|slow| !slow.is_zero()),
      subs_only: state.subs_only.unwrap_or(false),
    }
  }

  fn apply(&mut self, state: &RoomState<'_>) {
    if let Some(emote_only) = state.emote_only {
      self.emote_only = emote_only;
    }
    if let Some(followers_only) = state.followers_only {
      self.followers_only = followers_only;
    }
    if let Some(unique_mode) = state.unique_mode {
      self.unique_mode = unique_mode;
    }
    if let Some(slow) = state.slow {
      self.slow = (!slow.is_zero()).then_some(slow);
    }
    if let Some(subs_only) = state.subs_only {
      self.subs_only = subs_only;
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
  Idle,
  Connecting,
  Authenticated,
  Disposed,
}

struct ClientState {
  phase: Phase,
  transport_up: bool,
  has_connected: bool,
  joined: Vec<JoinedChannel>,
  moderated: HashSet<String>,
}

/// A single-slot signal with idempotent release.
///
/// Each release permits exactly one waiter to proceed; releasing an
/// already-released latch is a no-op, so repeated server acknowledgements
/// cannot accumulate credit.
struct Latch {
  sem: Semaphore,
}

impl Latch {
  fn new() -> Self {
    Self {
      sem: Semaphore::new(0),
    }
  }

  fn release(&self) {
    if self.sem.available_permits() == 0 {
      self.sem.add_permits(1);
    }
  }

  async fn wait(&self, deadline: Duration) -> bool {
    match tokio::time::timeout(deadline, self.sem.acquire()).await {
      Ok(Ok(permit)) => {
        permit.forget();
        true
      }
      _ => false,
    }
  }
}

struct Inner<T: Transport> {
  config: Config,
  transport: T,
  handler: Arc<dyn EventHandler>,
  tx: AsyncMutex<Option<T::Tx>>,
  state: Mutex<ClientState>,
  limiter: Mutex<RateLimiter>,
  connected: Latch,
  room_state: Latch,
  restart: Notify,
}

impl<T: Transport> Inner<T> {
  fn state(&self) -> MutexGuard<'_, ClientState> {
    self.state.lock().unwrap()
  }

  async fn write(&self, frame: &str, conceal: bool) -> Result<(), TransportError> {
    let mut tx = self.tx.lock().await;
    let Some(tx) = tx.as_mut() else {
      return Err(TransportError::NotConnected);
    };
    if conceal && self.config.conceal_credentials {
      trace!("sending <credentials concealed>");
    } else {
      trace!(frame = frame.trim_end(), "sending");
    }
    tx.send(frame).await
  }

  async fn close_transport(&self) {
    if let Some(mut tx) = self.tx.lock().await.take() {
      tx.close().await;
    }
  }
}

/// Twitch chat client.
///
/// Cheap to clone; all clones drive the same connection.
pub struct Client<T: Transport = WsTransport> {
  inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Client<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl Client {
  /// Create a client using the production WebSocket transport.
  pub fn new(config: Config, handler: Arc<dyn EventHandler>) -> Self {
    Self::with_transport(WsTransport, config, handler)
  }
}

impl<T: Transport> Client<T> {
  /// Create a client on top of a custom [`Transport`].
  pub fn with_transport(transport: T, config: Config, handler: Arc<dyn EventHandler>) -> Self {
    let limiter = RateLimiter::new(config.rate_limits);
    Self {
      inner: Arc::new(Inner {
        config,
        transport,
        handler,
        tx: AsyncMutex::new(None),
        state: Mutex::new(ClientState {
          phase: Phase::Idle,
          transport_up: false,
          has_connected: false,
          joined: Vec::new(),
          moderated: HashSet::new(),
        }),
        limiter: Mutex::new(limiter),
        connected: Latch::new(),
        room_state: Latch::new(),
        restart: Notify::new(),
      }),
    }
  }

  /// Connect to Twitch and wait for the login to be acknowledged.
  ///
  /// Returns `false` if the server does not acknowledge the login within
  /// 15 seconds, or if the client has been disposed.
  pub async fn connect(&self) -> bool {
    if !self.start() {
      return false;
    }
    match self.inner.connected.wait(CONNECT_TIMEOUT).await {
      true => true,
      false => {
        error!("connection to twitch timed out");
        false
      }
    }
  }

  /// Connect to Twitch without waiting for the login to be acknowledged.
  pub fn connect_unawaited(&self) {
    let _ = self.start();
  }

  fn start(&self) -> bool {
    let mut state = self.inner.state();
    match state.phase {
      Phase::Disposed => {
        error!("the client has been disposed");
        false
      }
      Phase::Connecting | Phase::Authenticated => true,
      Phase::Idle => {
        state.phase = Phase::Connecting;
        drop(state);
        tokio::spawn(run(Arc::clone(&self.inner)));
        true
      }
    }
  }

  /// Close the connection.
  ///
  /// A closed client does not reconnect on its own, but may be connected
  /// again with [`Client::connect`].
  pub async fn disconnect(&self) {
    {
      let mut state = self.inner.state();
      if !matches!(state.phase, Phase::Connecting | Phase::Authenticated) {
        return;
      }
      state.phase = Phase::Idle;
    }
    self.inner.close_transport().await;
    self.inner.restart.notify_one();
    info!("disconnected");
  }

  /// Close and reopen the connection.
  ///
  /// The transport is reopened after the configured reconnect delay,
  /// following the same path as a server-requested reconnect.
  pub fn reconnect(&self) {
    info!("restarting connection");
    self.inner.restart.notify_one();
  }

  /// Close the connection without waiting for the transport to shut down.
  pub fn disconnect_unawaited(&self) {
    let client = self.clone();
    tokio::spawn(async move { client.disconnect().await });
  }

  /// Tear the client down for good.
  ///
  /// Drops the joined and moderator sets and wakes up any pending
  /// [`Client::connect`] or [`Client::join`] callers.
  pub async fn dispose(&self) {
    {
      let mut state = self.inner.state();
      if state.phase == Phase::Disposed {
        return;
      }
      state.phase = Phase::Disposed;
      state.joined.clear();
      state.moderated.clear();
    }
    self.inner.close_transport().await;
    self.inner.restart.notify_one();
    self.inner.connected.release();
    self.inner.room_state.release();
    info!("disposed");
  }

  /// Whether the transport currently has an open connection.
  pub fn is_connected(&self) -> bool {
    self.inner.state().transport_up
  }

  /// Whether the client was constructed without credentials.
  pub fn is_anonymous(&self) -> bool {
    self.inner.config.credentials.is_none()
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.inner.config
  }

  /// A snapshot of the channels the client is currently joined to.
  pub fn joined_channels(&self) -> Vec<JoinedChannel> {
    self.inner.state().joined.clone()
  }

  /// Whether the logged-in user is known to be a moderator in `channel`.
  pub fn is_moderator(&self, channel: &str) -> bool {
    let channel = channel.strip_prefix('#').unwrap_or(channel);
    self.inner.state().moderated.contains(channel)
  }
}

/// The connection driver: opens the transport, logs in, pumps inbound
/// frames through the dispatcher, and reopens the transport after it
/// goes down, until the client is disconnected or disposed.
async fn run<T: Transport>(inner: Arc<Inner<T>>) {
  loop {
    if inner.state().phase != Phase::Connecting {
      break;
    }

    match inner.transport.connect(&inner.config.server_uri).await {
      Ok((tx, rx)) => {
        debug!(uri = %inner.config.server_uri, "transport connected");
        *inner.tx.lock().await = Some(tx);
        inner.state().transport_up = true;

        match login(&inner).await {
          Ok(()) => read_loop(&inner, rx).await,
          Err(e) => error!(error = %e, "login failed"),
        }

        inner.state().transport_up = false;
        inner.close_transport().await;
        dispatch::shield(&inner, "disconnect", || inner.handler.on_disconnect());
      }
      Err(e) => error!(error = %e, "failed to open transport"),
    }

    {
      let mut state = inner.state();
      match state.phase {
        Phase::Idle | Phase::Disposed => break,
        _ => state.phase = Phase::Connecting,
      }
    }
    tokio::time::sleep(inner.config.reconnect_delay).await;
  }
  debug!("client driver stopped");
}

async fn read_loop<T: Transport>(inner: &Arc<Inner<T>>, mut rx: T::Rx) {
  use self::transport::TransportRx;
  use futures_util::FutureExt;

  // a restart requested while no connection was open must not
  // kill this one
  let _ = inner.restart.notified().now_or_never();

  loop {
    tokio::select! {
      _ = inner.restart.notified() => {
        debug!("restarting transport");
        return;
      }
      frame = rx.recv() => match frame {
        Some(Ok(frame)) => dispatch::dispatch_frame(inner, &frame).await,
        Some(Err(e)) => {
          error!(error = %e, "transport read failed");
          return;
        }
        None => {
          info!("server closed the connection");
          return;
        }
      },
    }
  }
}

/// Request capabilities and authenticate.
///
/// Anonymous logins use a random `justinfan` nickname, which Twitch
/// accepts without a token.
async fn login<T: Transport>(inner: &Arc<Inner<T>>) -> Result<(), TransportError> {
  inner
    .write("CAP REQ :twitch.tv/tags twitch.tv/commands\r\n", false)
    .await?;
  match &inner.config.credentials {
    Some(credentials) => {
      inner
        .write(&format!("PASS oauth:{}\r\n", credentials.token()), true)
        .await?;
      inner
        .write(&format!("NICK {}\r\n", credentials.login()), true)
        .await?;
    }
    None => {
      inner
        .write(&format!("NICK {}\r\n", justinfan()), false)
        .await?;
    }
  }
  Ok(())
}

fn justinfan() -> String {
  format!("justinfan{}", rand::thread_rng().gen_range(100..900))
}

static_assert_send!(Client);
static_assert_sync!(Client);
