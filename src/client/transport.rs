//! The seam between the client and the network.
//!
//! The client only ever talks to the connection through these traits, which
//! model a frame-oriented duplex channel: whole text frames go out through
//! [`TransportTx`], whole text frames come in through [`TransportRx`].
//! [`WsTransport`][super::ws::WsTransport] is the implementation used in
//! production; tests drive the client through a scripted implementation.

use std::fmt::Display;
use std::future::Future;

/// A connector producing one duplex frame channel per call.
pub trait Transport: Send + Sync + 'static {
  type Tx: TransportTx;
  type Rx: TransportRx;

  /// Open a new connection to `uri`.
  fn connect(
    &self,
    uri: &str,
  ) -> impl Future<Output = Result<(Self::Tx, Self::Rx), TransportError>> + Send;
}

/// The write half of a connection.
pub trait TransportTx: Send + 'static {
  /// Send a single text frame.
  fn send(&mut self, frame: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

  /// Close the connection gracefully.
  fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// The read half of a connection.
pub trait TransportRx: Send + 'static {
  /// Receive the next text frame.
  ///
  /// Returns [`None`] once the connection is closed.
  fn recv(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;
}

/// A transport-level failure.
#[derive(Debug)]
pub enum TransportError {
  /// Attempted to use the transport while no connection is open.
  NotConnected,

  /// The underlying WebSocket operation failed.
  Ws(tokio_tungstenite::tungstenite::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
  fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
    Self::Ws(value)
  }
}

impl Display for TransportError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TransportError::NotConnected => f.write_str("transport is not connected"),
      TransportError::Ws(e) => write!(f, "websocket error: {e}"),
    }
  }
}

impl std::error::Error for TransportError {}
