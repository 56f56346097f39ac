//! The WebSocket transport used in production.

use super::transport::{Transport, TransportError, TransportRx, TransportTx};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::trace;

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to Twitch over `wss`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
  type Tx = WsTx;
  type Rx = WsRx;

  async fn connect(&self, uri: &str) -> Result<(WsTx, WsRx), TransportError> {
    trace!(uri, "opening websocket");
    let (stream, _) = connect_async(uri).await?;
    let (sink, stream) = stream.split();
    Ok((WsTx { sink }, WsRx { stream }))
  }
}

/// Write half of a [`WsTransport`] connection.
pub struct WsTx {
  sink: SplitSink<Stream, Message>,
}

impl TransportTx for WsTx {
  async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
    Ok(self.sink.send(Message::text(frame)).await?)
  }

  async fn close(&mut self) {
    let _ = self.sink.close().await;
  }
}

/// Read half of a [`WsTransport`] connection.
pub struct WsRx {
  stream: SplitStream<Stream>,
}

impl TransportRx for WsRx {
  async fn recv(&mut self) -> Option<Result<String, TransportError>> {
    loop {
      return match self.stream.next().await? {
        Ok(Message::Text(frame)) => Some(Ok(frame.as_str().to_owned())),
        Ok(Message::Close(_)) => None,
        // ping/pong are answered by tungstenite itself,
        // and twitch never sends binary frames
        Ok(_) => continue,
        Err(e) => Some(Err(e.into())),
      };
    }
  }
}
