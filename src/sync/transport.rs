//! Event stream transport.
//!
//! The connection loop only needs two things from a socket: the next text
//! frame and a way to close it. [`Transport`] and [`Connector`] capture
//! exactly that, so tests can script frames without a network and the
//! production path uses `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::domain::GameId;
use crate::error::ClientError;

/// An open, receive-only event stream.
#[async_trait]
pub trait Transport: Send {
    /// Waits for the next text frame.
    ///
    /// Returns `None` once the peer has closed the stream, and
    /// `Some(Err(_))` on a transport failure. Control frames are handled
    /// internally and never surface.
    async fn recv(&mut self) -> Option<Result<String, ClientError>>;

    /// Closes the stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the close handshake fails.
    async fn close(&mut self) -> Result<(), ClientError>;
}

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a stream to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the connection or handshake
    /// fails.
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ClientError>;
}

/// Builds the event stream URL for a game from the REST base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; `/ws` is appended to the
/// base path and `game_id` is set as the only query parameter.
///
/// # Errors
///
/// Returns [`ClientError::InvalidScheme`] for any other scheme.
pub fn ws_url(api_base: &Url, game_id: GameId) -> Result<Url, ClientError> {
    let ws_scheme = match api_base.scheme() {
        "http" => "ws",
        "https" => "wss",
        scheme => return Err(ClientError::InvalidScheme(scheme.to_string())),
    };
    let mut url = api_base.clone();
    url.set_scheme(ws_scheme)
        .map_err(|()| ClientError::InvalidScheme(ws_scheme.to_string()))?;
    let path = format!("{}/ws", api_base.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("game_id", &game_id.to_string());
    Ok(url)
}

/// Production connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, ClientError> {
        let (stream, response) = connect_async(url.as_str()).await?;
        tracing::debug!(%url, status = response.status().as_u16(), "websocket handshake complete");
        Ok(Box::new(WsTransport { stream }))
    }
}

/// A `tokio-tungstenite` WebSocket.
#[derive(Debug)]
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> Option<Result<String, ClientError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!(len = bytes.len(), "ignoring non-utf8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "close frame received");
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        match self.stream.close(None).await {
            Ok(())
            | Err(
                tokio_tungstenite::tungstenite::Error::ConnectionClosed
                | tokio_tungstenite::tungstenite::Error::AlreadyClosed,
            ) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
