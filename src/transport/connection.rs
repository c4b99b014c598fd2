//! WebSocket connection to the bot's RPC endpoint.
//!
//! A [`Connection`] owns exactly one websocket for its whole lifetime. It
//! performs no retries; those belong to the readiness poller.
//!
//! # Lifecycle
//!
//! 1. `Connection::open` - Validate the URL and complete the handshake
//! 2. `send_text` / `recv` - Exchange frames
//! 3. `Connection::close` - Send a close frame (idempotent)
//!
//! Dropping an open connection tears the socket down without a close frame.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Client-side websocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connection
// ============================================================================

/// A single websocket to a JSON-RPC endpoint.
///
/// Exclusively owned by one call path; never shared, so no locking.
pub struct Connection {
    /// Endpoint this connection was opened against.
    url: Url,
    /// Live stream, `None` once closed.
    stream: Option<WsStream>,
}

impl Connection {
    /// Opens a websocket to `url`, failing if the handshake takes longer
    /// than `handshake_timeout`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the URL is malformed or not `ws`/`wss`
    /// - [`Error::Connect`] on network failure, rejected upgrade, or
    ///   handshake timeout
    pub async fn open(url: &str, handshake_timeout: Duration) -> Result<Self> {
        let url = parse_endpoint(url)?;

        let (stream, response) = match timeout(handshake_timeout, connect_async(url.as_str())).await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(classify_handshake_error(&url, e)),
            Err(_) => {
                return Err(Error::connect(
                    url.as_str(),
                    format!(
                        "handshake timed out after {}ms",
                        handshake_timeout.as_millis()
                    ),
                ));
            }
        };

        debug!(url = %url, status = %response.status(), "WebSocket connection established");

        Ok(Self {
            url,
            stream: Some(stream),
        })
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns `true` until [`Connection::close`] has been called.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is closed
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send_text(&mut self, text: String) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Receives the next frame, or `None` when the stream has ended.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is closed
    /// - [`Error::WebSocket`] if the read fails
    pub async fn recv(&mut self) -> Result<Option<Message>> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        Ok(stream.next().await.transpose()?)
    }

    /// Closes the connection. Calling this again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if the close frame could not be sent.
    /// The connection counts as closed either way.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        match stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                debug!(url = %self.url, "WebSocket connection closed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!(url = %self.url, "Connection dropped while open, tearing down socket");
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Validates an endpoint URL before dialling.
fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::invalid_url(raw, e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::invalid_url(
                raw,
                format!("unsupported scheme '{other}', expected ws or wss"),
            ));
        }
    }

    if url.host_str().is_none() {
        return Err(Error::invalid_url(raw, "missing host"));
    }

    Ok(url)
}

/// Splits handshake failures into non-network (URL) and network errors.
fn classify_handshake_error(url: &Url, err: WsError) -> Error {
    match err {
        WsError::Url(e) => Error::invalid_url(url.as_str(), e.to_string()),
        other => Error::connect(url.as_str(), other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
