//! JSON-RPC client over a single websocket.
//!
//! Calls are strictly sequential: one request is written, then the client
//! blocks on the next frame until it arrives or the call deadline passes.
//! The reply must carry the id that was just issued; there is no
//! correlation map and no resynchronization.
//!
//! # Failure Classification
//!
//! | Situation | Error |
//! |-----------|-------|
//! | Connection closed / never opened | [`Error::NotConnected`] |
//! | Binary, close, or raw frame; end of stream | [`Error::Protocol`] |
//! | Text that is not a JSON object | [`Error::Protocol`] |
//! | Reply id differs from the issued id | [`Error::IdMismatch`] |
//! | Reply carries `error` | [`Error::Remote`] |
//! | No reply within the deadline | [`Error::RequestTimeout`] |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Request, Response};

use super::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a single call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for the websocket handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// RpcCaller
// ============================================================================

/// Anything that can issue one JSON-RPC call and wait for its result.
///
/// Implemented by [`RpcClient`]; the exercise protocol is written against
/// this trait.
#[async_trait]
pub trait RpcCaller: Send {
    /// Issues `method` with `params` and waits up to `call_timeout` for the
    /// result.
    async fn call(
        &mut self,
        method: &str,
        params: Option<Vec<Value>>,
        call_timeout: Duration,
    ) -> Result<Value>;
}

// ============================================================================
// RpcClient
// ============================================================================

/// JSON-RPC client owning one [`Connection`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use cog_rpc_check::RpcClient;
/// use serde_json::json;
///
/// # async fn example() -> cog_rpc_check::Result<()> {
/// let mut client = RpcClient::connect("ws://127.0.0.1:6133/", Duration::from_secs(10)).await?;
/// let result = client
///     .call("CORE__LOAD", Some(vec![json!(["alpha"])]), Duration::from_secs(30))
///     .await;
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct RpcClient {
    /// Underlying websocket.
    connection: Connection,
    /// Id the next call will use.
    next_id: RequestId,
    /// Id still awaiting a reply. Only stays set if a call was cancelled.
    awaiting: Option<RequestId>,
}

impl RpcClient {
    /// Wraps an open connection. Ids start at [`RequestId::FIRST`].
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            next_id: RequestId::FIRST,
            awaiting: None,
        }
    }

    /// Opens a connection to `url` and wraps it.
    ///
    /// # Errors
    ///
    /// See [`Connection::open`].
    pub async fn connect(url: &str, handshake_timeout: Duration) -> Result<Self> {
        Ok(Self::new(Connection::open(url, handshake_timeout).await?))
    }

    /// Opens a client, runs `body` with it, and closes it on every exit path.
    ///
    /// If the returned future is dropped mid-flight, the socket is torn
    /// down with the client.
    ///
    /// # Errors
    ///
    /// Returns the connect error, or whatever `body` returns. A failure to
    /// close is logged and does not mask the body's outcome.
    pub async fn scoped<T, F>(url: &str, handshake_timeout: Duration, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut RpcClient) -> BoxFuture<'c, Result<T>>,
    {
        let mut client = Self::connect(url, handshake_timeout).await?;
        let outcome = body(&mut client).await;

        if let Err(e) = client.close().await {
            warn!(error = %e, "Failed to close RPC connection");
        }

        outcome
    }

    /// Returns the id of the most recently issued request.
    #[inline]
    #[must_use]
    pub fn last_issued_id(&self) -> Option<RequestId> {
        match self.next_id.get() {
            0 | 1 => None,
            next => Some(RequestId::new(next - 1)),
        }
    }

    /// Returns `true` while the underlying connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Closes the underlying connection. Idempotent.
    ///
    /// # Errors
    ///
    /// See [`Connection::close`].
    pub async fn close(&mut self) -> Result<()> {
        self.connection.close().await
    }

    /// Calls `method` with the default 30s timeout.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::call`].
    pub async fn request(&mut self, method: &str, params: Option<Vec<Value>>) -> Result<Value> {
        self.call(method, params, DEFAULT_CALL_TIMEOUT).await
    }

    /// Issues one call and waits for its reply.
    ///
    /// Every call that reaches the wire consumes exactly one id, whether it
    /// succeeds or not. Argument and connection checks happen first and
    /// consume nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `method` is empty or the timeout is zero
    /// - [`Error::NotConnected`] if the connection is closed
    /// - [`Error::Protocol`] if a previous call was abandoned mid-wait, or
    ///   the reply frame is not a JSON text object
    /// - [`Error::IdMismatch`] if the reply answers another id
    /// - [`Error::Remote`] if the server returned an error
    /// - [`Error::RequestTimeout`] if no reply arrived in time
    pub async fn call(
        &mut self,
        method: &str,
        params: Option<Vec<Value>>,
        call_timeout: Duration,
    ) -> Result<Value> {
        if method.is_empty() {
            return Err(Error::invalid_argument("RPC method must not be empty"));
        }
        if call_timeout.is_zero() {
            return Err(Error::invalid_argument("RPC call timeout must be positive"));
        }
        if !self.connection.is_open() {
            return Err(Error::NotConnected);
        }
        if let Some(stale) = self.awaiting {
            return Err(Error::protocol(format!(
                "Request {stale} was abandoned while awaiting its reply; connection is unreliable"
            )));
        }

        let id = self.issue_id();
        self.awaiting = Some(id);
        let outcome = self.exchange(id, method, params, call_timeout).await;
        self.awaiting = None;

        outcome
    }

    /// Consumes the next id.
    fn issue_id(&mut self) -> RequestId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Writes the request and reads exactly one reply.
    async fn exchange(
        &mut self,
        id: RequestId,
        method: &str,
        params: Option<Vec<Value>>,
        call_timeout: Duration,
    ) -> Result<Value> {
        let text = Request::new(id, method, params).to_text()?;
        self.connection.send_text(text).await?;
        trace!(%id, method, "Request sent");

        let reply = match timeout(call_timeout, self.next_text(method)).await {
            Ok(reply) => reply?,
            Err(_) => {
                warn!(%id, method, "RPC call timed out");
                return Err(Error::request_timeout(
                    method,
                    id,
                    call_timeout.as_millis() as u64,
                ));
            }
        };

        let response = Response::parse(&reply)?;
        if !response.answers(id) {
            warn!(expected = %id, received = %response.id, method, "Mismatched response id");
            return Err(Error::id_mismatch(method, id, response.id));
        }

        debug!(%id, method, error = response.is_error(), "Response received");
        response.into_result(method)
    }

    /// Waits for the next text frame, skipping ping/pong keepalives.
    ///
    /// A socket that goes away mid-wait, with or without a close frame, is
    /// a protocol error.
    async fn next_text(&mut self, method: &str) -> Result<String> {
        loop {
            let frame = match self.connection.recv().await {
                Ok(frame) => frame,
                Err(Error::WebSocket(
                    e @ (WsError::ConnectionClosed
                    | WsError::AlreadyClosed
                    | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)),
                )) => {
                    return Err(Error::protocol(format!(
                        "Connection ended while awaiting {method}: {e}"
                    )));
                }
                Err(e) => return Err(e),
            };

            match frame {
                Some(Message::Text(text)) => return Ok(text.as_str().to_owned()),

                Some(Message::Ping(_) | Message::Pong(_)) => {
                    trace!(method, "Skipping keepalive frame");
                }

                Some(Message::Close(frame)) => {
                    return Err(Error::protocol(format!(
                        "Connection closed by server while awaiting {method}: {frame:?}"
                    )));
                }

                Some(Message::Binary(data)) => {
                    return Err(Error::protocol(format!(
                        "Unexpected binary frame ({} bytes) while awaiting {method}",
                        data.len()
                    )));
                }

                Some(Message::Frame(_)) => {
                    return Err(Error::protocol(format!(
                        "Unexpected raw frame while awaiting {method}"
                    )));
                }

                None => {
                    return Err(Error::protocol(format!(
                        "Connection ended while awaiting {method}"
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl RpcCaller for RpcClient {
    async fn call(
        &mut self,
        method: &str,
        params: Option<Vec<Value>>,
        call_timeout: Duration,
    ) -> Result<Value> {
        RpcClient::call(self, method, params, call_timeout).await
    }
}

// ============================================================================
// Tests
// ============================================================================
