//! Scripted in-process websocket server for tests.
//!
//! Binds to `localhost:0`, upgrades incoming TCP connections with
//! `accept_async`, and answers JSON-RPC requests from a closure.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// MockServer
// ============================================================================

/// A bound listener that has not accepted anything yet.
pub(crate) struct MockServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
}

impl MockServer {
    /// Binds to a random localhost port.
    pub(crate) async fn bind() -> Self {
        Self::bind_port(0).await
    }

    /// Binds to a specific localhost port.
    pub(crate) async fn bind_port(port: u16) -> Self {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let listener = TcpListener::bind(addr).await.expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();
        Self { listener, port }
    }

    /// Returns the port the server is bound to.
    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Format: `ws://127.0.0.1:{port}/`
    pub(crate) fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/", self.port)
    }

    /// Answers each request with at most one frame.
    ///
    /// Resolves to every request received once the serving client goes away.
    pub(crate) fn respond<F>(self, mut reply: F) -> JoinHandle<Vec<Value>>
    where
        F: FnMut(&Value) -> Option<Message> + Send + 'static,
    {
        self.respond_with_frames(move |request| reply(request).into_iter().collect())
    }

    /// Answers each request with a list of frames.
    ///
    /// Connections that close without sending a request (readiness probes)
    /// are skipped; the first client that sends anything is served until it
    /// goes away.
    pub(crate) fn respond_with_frames<F>(self, mut reply: F) -> JoinHandle<Vec<Value>>
    where
        F: FnMut(&Value) -> Vec<Message> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut seen = Vec::new();

            while seen.is_empty() {
                let (stream, _) = self.listener.accept().await.expect("accept");
                let Ok(mut ws) = accept_async(stream).await else {
                    continue;
                };

                'serve: while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(text) = message else {
                        continue;
                    };
                    let request: Value = serde_json::from_str(&text).expect("request is JSON");
                    let frames = reply(&request);
                    seen.push(request);

                    for frame in frames {
                        if ws.send(frame).await.is_err() {
                            break 'serve;
                        }
                    }
                }
            }

            seen
        })
    }

    /// Reads one request, then drops the TCP stream without a close frame.
    pub(crate) fn drop_after_request(self) -> JoinHandle<Value> {
        tokio::spawn(async move {
            let (stream, _) = self.listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");

            loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let request = serde_json::from_str(&text).expect("request is JSON");
                        drop(ws);
                        return request;
                    }
                    Some(Ok(_)) => {}
                    other => panic!("client went away before sending a request: {other:?}"),
                }
            }
        })
    }

    /// Completes every handshake it receives and then drops the socket.
    pub(crate) fn accept_forever(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Ok((stream, _)) = self.listener.accept().await {
                tokio::spawn(async move {
                    if let Ok(mut ws) = accept_async(stream).await {
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                });
            }
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Success reply echoing the request id.
pub(crate) fn reply_result(request: &Value, result: Value) -> Message {
    Message::Text(json!({"id": request["id"], "result": result}).to_string().into())
}

/// Error reply echoing the request id.
pub(crate) fn reply_error(request: &Value, error: Value) -> Message {
    Message::Text(json!({"id": request["id"], "error": error}).to_string().into())
}

/// Returns a localhost port with nothing listening on it.
pub(crate) async fn closed_port() -> u16 {
    let server = MockServer::bind().await;
    let port = server.port();
    drop(server);
    port
}
