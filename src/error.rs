//! Error types for cog RPC checks.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use cog_rpc_check::{Result, RpcClient};
//!
//! async fn example(client: &mut RpcClient) -> Result<()> {
//!     let result = client.request("CORE__LOAD", Some(vec![json!(["alpha"])])).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`], [`Error::InvalidUrl`] |
//! | Connection | [`Error::Connect`], [`Error::NotConnected`], [`Error::ReadinessTimeout`] |
//! | Protocol | [`Error::Protocol`], [`Error::IdMismatch`] |
//! | Call | [`Error::RequestTimeout`], [`Error::Remote`] |
//! | Validation | [`Error::LoadNotConfirmed`], [`Error::LoadReportedFailures`], [`Error::UnloadNotConfirmed`] |
//! | Repository | [`Error::Repository`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{CogName, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant carries enough context (method, ids, cog name, raw remote
/// payload) to diagnose a failed run without re-running it.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Endpoint URL is malformed or uses an unsupported scheme.
    ///
    /// Never retried by the readiness poller.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why the URL was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket handshake or network failure, including handshake timeout.
    #[error("Failed to connect to {url}: {message}")]
    Connect {
        /// Endpoint that was dialled.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// Call issued outside the connection lifetime.
    #[error("WebSocket connection has not been established or was already closed")]
    NotConnected,

    /// Endpoint never accepted a handshake within the overall deadline.
    #[error("Timed out waiting for RPC endpoint at {url} after {attempts} attempt(s) ({elapsed_ms}ms): {last_error}")]
    ReadinessTimeout {
        /// Endpoint that was polled.
        url: String,
        /// Number of probes attempted.
        attempts: u32,
        /// Wall-clock milliseconds spent polling.
        elapsed_ms: u64,
        /// Rendered error of the final probe.
        last_error: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed frame, unexpected message type, or malformed payload.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Response id does not match the request that was just sent.
    ///
    /// No resynchronization is attempted; the connection is unreliable
    /// afterwards and should be discarded.
    #[error("Mismatched RPC response id for {method}. Expected {expected}, got {received}")]
    IdMismatch {
        /// Method of the request that was awaiting a reply.
        method: String,
        /// Id that was sent.
        expected: RequestId,
        /// Raw id value found in the reply.
        received: Value,
    },

    // ========================================================================
    // Call Errors
    // ========================================================================
    /// No reply arrived within the call deadline.
    #[error("Timed out waiting for RPC response to {method} (request {request_id}) after {timeout_ms}ms")]
    RequestTimeout {
        /// Method that timed out.
        method: String,
        /// Id that was consumed by the call.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Server answered with an `error` member.
    #[error("RPC call {method} failed: {payload}")]
    Remote {
        /// Method that failed.
        method: String,
        /// Server-supplied error payload, verbatim.
        payload: Value,
    },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Load result did not list the cog in `loaded_packages`.
    #[error("RPC did not report {cog} in loaded_packages: {result}")]
    LoadNotConfirmed {
        /// Cog being loaded.
        cog: CogName,
        /// Raw result returned by the server.
        result: Value,
    },

    /// Load result listed entries in `failed_packages`.
    #[error("RPC reported failed packages while loading {cog}: {failed:?}")]
    LoadReportedFailures {
        /// Cog being loaded.
        cog: CogName,
        /// Names the server reported as failed.
        failed: Vec<String>,
    },

    /// Unload result did not list the cog in `unloaded_packages`.
    #[error("RPC did not report {cog} in unloaded_packages: {result}")]
    UnloadNotConfirmed {
        /// Cog being unloaded.
        cog: CogName,
        /// Raw result returned by the server.
        result: Value,
    },

    // ========================================================================
    // Repository Errors
    // ========================================================================
    /// Cog repository could not be added, read, installed from, or removed.
    #[error("Repository error: {message}")]
    Repository {
        /// Description of the repository failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a connect error.
    #[inline]
    pub fn connect(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a readiness timeout error.
    #[inline]
    pub fn readiness_timeout(
        url: impl Into<String>,
        attempts: u32,
        elapsed_ms: u64,
        last_error: impl Into<String>,
    ) -> Self {
        Self::ReadinessTimeout {
            url: url.into(),
            attempts,
            elapsed_ms,
            last_error: last_error.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an id mismatch error.
    #[inline]
    pub fn id_mismatch(method: impl Into<String>, expected: RequestId, received: Value) -> Self {
        Self::IdMismatch {
            method: method.into(),
            expected,
            received,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(method: impl Into<String>, request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            method: method.into(),
            request_id,
            timeout_ms,
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(method: impl Into<String>, payload: Value) -> Self {
        Self::Remote {
            method: method.into(),
            payload,
        }
    }

    /// Creates a load-not-confirmed error.
    #[inline]
    pub fn load_not_confirmed(cog: CogName, result: Value) -> Self {
        Self::LoadNotConfirmed { cog, result }
    }

    /// Creates a load-reported-failures error.
    #[inline]
    pub fn load_reported_failures(cog: CogName, failed: Vec<String>) -> Self {
        Self::LoadReportedFailures { cog, failed }
    }

    /// Creates an unload-not-confirmed error.
    #[inline]
    pub fn unload_not_confirmed(cog: CogName, result: Value) -> Self {
        Self::UnloadNotConfirmed { cog, result }
    }

    /// Creates a repository error.
    #[inline]
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::RequestTimeout { .. } | Self::ReadinessTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::NotConnected | Self::ReadinessTimeout { .. } | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the reply violated the wire protocol.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::IdMismatch { .. })
    }

    /// Returns `true` if the server answered but did not confirm the
    /// requested state transition.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::LoadNotConfirmed { .. }
                | Self::LoadReportedFailures { .. }
                | Self::UnloadNotConfirmed { .. }
        )
    }

    /// Returns `true` if a readiness probe may retry after this error.
    ///
    /// Only connect-phase failures qualify; malformed URLs and every
    /// application-level failure surface immediately.
    #[inline]
    #[must_use]
    pub fn is_retryable_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    use serde_json::json;

    fn cog(name: &str) -> CogName {
        CogName::new(name).expect("valid cog name")
    }

    #[test]
    fn test_connect_display() {
        let err = Error::connect("ws://127.0.0.1:6133/", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to connect to ws://127.0.0.1:6133/: connection refused"
        );
    }

    #[test]
    fn test_id_mismatch_cites_both_ids() {
        let err = Error::id_mismatch("CORE__LOAD", RequestId::new(2), json!(5));
        let text = err.to_string();
        assert!(text.contains("Expected 2"));
        assert!(text.contains("got 5"));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_request_timeout_names_method() {
        let err = Error::request_timeout("CORE__UNLOAD", RequestId::new(3), 100);
        assert!(err.to_string().contains("CORE__UNLOAD"));
        assert!(err.is_timeout());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_remote_keeps_payload_verbatim() {
        let payload = json!({"code": -32601, "message": "Method not found"});
        let err = Error::remote("CORE__LOAD", payload.clone());
        match err {
            Error::Remote { payload: kept, .. } => assert_eq!(kept, payload),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_reported_failures_display() {
        let err = Error::load_reported_failures(cog("alpha"), vec!["alpha".into()]);
        assert_eq!(
            err.to_string(),
            "RPC reported failed packages while loading alpha: [\"alpha\"]"
        );
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_is_retryable_connect() {
        assert!(Error::connect("ws://x/", "refused").is_retryable_connect());
        assert!(!Error::invalid_url("nope", "relative URL").is_retryable_connect());
        assert!(!Error::NotConnected.is_retryable_connect());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::readiness_timeout("ws://x/", 3, 30_000, "refused").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
