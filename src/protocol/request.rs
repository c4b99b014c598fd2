//! Request and Response message types.
//!
//! Defines the JSON-RPC 2.0 envelopes exchanged with the bot's RPC
//! endpoint. One request is answered by exactly one response carrying the
//! same `id`.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// Constants
// ============================================================================

/// Protocol version tag sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// Request
// ============================================================================

/// A JSON-RPC call from this client to the bot.
///
/// # Format
///
/// ```json
/// {
///   "jsonrpc": "2.0",
///   "id": 1,
///   "method": "CORE__LOAD",
///   "params": [["alpha"]]
/// }
/// ```
///
/// `params` is omitted entirely when absent.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Protocol version, always [`JSONRPC_VERSION`].
    pub jsonrpc: &'static str,

    /// Correlation id assigned by the client.
    pub id: RequestId,

    /// Remote method name.
    pub method: String,

    /// Positional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Vec<Value>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }

    /// Serializes the request into a single text frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if a parameter cannot be serialized.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Response
// ============================================================================

/// A reply from the bot.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 1, "result": { "loaded_packages": ["alpha"], "failed_packages": [] } }
/// ```
///
/// Error:
/// ```json
/// { "id": 1, "error": { "code": -32601, "message": "Method not found" } }
/// ```
///
/// The raw `id` is kept as-is so that a mismatch can be reported exactly as
/// the server sent it, including a missing or non-integer id.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Raw `id` member (`Null` when missing).
    pub id: Value,

    /// `result` member, if present.
    pub result: Option<Value>,

    /// `error` member, if present. A present `null` is still an error.
    pub error: Option<Value>,
}

impl Response {
    /// Parses a text frame into a response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the text is not JSON or not a JSON
    /// object.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            Error::protocol(format!("Invalid JSON payload from RPC server ({e}): {text}"))
        })?;

        match value {
            Value::Object(members) => Ok(Self::from_members(members)),
            other => Err(Error::protocol(format!(
                "RPC payload is not a JSON object: {other}"
            ))),
        }
    }

    fn from_members(mut members: Map<String, Value>) -> Self {
        Self {
            id: members.remove("id").unwrap_or(Value::Null),
            result: members.remove("result"),
            error: members.remove("error"),
        }
    }

    /// Returns `true` if the response answers `id`.
    #[inline]
    #[must_use]
    pub fn answers(&self, id: RequestId) -> bool {
        self.id.as_u64() == Some(id.get())
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning an error if the server sent one.
    ///
    /// A missing result becomes `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] carrying the error payload verbatim.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.error {
            Some(payload) => Err(Error::remote(method, payload)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(RequestId::new(1), "CORE__LOAD", Some(vec![json!(["alpha"])]));
        let value: Value = serde_json::from_str(&request.to_text().expect("serialize")).expect("json");

        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 1, "method": "CORE__LOAD", "params": [["alpha"]]})
        );
    }

    #[test]
    fn test_request_without_params_omits_member() {
        let request = Request::new(RequestId::new(4), "GET_METHODS", None);
        let text = request.to_text().expect("serialize");

        assert!(!text.contains("params"));
        assert!(text.contains("\"id\":4"));
    }

    #[test]
    fn test_success_response() {
        let response =
            Response::parse(r#"{"id": 1, "result": {"loaded_packages": ["alpha"]}}"#).expect("parse");

        assert!(response.answers(RequestId::new(1)));
        assert!(!response.is_error());
        let result = response.into_result("CORE__LOAD").expect("should succeed");
        assert_eq!(result["loaded_packages"], json!(["alpha"]));
    }

    #[test]
    fn test_error_wins_over_result() {
        let response = Response::parse(r#"{"id": 1, "result": 3, "error": {"code": -1}}"#)
            .expect("parse");

        match response.into_result("CORE__LOAD") {
            Err(Error::Remote { method, payload }) => {
                assert_eq!(method, "CORE__LOAD");
                assert_eq!(payload, json!({"code": -1}));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_null_error_is_still_error() {
        let response = Response::parse(r#"{"id": 1, "error": null}"#).expect("parse");
        assert!(response.is_error());
    }

    #[test]
    fn test_missing_result_is_null() {
        let response = Response::parse(r#"{"id": 9}"#).expect("parse");
        assert_eq!(response.into_result("X").expect("ok"), Value::Null);
    }

    #[test]
    fn test_answers_rejects_other_ids() {
        let response = Response::parse(r#"{"id": 5, "result": null}"#).expect("parse");
        assert!(!response.answers(RequestId::new(2)));

        let stringly = Response::parse(r#"{"id": "2", "result": null}"#).expect("parse");
        assert!(!stringly.answers(RequestId::new(2)));

        let missing = Response::parse(r#"{"result": null}"#).expect("parse");
        assert_eq!(missing.id, Value::Null);
        assert!(!missing.answers(RequestId::new(1)));
    }

    #[test]
    fn test_malformed_payloads_are_protocol_errors() {
        assert!(matches!(Response::parse("not json"), Err(Error::Protocol { .. })));
        assert!(matches!(Response::parse("[1, 2]"), Err(Error::Protocol { .. })));
    }
}
