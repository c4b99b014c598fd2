//! JSON-RPC protocol message types.
//!
//! This module defines the message format for communication between this
//! client and the bot's RPC server.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Bot | Method call with correlation id |
//! | `Response` | Bot → Client | `result` or `error` for that id |
//!
//! Every message is one websocket text frame. Calls are never pipelined.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `method` | `CORE__LOAD` / `CORE__UNLOAD` and their result reports |
//! | `request` | Request and Response envelopes |

// ============================================================================
// Submodules
// ============================================================================

/// Cog-management methods and result reports.
pub mod method;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use method::{CogMethod, LoadReport, UnloadReport};
pub use request::{JSONRPC_VERSION, Request, Response};
