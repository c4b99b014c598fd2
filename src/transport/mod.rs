//! WebSocket transport layer.
//!
//! This module handles communication between this client (Rust) and the
//! bot's JSON-RPC endpoint over one websocket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  cog-rpc-check   │                              │  Bot process    │
//! │                  │         WebSocket            │                 │
//! │  ReadinessPoller │─── probe (connect+close) ───►│  RPC server     │
//! │  RpcClient       │◄──── request / response ────►│  ws://host:port/│
//! │  → Connection    │                              │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ReadinessPoller::wait_until_ready` - Poll until handshakes succeed
//! 2. `RpcClient::connect` - Open the one connection used for all calls
//! 3. `RpcClient::call` - Sequential calls, one in flight at a time
//! 4. `RpcClient::close` - Close on every exit path (`RpcClient::scoped`)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | JSON-RPC client and the `RpcCaller` seam |
//! | `connection` | Scoped websocket ownership |
//! | `readiness` | Endpoint readiness polling |

// ============================================================================
// Submodules
// ============================================================================

/// JSON-RPC client over one connection.
pub mod client;

/// WebSocket connection ownership.
pub mod connection;

/// Endpoint readiness polling.
pub mod readiness;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{DEFAULT_CALL_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT, RpcCaller, RpcClient};
pub use connection::Connection;
pub use readiness::{Readiness, ReadinessPoller, wait_until_ready};
