//! Cog RPC Check - verifies cog load/unload round trips over JSON-RPC.
//!
//! This library drives a running bot through its JSON-RPC websocket
//! endpoint and checks that each cog loads and unloads cleanly.
//!
//! # Architecture
//!
//! The check follows a strict client model:
//!
//! - **Client (Rust)**: Polls for readiness, opens one websocket, issues calls
//! - **Bot (RPC server)**: Answers `CORE__LOAD` / `CORE__UNLOAD` with reports
//!
//! Key design principles:
//!
//! - One connection per run, closed on every exit path
//! - One request in flight at a time; replies must echo the issued id
//! - The first failure aborts the run; there is no retry of calls
//!
//! # Quick Start
//!
//! ```no_run
//! use cog_rpc_check::{Result, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SessionConfig::builder()
//!         .port(6133)
//!         .cog_paths(["/data/cogs/CogManager/cogs/alpha"])
//!         .build()?;
//!
//!     for outcome in Session::new(config).run().await? {
//!         println!("{outcome}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Session configuration and validation |
//! | [`downloader`] | Cog repositories and the bot's data layout |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`exercise`] | Load→unload round trips |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | JSON-RPC message types |
//! | [`session`] | End-to-end check runs |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Session configuration.
///
/// Use [`SessionConfig::builder()`] to create a validated configuration.
pub mod config;

/// Cog repositories: cloning, listing, installing, cleanup.
pub mod downloader;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Load→unload round trips over any [`RpcCaller`].
pub mod exercise;

/// Type-safe identifiers for requests and cogs.
///
/// Newtype wrappers prevent mixing incompatible values at compile time.
pub mod identifiers;

/// JSON-RPC message types.
pub mod protocol;

/// End-to-end check runs.
pub mod session;

/// WebSocket transport layer.
///
/// Connection ownership, the JSON-RPC client, and readiness polling.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Config types
pub use config::{CogSource, RepositorySettings, SessionConfig, SessionConfigBuilder};

// Error types
pub use error::{Error, Result};

// Exercise types
pub use exercise::{CogOutcome, ExerciseProtocol};

// Identifier types
pub use identifiers::{CogName, RequestId};

// Session
pub use session::Session;

// Transport types
pub use transport::{Connection, Readiness, ReadinessPoller, RpcCaller, RpcClient};
