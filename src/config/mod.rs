//! Session configuration.
//!
//! Use [`SessionConfig::builder()`] to collect and validate settings.
//!
//! # Modes
//!
//! | Mode | Selected by | Cogs exercised |
//! |------|-------------|----------------|
//! | Paths | default | The given, already installed cog directories |
//! | Repository | repo URL or path | Cogs installed from the repository |

// ============================================================================
// Submodules
// ============================================================================

/// Configuration builder.
pub mod builder;

/// Validated settings.
pub mod settings;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionConfigBuilder;
pub use settings::{
    CogSource, DEFAULT_HOST, DEFAULT_REPO_NAME, DEFAULT_RPC_PORT, RepositorySettings,
    SessionConfig,
};
