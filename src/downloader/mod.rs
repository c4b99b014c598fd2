//! Plugin-repository collaborator.
//!
//! Resolves a cog repository (git clone), lists the cogs it offers, copies
//! them into the bot's cog directory, and installs their pip requirements.
//! The RPC core only uses this to obtain the names to exercise and to make
//! sure their files exist before `CORE__LOAD` is issued.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `manager` | [`RepoManager`], [`DataLayout`], cleanup |
//! | `repo` | [`Repo`], [`CogRepository`], `info.json` parsing |
//! | `source` | [`RepoSource`] |

// ============================================================================
// Submodules
// ============================================================================

/// Repository registration and data layout.
pub mod manager;

/// Cloned repositories and their cogs.
pub mod repo;

/// Repository source locations.
pub mod source;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::{DEFAULT_PYTHON, DataLayout, RepoManager, cleanup_installed_cogs};
pub use repo::{AvailableCog, CogInfo, CogRepository, InstallableType, Repo};
pub use source::RepoSource;
