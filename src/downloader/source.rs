//! Where a cog repository is cloned from.
//!
//! | Format | Description |
//! |--------|-------------|
//! | Remote | Git URL (`https://…`, `git@…`, `ssh://…`) |
//! | Local | Directory holding a git checkout |
//!
//! # Example
//!
//! ```
//! use cog_rpc_check::downloader::RepoSource;
//!
//! let remote = RepoSource::remote("https://github.com/example/cogs");
//! let local = RepoSource::local("./cogs");
//! assert!(remote.is_remote());
//! assert!(!local.is_remote());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

// ============================================================================
// RepoSource
// ============================================================================

/// Source location for a cog repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepoSource {
    /// Remote git URL.
    Remote(String),

    /// Local checkout.
    Local(PathBuf),
}

// ============================================================================
// RepoSource - Constructors
// ============================================================================

impl RepoSource {
    /// Creates a remote source.
    #[inline]
    #[must_use]
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote(url.into())
    }

    /// Creates a local source.
    #[inline]
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local(path.into())
    }
}

// ============================================================================
// RepoSource - Accessors
// ============================================================================

impl RepoSource {
    /// Returns `true` for a remote URL.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns the argument handed to `git clone`.
    #[must_use]
    pub fn clone_target(&self) -> String {
        match self {
            Self::Remote(url) => url.clone(),
            Self::Local(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for RepoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clone_target())
    }
}

// ============================================================================
// Tests
// ============================================================================
