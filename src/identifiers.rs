//! Type-safe identifiers.
//!
//! Newtype wrappers keep correlation ids and cog names from being mixed
//! up with plain integers and strings.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// RequestId
// ============================================================================

/// JSON-RPC correlation id.
///
/// Ids are issued per connection starting at [`RequestId::FIRST`] and are
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// First id issued on a fresh connection.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the id following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CogName
// ============================================================================

/// Name of a cog as the bot knows it (the package directory name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CogName(String);

impl CogName {
    /// Creates a cog name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name is empty or contains a
    /// path separator.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_argument("cog name must not be empty"));
        }
        if name.contains(['/', '\\']) {
            return Err(Error::invalid_argument(format!(
                "cog name must not contain path separators: {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Derives the cog name from the final component of a cog directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the path has no final component.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "Could not derive cog name from {}",
                    path.display()
                ))
            })?;
        Self::new(name)
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CogName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CogName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CogName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<String> for CogName {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

// ============================================================================
// Tests
// ============================================================================
