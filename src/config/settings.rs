//! Validated session settings.
//!
//! Values here have already passed [`SessionConfigBuilder`] validation:
//! paths exist and are absolute, timeouts are non-zero.
//!
//! [`SessionConfigBuilder`]: super::SessionConfigBuilder

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::downloader::{DataLayout, RepoSource};
use crate::identifiers::CogName;
use crate::transport::ReadinessPoller;

use super::SessionConfigBuilder;

// ============================================================================
// Constants
// ============================================================================

/// Default RPC host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default RPC port of the bot.
pub const DEFAULT_RPC_PORT: u16 = 6133;

/// Default name the repository is registered under.
pub const DEFAULT_REPO_NAME: &str = "test-repo";

// ============================================================================
// CogSource
// ============================================================================

/// Where the cogs under test come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CogSource {
    /// Cogs already installed where the bot can load them.
    Paths(Vec<PathBuf>),

    /// Cogs installed from a repository before the run.
    Repository(RepositorySettings),
}

impl CogSource {
    /// Returns `true` for repository mode.
    #[inline]
    #[must_use]
    pub fn is_repository(&self) -> bool {
        matches!(self, Self::Repository(_))
    }
}

// ============================================================================
// RepositorySettings
// ============================================================================

/// Repository mode settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    /// Name the repository is registered under.
    pub name: String,

    /// Clone source.
    pub source: RepoSource,

    /// Branch to check out, if not the default.
    pub branch: Option<String>,

    /// Cogs to exercise. `None` exercises every available cog.
    pub cogs: Option<Vec<CogName>>,

    /// Bot data directory.
    pub data_path: PathBuf,

    /// Install directory override.
    pub install_path: Option<PathBuf>,

    /// Interpreter used for requirement installs.
    pub python: String,
}

impl RepositorySettings {
    /// Returns the data layout rooted at [`RepositorySettings::data_path`].
    #[inline]
    #[must_use]
    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_path)
    }

    /// Returns the install directory, defaulting to the layout's.
    #[must_use]
    pub fn install_path(&self) -> PathBuf {
        self.install_path
            .clone()
            .unwrap_or_else(|| self.layout().install_path())
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Everything a [`Session`](crate::Session) needs.
///
/// # Example
///
/// ```no_run
/// use cog_rpc_check::SessionConfig;
///
/// # fn example() -> cog_rpc_check::Result<()> {
/// let config = SessionConfig::builder()
///     .port(6133)
///     .cog_path("/data/cogs/CogManager/cogs/mycog")
///     .build()?;
///
/// assert_eq!(config.rpc_url(), "ws://127.0.0.1:6133/");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub(super) host: String,
    pub(super) port: u16,
    pub(super) handshake_timeout: Duration,
    pub(super) call_timeout: Duration,
    pub(super) readiness: ReadinessPoller,
    pub(super) source: CogSource,
}

impl SessionConfig {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Format: `ws://{host}:{port}/`
    #[must_use]
    pub fn rpc_url(&self) -> String {
        format!("ws://{}:{}/", self.host, self.port)
    }

    /// Returns the RPC host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the RPC port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the handshake timeout for the exercising connection.
    #[inline]
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    /// Returns the per-call timeout.
    #[inline]
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Returns the readiness poller settings.
    #[inline]
    #[must_use]
    pub const fn readiness(&self) -> &ReadinessPoller {
        &self.readiness
    }

    /// Returns the cog source.
    #[inline]
    #[must_use]
    pub const fn source(&self) -> &CogSource {
        &self.source
    }
}

/// Expands a leading `~` to the home directory.
pub(super) fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(install_path: Option<PathBuf>) -> RepositorySettings {
        RepositorySettings {
            name: DEFAULT_REPO_NAME.to_string(),
            source: RepoSource::remote("https://example.com/cogs.git"),
            branch: None,
            cogs: None,
            data_path: PathBuf::from("/data"),
            install_path,
            python: "python3".to_string(),
        }
    }

    #[test]
    fn test_install_path_defaults_to_layout() {
        assert_eq!(
            repository(None).install_path(),
            PathBuf::from("/data/cogs/CogManager/cogs")
        );
        assert_eq!(
            repository(Some(PathBuf::from("/elsewhere"))).install_path(),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/cog")), PathBuf::from("/abs/cog"));
        assert_eq!(expand_home(Path::new("rel/cog")), PathBuf::from("rel/cog"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/cogs")), home.join("cogs"));
        }
    }

    #[test]
    fn test_cog_source_mode() {
        assert!(!CogSource::Paths(vec![]).is_repository());
        assert!(CogSource::Repository(repository(None)).is_repository());
    }
}
