//! Session configuration builder.
//!
//! Collects raw values (typically from CLI flags or environment variables)
//! and validates them into a [`SessionConfig`].
//!
//! Setting either [`SessionConfigBuilder::repo_url`] or
//! [`SessionConfigBuilder::repo_path`] selects repository mode; otherwise
//! the cog paths are exercised directly. Blank strings count as unset.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::downloader::{DEFAULT_PYTHON, RepoSource};
use crate::error::{Error, Result};
use crate::identifiers::CogName;
use crate::transport::{DEFAULT_CALL_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT, ReadinessPoller};

use super::settings::{
    CogSource, DEFAULT_HOST, DEFAULT_REPO_NAME, DEFAULT_RPC_PORT, RepositorySettings,
    SessionConfig, expand_home,
};

// ============================================================================
// SessionConfigBuilder
// ============================================================================

/// Builder for [`SessionConfig`].
#[derive(Debug, Default, Clone)]
pub struct SessionConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    handshake_timeout: Option<Duration>,
    call_timeout: Option<Duration>,
    readiness: Option<ReadinessPoller>,
    cog_paths: Vec<PathBuf>,
    repo_name: Option<String>,
    repo_url: Option<String>,
    repo_path: Option<PathBuf>,
    repo_branch: Option<String>,
    data_path: Option<PathBuf>,
    install_path: Option<PathBuf>,
    python: Option<String>,
}

// ============================================================================
// SessionConfigBuilder - Setters
// ============================================================================

impl SessionConfigBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the RPC host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the RPC port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the handshake timeout for the exercising connection.
    #[inline]
    #[must_use]
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Sets the per-call timeout.
    #[inline]
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Sets the readiness poller.
    #[inline]
    #[must_use]
    pub fn readiness(mut self, poller: ReadinessPoller) -> Self {
        self.readiness = Some(poller);
        self
    }

    /// Adds one cog path.
    #[inline]
    #[must_use]
    pub fn cog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cog_paths.push(path.into());
        self
    }

    /// Adds several cog paths.
    #[must_use]
    pub fn cog_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.cog_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Sets the repository name.
    #[inline]
    #[must_use]
    pub fn repo_name(mut self, name: impl Into<String>) -> Self {
        self.repo_name = Some(name.into());
        self
    }

    /// Sets a remote repository URL. Takes precedence over a local path.
    #[inline]
    #[must_use]
    pub fn repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    /// Sets a local repository checkout.
    #[inline]
    #[must_use]
    pub fn repo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_path = Some(path.into());
        self
    }

    /// Sets the branch to clone.
    #[inline]
    #[must_use]
    pub fn repo_branch(mut self, branch: impl Into<String>) -> Self {
        self.repo_branch = Some(branch.into());
        self
    }

    /// Sets the bot data directory.
    #[inline]
    #[must_use]
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Overrides the cog install directory.
    #[inline]
    #[must_use]
    pub fn install_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.install_path = Some(path.into());
        self
    }

    /// Sets the interpreter used for requirement installs.
    #[inline]
    #[must_use]
    pub fn python(mut self, python: impl Into<String>) -> Self {
        self.python = Some(python.into());
        self
    }
}

// ============================================================================
// SessionConfigBuilder - Build
// ============================================================================

impl SessionConfigBuilder {
    /// Validates the collected values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - The port or any timeout is zero
    /// - Paths mode has no cog paths, or one does not exist
    /// - Repository mode has no data path, or a local repo path does not exist
    pub fn build(self) -> Result<SessionConfig> {
        let host = non_blank(self.host.as_deref()).unwrap_or(DEFAULT_HOST).to_string();
        let port = self.port.unwrap_or(DEFAULT_RPC_PORT);
        if port == 0 {
            return Err(Error::config("RPC port must be non-zero"));
        }

        let handshake_timeout = self.handshake_timeout.unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT);
        let call_timeout = self.call_timeout.unwrap_or(DEFAULT_CALL_TIMEOUT);
        if handshake_timeout.is_zero() || call_timeout.is_zero() {
            return Err(Error::config("Handshake and call timeouts must be non-zero"));
        }

        let readiness = self.readiness.unwrap_or_default();
        if readiness.per_attempt_timeout().is_zero() || readiness.overall_timeout().is_zero() {
            return Err(Error::config("Readiness timeouts must be non-zero"));
        }

        let source = self.validate_source()?;

        Ok(SessionConfig {
            host,
            port,
            handshake_timeout,
            call_timeout,
            readiness,
            source,
        })
    }

    /// Picks the mode and validates its inputs.
    fn validate_source(&self) -> Result<CogSource> {
        let repo_url = non_blank(self.repo_url.as_deref());
        let repo_path = self.repo_path.as_ref().filter(|p| !p.as_os_str().is_empty());

        let source = match (repo_url, repo_path) {
            (Some(url), _) => RepoSource::remote(url),
            (None, Some(path)) => RepoSource::local(resolve_existing(path, "Repository path")?),
            (None, None) => return self.validate_paths(),
        };

        let data_path = self
            .data_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| expand_home(p))
            .ok_or_else(|| {
                Error::config(
                    "Data path is required in repository mode.\n\
                     Set RED_DATA_PATH or pass --data-path.",
                )
            })?;

        let cogs = if self.usable_cog_paths().next().is_some() {
            let names = self
                .usable_cog_paths()
                .map(|p| CogName::from_path(p))
                .collect::<Result<Vec<_>>>()?;
            Some(names)
        } else {
            None
        };

        Ok(CogSource::Repository(RepositorySettings {
            name: non_blank(self.repo_name.as_deref())
                .unwrap_or(DEFAULT_REPO_NAME)
                .to_string(),
            source,
            branch: non_blank(self.repo_branch.as_deref()).map(str::to_owned),
            cogs,
            data_path,
            install_path: self
                .install_path
                .as_ref()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| expand_home(p)),
            python: non_blank(self.python.as_deref())
                .unwrap_or(DEFAULT_PYTHON)
                .to_string(),
        }))
    }

    /// Paths mode: every path must exist, and there must be at least one.
    fn validate_paths(&self) -> Result<CogSource> {
        let paths = self
            .usable_cog_paths()
            .map(|p| resolve_existing(p, "Cog path"))
            .collect::<Result<Vec<_>>>()?;

        if paths.is_empty() {
            return Err(Error::config(
                "No cog paths given.\n\
                 Set COG_PATHS to a comma-separated list of cog directories.",
            ));
        }

        Ok(CogSource::Paths(paths))
    }

    /// Cog paths with blank entries dropped.
    fn usable_cog_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.cog_paths
            .iter()
            .filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Trims `value`, treating blank as unset.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Expands `~` and canonicalizes a path that must exist.
fn resolve_existing(path: &Path, what: &str) -> Result<PathBuf> {
    let expanded = expand_home(path);
    fs::canonicalize(&expanded)
        .map_err(|e| Error::config(format!("{what} does not exist: {} ({e})", expanded.display())))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn cog_dir(root: &TempDir, name: &str) -> PathBuf {
        let path = root.path().join(name);
        fs::create_dir_all(&path).expect("mkdir");
        path
    }

    #[test]
    fn test_paths_mode_defaults() {
        let root = TempDir::new().expect("tempdir");
        let alpha = cog_dir(&root, "alpha");

        let config = SessionConfig::builder().cog_path(&alpha).build().expect("build");

        assert_eq!(config.rpc_url(), "ws://127.0.0.1:6133/");
        assert_eq!(config.handshake_timeout(), DEFAULT_HANDSHAKE_TIMEOUT);
        assert_eq!(config.call_timeout(), DEFAULT_CALL_TIMEOUT);
        assert_eq!(config.readiness(), &ReadinessPoller::default());
        match config.source() {
            CogSource::Paths(paths) => {
                assert_eq!(paths, &vec![fs::canonicalize(&alpha).expect("canonical")]);
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_blank_entries_are_skipped() {
        let root = TempDir::new().expect("tempdir");
        let alpha = cog_dir(&root, "alpha");

        let config = SessionConfig::builder()
            .cog_paths([PathBuf::from(""), alpha, PathBuf::from("  ")])
            .host("  ")
            .port(7000)
            .build()
            .expect("build");

        assert_eq!(config.rpc_url(), "ws://127.0.0.1:7000/");
        assert!(matches!(config.source(), CogSource::Paths(p) if p.len() == 1));
    }

    #[test]
    fn test_paths_mode_requires_paths() {
        let err = SessionConfig::builder().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("COG_PATHS"));
    }

    #[test]
    fn test_missing_cog_path_is_rejected() {
        let err = SessionConfig::builder()
            .cog_path("/nonexistent/cog")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cog"));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let root = TempDir::new().expect("tempdir");
        let alpha = cog_dir(&root, "alpha");

        assert!(SessionConfig::builder().cog_path(&alpha).port(0).build().is_err());
        assert!(
            SessionConfig::builder()
                .cog_path(&alpha)
                .call_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            SessionConfig::builder()
                .cog_path(&alpha)
                .readiness(ReadinessPoller::new().with_overall_timeout(Duration::ZERO))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_repository_mode_from_url() {
        let root = TempDir::new().expect("tempdir");

        let config = SessionConfig::builder()
            .repo_url("https://example.com/cogs.git")
            .repo_path("/ignored/when/url/is/set")
            .repo_branch(" ")
            .data_path(root.path())
            .cog_paths(["alpha", "beta"])
            .build()
            .expect("build");

        let CogSource::Repository(repo) = config.source() else {
            panic!("expected repository mode");
        };
        assert_eq!(repo.name, "test-repo");
        assert_eq!(repo.source, RepoSource::remote("https://example.com/cogs.git"));
        assert_eq!(repo.branch, None);
        assert_eq!(repo.python, "python3");
        assert_eq!(
            repo.cogs,
            Some(vec![
                CogName::new("alpha").expect("valid"),
                CogName::new("beta").expect("valid"),
            ])
        );
    }

    #[test]
    fn test_repository_mode_from_local_path() {
        let root = TempDir::new().expect("tempdir");
        let checkout = cog_dir(&root, "checkout");

        let config = SessionConfig::builder()
            .repo_path(&checkout)
            .repo_name("my-cogs")
            .data_path(root.path())
            .install_path(root.path().join("installed"))
            .python("/usr/bin/python3.11")
            .build()
            .expect("build");

        let CogSource::Repository(repo) = config.source() else {
            panic!("expected repository mode");
        };
        assert_eq!(
            repo.source,
            RepoSource::local(fs::canonicalize(&checkout).expect("canonical"))
        );
        assert_eq!(repo.name, "my-cogs");
        assert_eq!(repo.cogs, None);
        assert_eq!(repo.install_path(), root.path().join("installed"));
        assert_eq!(repo.python, "/usr/bin/python3.11");
    }

    #[test]
    fn test_repository_mode_requires_data_path() {
        let err = SessionConfig::builder()
            .repo_url("https://example.com/cogs.git")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("RED_DATA_PATH"));
    }

    #[test]
    fn test_repository_mode_rejects_missing_checkout() {
        let root = TempDir::new().expect("tempdir");
        let err = SessionConfig::builder()
            .repo_path("/nonexistent/checkout")
            .data_path(root.path())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = SessionConfigBuilder::new().port(7000);
        let cloned = builder.clone();
        assert_eq!(builder.port, cloned.port);
    }
}
