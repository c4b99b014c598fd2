//! Repository registration and the bot's on-disk data layout.
//!
//! # Layout
//!
//! | Path | Purpose |
//! |------|---------|
//! | `<data>/cogs/RepoManager/repos/<repo>` | Cloned repositories |
//! | `<data>/cogs/CogManager/cogs/<cog>` | Installed cogs the bot loads |
//! | `<data>/cogs/Downloader/lib` | Pip target for cog requirements |

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::identifiers::CogName;

use super::RepoSource;
use super::repo::{Repo, remove_path};

// ============================================================================
// Constants
// ============================================================================

/// ASCII identifier: repository names and cog package names.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Python reserved words, which cannot be imported as packages.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Interpreter used for pip when none is configured.
pub const DEFAULT_PYTHON: &str = "python3";

/// Returns `true` if `name` can be imported as a top-level Python package.
#[must_use]
pub fn is_package_name(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !PYTHON_KEYWORDS.contains(&name)
}

// ============================================================================
// DataLayout
// ============================================================================

/// Directories under the bot's data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    /// Root data directory.
    data_path: PathBuf,
}

impl DataLayout {
    /// Creates a layout rooted at `data_path`.
    #[inline]
    #[must_use]
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }

    /// Returns the root data directory.
    #[inline]
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Where repositories are cloned.
    #[must_use]
    pub fn repos_folder(&self) -> PathBuf {
        self.data_path.join("cogs").join("RepoManager").join("repos")
    }

    /// Where installed cogs live.
    #[must_use]
    pub fn install_path(&self) -> PathBuf {
        self.data_path.join("cogs").join("CogManager").join("cogs")
    }

    /// Pip target for cog requirements.
    #[must_use]
    pub fn lib_path(&self) -> PathBuf {
        self.data_path.join("cogs").join("Downloader").join("lib")
    }

    /// Creates the requirements directory with its `cog_shared` package.
    ///
    /// Returns the requirements directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directories cannot be created.
    pub fn ensure_lib_paths(&self) -> Result<PathBuf> {
        let base = self.lib_path();
        let shared = base.join("cog_shared");
        fs::create_dir_all(&shared)?;

        let init = shared.join("__init__.py");
        if !init.exists() {
            fs::write(&init, "")?;
        }

        Ok(base)
    }
}

/// Removes each installed cog directory, logging what goes.
///
/// Best effort: failures are logged and the remaining cogs are still
/// removed.
pub fn cleanup_installed_cogs(install_path: &Path, names: &[CogName]) {
    for name in names {
        let target = install_path.join(name.as_str());
        if !target.exists() {
            continue;
        }

        info!("🧽 Removing installed cog {name} from {}", target.display());
        if let Err(e) = remove_path(&target) {
            warn!(cog = %name, error = %e, "Failed to remove installed cog");
        }
    }
}

// ============================================================================
// RepoManager
// ============================================================================

/// Adds, opens, and deletes cloned repositories.
#[derive(Debug, Clone)]
pub struct RepoManager {
    /// Directory holding one checkout per repository.
    repos_folder: PathBuf,
    /// Interpreter handed to each [`Repo`] for pip.
    python: String,
}

impl RepoManager {
    /// Creates a manager for `layout`, creating the repos folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the repos folder cannot be created.
    pub fn new(layout: &DataLayout) -> Result<Self> {
        let repos_folder = layout.repos_folder();
        fs::create_dir_all(&repos_folder)?;

        Ok(Self {
            repos_folder,
            python: DEFAULT_PYTHON.to_string(),
        })
    }

    /// Sets the interpreter used for requirement installs.
    #[inline]
    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Returns the repos folder.
    #[inline]
    #[must_use]
    pub fn repos_folder(&self) -> &Path {
        &self.repos_folder
    }

    /// Replaces `-` with `_`, requires an identifier, and lowercases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Repository`] if the result is not an identifier.
    pub fn normalize_repo_name(name: &str) -> Result<String> {
        let sanitized = name.trim().replace('-', "_");

        if !IDENTIFIER.is_match(&sanitized) {
            return Err(Error::repository(format!("Invalid downloader repo name: {name}")));
        }

        Ok(sanitized.to_lowercase())
    }

    /// Returns `true` if a checkout named `name` exists.
    #[must_use]
    pub fn does_repo_exist(&self, name: &str) -> bool {
        self.repos_folder.join(name).is_dir()
    }

    /// Clones `source` as `name`, replacing any existing repo of that name.
    ///
    /// # Errors
    ///
    /// - [`Error::Repository`] if the name is invalid or `git clone` fails
    /// - [`Error::Io`] if a pre-existing checkout cannot be removed
    pub async fn add_repo(
        &self,
        name: &str,
        source: &RepoSource,
        branch: Option<&str>,
    ) -> Result<Repo> {
        let name = Self::normalize_repo_name(name)?;
        if self.does_repo_exist(&name) {
            info!("♻️ Removing pre-existing repo {name}");
            self.delete_repo(&name).await?;
        }

        info!("➕ Adding downloader repo {name} from {source}");
        let dest = self.repos_folder.join(&name);

        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--recurse-submodules");
        if let Some(branch) = branch {
            cmd.arg("--branch").arg(branch);
        }
        cmd.arg(source.clone_target())
            .arg(&dest)
            .stdin(Stdio::null());

        let output = cmd.output().await.map_err(|e| {
            Error::repository(format!("Failed to add downloader repo {name}: cannot run git: {e}"))
        })?;

        if !output.status.success() {
            return Err(Error::repository(format!(
                "Failed to add downloader repo {name}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Repo::open(name, dest, branch.map(str::to_owned), self.python.clone())
    }

    /// Opens an already cloned repo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Repository`] if no checkout exists.
    pub fn open_repo(&self, name: &str) -> Result<Repo> {
        let name = Self::normalize_repo_name(name)?;
        let path = self.repos_folder.join(&name);
        Repo::open(name, path, None, self.python.clone())
    }

    /// Deletes a repo checkout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Repository`] if the checkout exists but cannot be
    /// removed.
    pub async fn delete_repo(&self, name: &str) -> Result<()> {
        let path = self.repos_folder.join(name);
        if !path.exists() {
            return Ok(());
        }

        tokio::fs::remove_dir_all(&path).await.map_err(|e| {
            Error::repository(format!(
                "Failed to remove downloader repo {name} at {}: {e}",
                path.display()
            ))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_normalize_repo_name() {
        assert_eq!(RepoManager::normalize_repo_name("test-repo").expect("ok"), "test_repo");
        assert_eq!(RepoManager::normalize_repo_name(" My_Cogs ").expect("ok"), "my_cogs");
        assert!(RepoManager::normalize_repo_name("1cogs").is_err());
        assert!(RepoManager::normalize_repo_name("my cogs").is_err());
        assert!(RepoManager::normalize_repo_name("").is_err());
    }

    #[test]
    fn test_is_package_name() {
        assert!(is_package_name("alpha"));
        assert!(is_package_name("_private2"));
        assert!(!is_package_name("not-ident"));
        assert!(!is_package_name("2fast"));
        assert!(!is_package_name("class"));
        assert!(!is_package_name(""));
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/data");
        assert_eq!(layout.repos_folder(), PathBuf::from("/data/cogs/RepoManager/repos"));
        assert_eq!(layout.install_path(), PathBuf::from("/data/cogs/CogManager/cogs"));
        assert_eq!(layout.lib_path(), PathBuf::from("/data/cogs/Downloader/lib"));
    }

    #[test]
    fn test_ensure_lib_paths() {
        let dir = TempDir::new().expect("tempdir");
        let layout = DataLayout::new(dir.path());

        let lib = layout.ensure_lib_paths().expect("create");
        assert!(lib.join("cog_shared/__init__.py").is_file());
        // Second call leaves the existing marker alone.
        layout.ensure_lib_paths().expect("idempotent");
    }

    #[tokio::test]
    async fn test_open_and_delete_repo() {
        let dir = TempDir::new().expect("tempdir");
        let manager = RepoManager::new(&DataLayout::new(dir.path())).expect("manager");
        fs::create_dir_all(manager.repos_folder().join("my_cogs")).expect("mkdir");

        assert!(manager.does_repo_exist("my_cogs"));
        let repo = manager.open_repo("my-cogs").expect("open");
        assert_eq!(repo.path(), manager.repos_folder().join("my_cogs"));

        manager.delete_repo("my_cogs").await.expect("delete");
        assert!(!manager.does_repo_exist("my_cogs"));
        manager.delete_repo("my_cogs").await.expect("missing is fine");
    }

    #[tokio::test]
    async fn test_add_repo_rejects_bad_name() {
        let dir = TempDir::new().expect("tempdir");
        let manager = RepoManager::new(&DataLayout::new(dir.path())).expect("manager");

        let result = manager
            .add_repo("9 lives", &RepoSource::local(dir.path()), None)
            .await;
        assert!(matches!(result, Err(Error::Repository { .. })));
    }

    #[test]
    fn test_cleanup_installed_cogs() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("alpha")).expect("mkdir");
        fs::write(dir.path().join("beta"), "file").expect("write");

        let names = vec![
            CogName::new("alpha").expect("valid"),
            CogName::new("beta").expect("valid"),
            CogName::new("gamma").expect("valid"),
        ];
        cleanup_installed_cogs(dir.path(), &names);

        assert!(!dir.path().join("alpha").exists());
        assert!(!dir.path().join("beta").exists());
    }
}
