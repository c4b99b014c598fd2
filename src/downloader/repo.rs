//! A cloned cog repository and the cogs it offers.
//!
//! A cog is a top-level package directory (it holds `__init__.py`) whose
//! name is an importable identifier. Its `info.json` manifest is optional;
//! a missing one means defaults. Shared libraries and disabled cogs are not
//! offered for installation.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::CogName;

use super::manager::is_package_name;

// ============================================================================
// Constants
// ============================================================================

/// Manifest file describing an installable.
const INFO_FILE: &str = "info.json";

/// Marker file of a Python package.
const PACKAGE_MARKER: &str = "__init__.py";

// ============================================================================
// CogInfo
// ============================================================================

/// Kind of installable declared in `info.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallableType {
    /// Loadable cog (the default).
    #[default]
    Cog,
    /// Library shared between cogs, never loaded directly.
    SharedLibrary,
    /// Anything else.
    #[serde(other)]
    Unknown,
}

/// The parts of `info.json` the installer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CogInfo {
    /// Pip requirement specifiers.
    #[serde(default)]
    pub requirements: Vec<String>,

    /// Installable kind.
    #[serde(default, rename = "type")]
    pub kind: InstallableType,

    /// Disabled installables are not offered.
    #[serde(default)]
    pub disabled: bool,

    /// Hidden installables are still offered, just not advertised.
    #[serde(default)]
    pub hidden: bool,
}

impl CogInfo {
    /// Reads `info.json` from a package directory, or the defaults if the
    /// package has none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Repository`] if the file cannot be read or parsed.
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(INFO_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::repository(format!("Cannot read {}: {e}", path.display()))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| Error::repository(format!("Invalid {}: {e}", path.display())))
    }
}

// ============================================================================
// AvailableCog
// ============================================================================

/// A cog offered by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableCog {
    /// Package name.
    pub name: CogName,
    /// Package directory inside the repository checkout.
    pub path: PathBuf,
    /// Parsed manifest.
    pub info: CogInfo,
}

impl AvailableCog {
    /// Returns the declared pip requirements.
    #[inline]
    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.info.requirements
    }
}

// ============================================================================
// CogRepository
// ============================================================================

/// Plugin-repository operations the session relies on.
#[async_trait]
pub trait CogRepository: Send + Sync {
    /// Repository name.
    fn name(&self) -> &str;

    /// Lists installable cogs, sorted by name.
    fn available_cogs(&self) -> Result<Vec<AvailableCog>>;

    /// Copies `cog` into `target_dir/<name>`, replacing whatever is there.
    /// Returns the installed directory.
    async fn install_cog(&self, cog: &AvailableCog, target_dir: &Path) -> Result<PathBuf>;

    /// Installs `cog`'s requirements into `target_dir`.
    async fn install_requirements(&self, cog: &AvailableCog, target_dir: &Path) -> Result<()>;
}

// ============================================================================
// Repo
// ============================================================================

/// A repository checkout on local storage.
#[derive(Debug, Clone)]
pub struct Repo {
    /// Normalized repository name.
    name: String,
    /// Checkout directory.
    path: PathBuf,
    /// Checked-out branch, if one was requested.
    branch: Option<String>,
    /// Interpreter used to run pip.
    python: String,
}

impl Repo {
    /// Wraps an existing checkout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Repository`] if `path` is not a directory.
    pub fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        branch: Option<String>,
        python: impl Into<String>,
    ) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(Error::repository(format!(
                "Repository checkout not found at {}",
                path.display()
            )));
        }

        Ok(Self {
            name: name.into(),
            path,
            branch,
            python: python.into(),
        })
    }

    /// Returns the checkout directory.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the requested branch.
    #[inline]
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

#[async_trait]
impl CogRepository for Repo {
    fn name(&self) -> &str {
        &self.name
    }

    fn available_cogs(&self) -> Result<Vec<AvailableCog>> {
        let mut cogs = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_package_name(file_name) || !path.join(PACKAGE_MARKER).is_file() {
                continue;
            }

            let info = CogInfo::read(&path)?;
            if info.kind != InstallableType::Cog || info.disabled {
                debug!(repo = %self.name, package = file_name, kind = ?info.kind, disabled = info.disabled, "Skipping installable");
                continue;
            }

            cogs.push(AvailableCog {
                name: CogName::new(file_name)?,
                path,
                info,
            });
        }

        cogs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cogs)
    }

    async fn install_cog(&self, cog: &AvailableCog, target_dir: &Path) -> Result<PathBuf> {
        let source = cog.path.clone();
        let target = target_dir.join(cog.name.as_str());
        let dest = target.clone();

        spawn_blocking(move || -> Result<()> {
            remove_path(&dest)?;
            copy_dir_recursive(&source, &dest)
        })
        .await
        .map_err(|e| Error::repository(format!("Install task for {} failed: {e}", cog.name)))?
        .map_err(|e| {
            Error::repository(format!(
                "Failed to install cog {} from {}: {e}",
                cog.name, self.name
            ))
        })?;

        debug!(cog = %cog.name, dest = %target.display(), "Installed cog files");
        Ok(target)
    }

    async fn install_requirements(&self, cog: &AvailableCog, target_dir: &Path) -> Result<()> {
        let requirements = cog.requirements();
        if requirements.is_empty() {
            return Ok(());
        }

        info!(cog = %cog.name, count = requirements.len(), "Installing requirements");

        let output = Command::new(&self.python)
            .args(["-m", "pip", "install", "--upgrade", "--disable-pip-version-check"])
            .arg("--target")
            .arg(target_dir)
            .args(requirements)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::repository(format!("Failed to run {} for pip: {e}", self.python))
            })?;

        if !output.status.success() {
            return Err(Error::repository(format!(
                "Failed to install requirements for {}: {}",
                cog.name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Private Helpers
// ============================================================================

/// Removes a file or directory tree if present.
pub(crate) fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Recursively copies a directory and all its contents.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
