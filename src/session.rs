//! End-to-end check runs.
//!
//! A [`Session`] turns a [`SessionConfig`] into a list of verified cogs:
//!
//! 1. Repository mode only: clone the repository, pick the cogs, and
//!    install them with their requirements
//! 2. Wait for the RPC endpoint to accept handshakes
//! 3. Open one client and load→unload every cog in order
//! 4. Repository mode only: remove installed cogs and the repository,
//!    whether or not the run succeeded

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::config::{CogSource, RepositorySettings, SessionConfig};
use crate::downloader::{AvailableCog, CogRepository, Repo, RepoManager, cleanup_installed_cogs};
use crate::error::{Error, Result};
use crate::exercise::{CogOutcome, ExerciseProtocol};
use crate::identifiers::CogName;
use crate::transport::RpcClient;

// ============================================================================
// Session
// ============================================================================

/// One check run.
///
/// # Example
///
/// ```no_run
/// use cog_rpc_check::{Session, SessionConfig};
///
/// # async fn example() -> cog_rpc_check::Result<()> {
/// let config = SessionConfig::builder()
///     .cog_paths(["/data/cogs/CogManager/cogs/alpha"])
///     .build()?;
///
/// let outcomes = Session::new(config).run().await?;
/// assert!(outcomes.iter().all(|o| o.is_complete()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    /// Validated settings.
    config: SessionConfig,
}

impl Session {
    /// Creates a session.
    #[inline]
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Returns the session's settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs the check and returns one outcome per cog.
    ///
    /// # Errors
    ///
    /// The first failure from readiness polling, the exercise protocol, or
    /// repository setup. Cleanup failures are logged only.
    pub async fn run(&self) -> Result<Vec<CogOutcome>> {
        match self.config.source() {
            CogSource::Paths(paths) => self.run_paths(paths).await,
            CogSource::Repository(settings) => self.run_repository(settings).await,
        }
    }

    /// Exercises cogs that are already installed.
    async fn run_paths(&self, paths: &[PathBuf]) -> Result<Vec<CogOutcome>> {
        let names = paths
            .iter()
            .map(|p| CogName::from_path(p))
            .collect::<Result<Vec<_>>>()?;

        self.exercise(names).await
    }

    /// Installs cogs from a repository, exercises them, and cleans up.
    async fn run_repository(&self, settings: &RepositorySettings) -> Result<Vec<CogOutcome>> {
        let layout = settings.layout();
        let install_path = settings.install_path();
        fs::create_dir_all(&install_path)?;
        let requirements_path = layout.ensure_lib_paths()?;

        let manager = RepoManager::new(&layout)?.with_python(&settings.python);
        let repo = manager
            .add_repo(&settings.name, &settings.source, settings.branch.as_deref())
            .await?;

        let mut installed = Vec::new();
        let outcome: Result<Vec<CogOutcome>> = async {
            let cogs = select_cogs(&repo, settings.cogs.as_deref())?;
            install_cogs(&repo, &cogs, &install_path, &requirements_path, &mut installed).await?;
            self.exercise(cogs.into_iter().map(|c| c.name).collect()).await
        }
        .await;

        cleanup_installed_cogs(&install_path, &installed);
        remove_repo(&manager, &repo).await;

        outcome
    }

    /// Waits for the endpoint, then load→unloads `names` over one client.
    async fn exercise(&self, names: Vec<CogName>) -> Result<Vec<CogOutcome>> {
        let url = self.config.rpc_url();
        info!("🔌 Validating {} cog(s) against RPC at {url}", names.len());

        self.config.readiness().wait_until_ready(&url).await?;

        let protocol = ExerciseProtocol::new(self.config.call_timeout());
        let outcomes = RpcClient::scoped(&url, self.config.handshake_timeout(), move |client| {
            Box::pin(async move { protocol.exercise(client, &names).await })
        })
        .await?;

        info!("🎯 All cog RPC tests passed");
        Ok(outcomes)
    }
}

// ============================================================================
// Repository Helpers
// ============================================================================

/// Picks the cogs to exercise.
///
/// With `wanted`, every named cog must be available and the result follows
/// `wanted`'s order, keeping the first of any repeated name. Without it,
/// every available cog is picked.
///
/// # Errors
///
/// Returns [`Error::Repository`] if a wanted cog is missing or the
/// repository has nothing to exercise.
pub fn select_cogs<R>(repo: &R, wanted: Option<&[CogName]>) -> Result<Vec<AvailableCog>>
where
    R: CogRepository + ?Sized,
{
    let available = repo.available_cogs()?;

    let Some(wanted) = wanted else {
        if available.is_empty() {
            return Err(Error::repository(format!(
                "Repository {} does not contain any cogs to test",
                repo.name()
            )));
        }
        info!(
            "🧭 No cogs specified; exercising all {} cog(s) from {}",
            available.len(),
            repo.name()
        );
        return Ok(available);
    };

    let mut by_name: FxHashMap<CogName, AvailableCog> = available
        .into_iter()
        .map(|cog| (cog.name.clone(), cog))
        .collect();

    let missing: Vec<&str> = wanted
        .iter()
        .filter(|name| !by_name.contains_key(*name))
        .map(CogName::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(Error::repository(format!(
            "Repository {} did not contain expected cogs: {}",
            repo.name(),
            missing.join(", ")
        )));
    }

    let mut selected = Vec::with_capacity(wanted.len());
    for name in wanted {
        match by_name.remove(name) {
            Some(cog) => selected.push(cog),
            None => warn!(cog = %name, "Cog requested more than once; exercising it once"),
        }
    }
    Ok(selected)
}

/// Installs each cog and its requirements.
///
/// Every cog whose files were copied is pushed onto `installed`, even when
/// a later step fails, so the caller can clean up.
///
/// # Errors
///
/// The first install failure.
pub async fn install_cogs<R>(
    repo: &R,
    cogs: &[AvailableCog],
    install_path: &Path,
    requirements_path: &Path,
    installed: &mut Vec<CogName>,
) -> Result<()>
where
    R: CogRepository + ?Sized,
{
    for cog in cogs {
        info!("🧩 Installing cog {} via downloader", cog.name);
        repo.install_cog(cog, install_path).await?;
        installed.push(cog.name.clone());
        repo.install_requirements(cog, requirements_path).await?;
    }

    Ok(())
}

/// Deletes the repository, falling back to removing its directory.
async fn remove_repo(manager: &RepoManager, repo: &Repo) {
    let name = repo.name();
    info!("🧹 Removing downloader repo {name}");

    let Err(e) = manager.delete_repo(name).await else {
        return;
    };
    warn!(repo = name, error = %e, "Failed to delete downloader repo");

    if !repo.path().exists() {
        return;
    }
    info!("🧹 Removing repo directory {}", repo.path().display());
    if let Err(e) = fs::remove_dir_all(repo.path()) {
        warn!(repo = name, path = %repo.path().display(), error = %e, "Failed to remove repo directory");
    }
}

// ============================================================================
// Tests
// ============================================================================
