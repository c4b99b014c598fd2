//! Load/unload round trips.
//!
//! For every cog, `CORE__LOAD` is called with `[[name]]` and the reported
//! `loaded_packages` / `failed_packages` are checked, then `CORE__UNLOAD`
//! is called and `unloaded_packages` is checked. The first failure aborts
//! the run.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::identifiers::CogName;
use crate::protocol::{CogMethod, LoadReport, UnloadReport};
use crate::transport::{DEFAULT_CALL_TIMEOUT, RpcCaller};

use super::CogOutcome;

// ============================================================================
// ExerciseProtocol
// ============================================================================

/// Drives load→unload round trips through any [`RpcCaller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseProtocol {
    /// Deadline for each individual call.
    call_timeout: Duration,
}

impl Default for ExerciseProtocol {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ExerciseProtocol {
    /// Creates a protocol driver with a per-call timeout.
    #[inline]
    #[must_use]
    pub const fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    /// Returns the per-call timeout.
    #[inline]
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Loads one cog and checks the bot's report.
    ///
    /// # Errors
    ///
    /// - Any [`RpcCaller::call`] failure
    /// - [`Error::LoadReportedFailures`](crate::Error::LoadReportedFailures) if anything failed to load
    /// - [`Error::LoadNotConfirmed`](crate::Error::LoadNotConfirmed) if `name` is not reported loaded
    pub async fn load_one<C>(&self, client: &mut C, name: &CogName) -> Result<LoadReport>
    where
        C: RpcCaller + ?Sized,
    {
        info!(cog = %name, "📥 Loading cog {name}");
        let method = CogMethod::Load(vec![name.clone()]);
        let raw = client
            .call(method.name(), Some(method.params()), self.call_timeout)
            .await?;

        let report = LoadReport::from_result(&raw)?;
        report.confirm(name, &raw)?;
        info!(cog = %name, "✅ Cog {name} loaded successfully");
        Ok(report)
    }

    /// Unloads one cog and checks the bot's report.
    ///
    /// # Errors
    ///
    /// - Any [`RpcCaller::call`] failure
    /// - [`Error::UnloadNotConfirmed`](crate::Error::UnloadNotConfirmed) if `name` is not reported unloaded
    pub async fn unload_one<C>(&self, client: &mut C, name: &CogName) -> Result<UnloadReport>
    where
        C: RpcCaller + ?Sized,
    {
        info!(cog = %name, "📤 Unloading cog {name}");
        let method = CogMethod::Unload(vec![name.clone()]);
        let raw = client
            .call(method.name(), Some(method.params()), self.call_timeout)
            .await?;

        let report = UnloadReport::from_result(&raw)?;
        report.confirm(name, &raw)?;
        info!(cog = %name, "♻️ Cog {name} unloaded successfully");
        Ok(report)
    }

    /// Loads then unloads each cog in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first error from [`ExerciseProtocol::load_one`] or
    /// [`ExerciseProtocol::unload_one`].
    pub async fn exercise<C>(&self, client: &mut C, names: &[CogName]) -> Result<Vec<CogOutcome>>
    where
        C: RpcCaller + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(names.len());

        for name in names {
            let mut outcome = CogOutcome::pending(name.clone());
            self.load_one(client, name).await?;
            outcome.loaded = true;
            self.unload_one(client, name).await?;
            outcome.unloaded = true;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// [`ExerciseProtocol::load_one`] with the default call timeout.
///
/// # Errors
///
/// See [`ExerciseProtocol::load_one`].
pub async fn load_one<C>(client: &mut C, name: &CogName) -> Result<LoadReport>
where
    C: RpcCaller + ?Sized,
{
    ExerciseProtocol::default().load_one(client, name).await
}

/// [`ExerciseProtocol::unload_one`] with the default call timeout.
///
/// # Errors
///
/// See [`ExerciseProtocol::unload_one`].
pub async fn unload_one<C>(client: &mut C, name: &CogName) -> Result<UnloadReport>
where
    C: RpcCaller + ?Sized,
{
    ExerciseProtocol::default().unload_one(client, name).await
}

/// [`ExerciseProtocol::exercise`] with the default call timeout.
///
/// # Errors
///
/// See [`ExerciseProtocol::exercise`].
pub async fn exercise<C>(client: &mut C, names: &[CogName]) -> Result<Vec<CogOutcome>>
where
    C: RpcCaller + ?Sized,
{
    ExerciseProtocol::default().exercise(client, names).await
}

// ============================================================================
// Tests
// ============================================================================
