//! Readiness polling for the RPC endpoint.
//!
//! The bot opens its RPC listener some time after the process starts. The
//! poller repeatedly dials the endpoint with a short-lived probe (connect,
//! then immediately close) until a handshake completes or the overall
//! deadline passes. No application-level messages are exchanged.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};

use super::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Default handshake timeout for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default overall polling deadline.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default pause between failed probes.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// Readiness
// ============================================================================

/// Outcome of a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    /// Probes made, including the successful one.
    pub attempts: u32,
    /// Wall-clock time until the endpoint accepted a handshake.
    pub elapsed: Duration,
}

// ============================================================================
// ReadinessPoller
// ============================================================================

/// Polls an endpoint until it accepts websocket handshakes.
///
/// Only connect-phase failures are retried. A malformed URL fails at once.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use cog_rpc_check::ReadinessPoller;
///
/// # async fn example() -> cog_rpc_check::Result<()> {
/// ReadinessPoller::new()
///     .with_overall_timeout(Duration::from_secs(60))
///     .wait_until_ready("ws://127.0.0.1:6133/")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPoller {
    /// Handshake timeout for each probe.
    per_attempt_timeout: Duration,
    /// Give up once this much time has passed since the first probe.
    overall_timeout: Duration,
    /// Pause between failed probes.
    retry_interval: Duration,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self {
            per_attempt_timeout: DEFAULT_PROBE_TIMEOUT,
            overall_timeout: DEFAULT_READY_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl ReadinessPoller {
    /// Creates a poller with the default 3s / 30s / 0.5s settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handshake timeout for each probe.
    #[inline]
    #[must_use]
    pub fn with_per_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = timeout;
        self
    }

    /// Sets the overall polling deadline.
    #[inline]
    #[must_use]
    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// Sets the pause between failed probes.
    #[inline]
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Returns the per-probe handshake timeout.
    #[inline]
    #[must_use]
    pub const fn per_attempt_timeout(&self) -> Duration {
        self.per_attempt_timeout
    }

    /// Returns the overall polling deadline.
    #[inline]
    #[must_use]
    pub const fn overall_timeout(&self) -> Duration {
        self.overall_timeout
    }

    /// Returns the pause between failed probes.
    #[inline]
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Probes `url` until a handshake succeeds.
    ///
    /// The pause before a retry is clamped to the remaining budget, so a
    /// failing poll returns within `overall_timeout + per_attempt_timeout`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] immediately for a malformed URL
    /// - [`Error::ReadinessTimeout`] once the overall deadline has passed
    pub async fn wait_until_ready(&self, url: &str) -> Result<Readiness> {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let err = match probe(url, self.per_attempt_timeout).await {
                Ok(()) => {
                    let elapsed = start.elapsed();
                    info!(url, attempts, elapsed_ms = elapsed.as_millis() as u64, "RPC endpoint is ready");
                    return Ok(Readiness { attempts, elapsed });
                }
                Err(e) if e.is_retryable_connect() => e,
                Err(e) => return Err(e),
            };

            let elapsed = start.elapsed();
            if elapsed >= self.overall_timeout {
                return Err(Error::readiness_timeout(
                    url,
                    attempts,
                    elapsed.as_millis() as u64,
                    err.to_string(),
                ));
            }

            let pause = self.retry_interval.min(self.overall_timeout - elapsed);
            debug!(url, attempts, error = %err, pause_ms = pause.as_millis() as u64, "RPC endpoint not ready yet");
            sleep(pause).await;
        }
    }
}

/// Polls `url` with explicit settings.
///
/// # Errors
///
/// See [`ReadinessPoller::wait_until_ready`].
pub async fn wait_until_ready(
    url: &str,
    per_attempt_timeout: Duration,
    overall_timeout: Duration,
    retry_interval: Duration,
) -> Result<Readiness> {
    ReadinessPoller::new()
        .with_per_attempt_timeout(per_attempt_timeout)
        .with_overall_timeout(overall_timeout)
        .with_retry_interval(retry_interval)
        .wait_until_ready(url)
        .await
}

/// Connects and immediately closes.
async fn probe(url: &str, handshake_timeout: Duration) -> Result<()> {
    let mut connection = Connection::open(url, handshake_timeout).await?;
    if let Err(e) = connection.close().await {
        trace!(url, error = %e, "Probe close failed");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::mock::{MockServer, closed_port};

    #[test]
    fn test_defaults() {
        let poller = ReadinessPoller::default();
        assert_eq!(poller.per_attempt_timeout(), Duration::from_secs(3));
        assert_eq!(poller.overall_timeout(), Duration::from_secs(30));
        assert_eq!(poller.retry_interval(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_ready_on_first_probe() {
        let server = MockServer::bind().await;
        let url = server.ws_url();
        let _handle = server.accept_forever();

        let readiness = ReadinessPoller::new()
            .wait_until_ready(&url)
            .await
            .expect("ready");
        assert_eq!(readiness.attempts, 1);
    }

    #[tokio::test]
    async fn test_ready_after_failures() {
        let port = closed_port().await;
        let url = format!("ws://127.0.0.1:{port}/");

        let late = tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            MockServer::bind_port(port).await.accept_forever()
        });

        let readiness = wait_until_ready(
            &url,
            Duration::from_secs(1),
            Duration::from_secs(10),
            Duration::from_millis(50),
        )
        .await
        .expect("ready");
        assert!(readiness.attempts > 1);

        late.await.expect("late server").abort();
    }

    #[tokio::test]
    async fn test_timeout_is_bounded() {
        let url = format!("ws://127.0.0.1:{}/", closed_port().await);
        let per_attempt = Duration::from_millis(200);
        let overall = Duration::from_millis(400);

        let start = Instant::now();
        let result = wait_until_ready(&url, per_attempt, overall, Duration::from_millis(150)).await;
        let elapsed = start.elapsed();

        match result {
            Err(Error::ReadinessTimeout { attempts, url: polled, .. }) => {
                assert!(attempts >= 2);
                assert_eq!(polled, url);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // Scheduling slack on top of overall + one probe.
        assert!(elapsed < overall + per_attempt + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_malformed_url_fails_immediately() {
        let start = Instant::now();
        let result = ReadinessPoller::new().wait_until_ready("not a url").await;

        assert!(matches!(result, Err(Error::InvalidUrl { .. })));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
