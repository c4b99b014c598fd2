//! Cog RPC Check CLI.
//!
//! Loads and unloads cogs on a running bot through its JSON-RPC websocket
//! and exits non-zero on the first failure.
//!
//! # Usage
//!
//! ```text
//! COG_PATHS=/data/cogs/CogManager/cogs/alpha cog-rpc-check paths
//! REPO_URL=https://github.com/me/cogs RED_DATA_PATH=/data cog-rpc-check repo
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cog_rpc_check::config::{DEFAULT_HOST, DEFAULT_REPO_NAME, DEFAULT_RPC_PORT};
use cog_rpc_check::downloader::DEFAULT_PYTHON;
use cog_rpc_check::{ReadinessPoller, Result, Session, SessionConfig, SessionConfigBuilder};

// ============================================================================
// CLI
// ============================================================================

/// Validate cog load/unload round trips against a running bot.
#[derive(Parser, Debug)]
#[command(name = "cog-rpc-check", version)]
#[command(about = "Validate cog load/unload round trips over JSON-RPC", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    rpc: RpcArgs,

    #[command(subcommand)]
    mode: Mode,
}

/// Endpoint and timeout settings shared by every mode.
#[derive(Args, Debug)]
struct RpcArgs {
    /// RPC host
    #[arg(long, env = "RPC_HOST", default_value = DEFAULT_HOST, global = true)]
    host: String,

    /// RPC port
    #[arg(long, env = "RPC_PORT", default_value_t = DEFAULT_RPC_PORT, global = true)]
    port: u16,

    /// Seconds to wait for the endpoint to accept connections
    #[arg(long, value_name = "SECS", default_value = "30", value_parser = parse_secs, global = true)]
    ready_timeout: Duration,

    /// Seconds to wait for each load/unload reply
    #[arg(long, value_name = "SECS", default_value = "30", value_parser = parse_secs, global = true)]
    call_timeout: Duration,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Exercise cogs that are already installed
    Paths {
        /// Cog directories (comma-separated in COG_PATHS)
        #[arg(long, env = "COG_PATHS", value_delimiter = ',', num_args = 1..)]
        cog_paths: Vec<PathBuf>,
    },

    /// Install cogs from a repository, exercise them, then clean up
    Repo(RepoArgs),
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// Name to register the repository under
    #[arg(long, env = "REPO_NAME", default_value = DEFAULT_REPO_NAME)]
    repo_name: String,

    /// Git URL to clone (takes precedence over --repo-path)
    #[arg(long, env = "REPO_URL")]
    repo_url: Option<String>,

    /// Local checkout to clone
    #[arg(long, env = "REPO_PATH", required_unless_present = "repo_url")]
    repo_path: Option<PathBuf>,

    /// Branch to check out
    #[arg(long, env = "REPO_BRANCH")]
    repo_branch: Option<String>,

    /// Cogs to exercise; every cog in the repository when omitted
    #[arg(long, env = "COG_PATHS", value_delimiter = ',')]
    cog_paths: Vec<PathBuf>,

    /// Bot data directory
    #[arg(long, env = "RED_DATA_PATH")]
    data_path: PathBuf,

    /// Cog install directory (defaults to the bot's cog manager path)
    #[arg(long, env = "COG_INSTALL_PATH")]
    install_path: Option<PathBuf>,

    /// Interpreter used to pip-install cog requirements
    #[arg(long, env = "PYTHON", default_value = DEFAULT_PYTHON)]
    python: String,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = configure(cli)?;
    let outcomes = Session::new(config).run().await?;

    for outcome in &outcomes {
        info!("{outcome}");
    }
    Ok(())
}

/// Maps parsed arguments onto the config builder.
fn configure(cli: Cli) -> Result<SessionConfig> {
    let readiness = ReadinessPoller::new().with_overall_timeout(cli.rpc.ready_timeout);

    let builder = SessionConfigBuilder::new()
        .host(cli.rpc.host)
        .port(cli.rpc.port)
        .call_timeout(cli.rpc.call_timeout)
        .readiness(readiness);

    let builder = match cli.mode {
        Mode::Paths { cog_paths } => builder.cog_paths(cog_paths),
        Mode::Repo(repo) => {
            let mut builder = builder
                .repo_name(repo.repo_name)
                .cog_paths(repo.cog_paths)
                .data_path(repo.data_path)
                .python(repo.python);

            if let Some(url) = repo.repo_url {
                builder = builder.repo_url(url);
            }
            if let Some(path) = repo.repo_path {
                builder = builder.repo_path(path);
            }
            if let Some(branch) = repo.repo_branch {
                builder = builder.repo_branch(branch);
            }
            if let Some(path) = repo.install_path {
                builder = builder.install_path(path);
            }
            builder
        }
    };

    builder.build()
}

/// Initializes tracing. `RUST_LOG` overrides the default filter.
fn init_logging(debug: bool) {
    let filter = if debug {
        "cog_rpc_check=debug"
    } else {
        "cog_rpc_check=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();
}

/// Parses a non-negative number of seconds, fractions allowed.
fn parse_secs(value: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number of seconds: {e}"))?;

    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid number of seconds: {e}"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("30"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_secs("0.5"), Ok(Duration::from_millis(500)));
        assert!(parse_secs("-1").is_err());
        assert!(parse_secs("soon").is_err());
    }

    #[test]
    fn test_paths_arguments() {
        let cli = Cli::try_parse_from([
            "cog-rpc-check",
            "--port",
            "7000",
            "paths",
            "--cog-paths",
            "/a/alpha,/b/beta",
        ])
        .expect("parse");

        assert_eq!(cli.rpc.port, 7000);
        match cli.mode {
            Mode::Paths { cog_paths } => {
                assert_eq!(cog_paths, vec![PathBuf::from("/a/alpha"), PathBuf::from("/b/beta")]);
            }
            Mode::Repo(_) => panic!("expected paths mode"),
        }
    }

    #[test]
    fn test_repo_arguments() {
        let cli = Cli::try_parse_from([
            "cog-rpc-check",
            "repo",
            "--repo-url",
            "https://example.com/cogs.git",
            "--data-path",
            "/data",
            "--debug",
        ])
        .expect("parse");

        assert!(cli.debug);
        let Mode::Repo(repo) = cli.mode else {
            panic!("expected repo mode");
        };
        assert_eq!(repo.repo_url.as_deref(), Some("https://example.com/cogs.git"));
        assert!(repo.cog_paths.is_empty());
    }
}
