//! Command-line interface for netmap-sync.
//!
//! The binary is a thin shell around the library, used to inspect label
//! placement, to exercise the synchronization components against an
//! in-memory backend, and to look at the effective configuration.
//!
//! # Available Commands
//!
//! - `place` - Compute the anchor of a link label or interface name
//! - `simulate` - Run the three caches against an in-memory backend
//! - `config` - Show, create or locate the configuration file
//!
//! # Examples
//!
//! ```bash
//! # Center label of a horizontal link
//! netmap-sync place --from 0,0 --to 1100,0
//!
//! # Second of three parallel links, reversed direction
//! netmap-sync place --from 0,0 --to 300,400 --duplicate-index 1 --duplicate-count 3 --inverted
//!
//! # Two overlapping views, five polling rounds, with debug logs
//! netmap-sync --verbose simulate --views 2 --nodes 4 --rounds 5
//!
//! # Effective configuration
//! netmap-sync config show
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--config <path>` - Use an alternative configuration file
//!
//! `RUST_LOG` takes precedence over `--verbose` when set.

mod config;
mod place;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use config::ConfigCommand;
pub use place::PlaceCommand;
pub use simulate::SimulateCommand;

/// Settings derived from the global command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter to install; `None` disables logging unless `RUST_LOG` is set
    pub log_level: Option<String>,

    /// Configuration file given with `--config`
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the tracing subscriber. Logs go to stderr so that command
    /// output on stdout stays machine readable.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(level)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    }
}

/// Main CLI structure for netmap-sync.
#[derive(Parser)]
#[command(
    name = "netmap-sync",
    about = "Background synchronization for network map views",
    version,
    long_about = "netmap-sync keeps network map views fresh: object subscriptions, link metric values and node telemetry are polled in the background and handed to the renderer as incremental repaint requests."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternative configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the anchor point of a link label
    Place(PlaceCommand),

    /// Run the synchronization components against an in-memory backend
    Simulate(SimulateCommand),

    /// Manage the configuration file
    Config(ConfigCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// `--verbose` selects debug logs, `--quiet` disables logging and the
    /// default is warnings only.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Place(cmd) => cmd.execute(config.config_path).await,
            Commands::Simulate(cmd) => cmd.execute(config.config_path).await,
            Commands::Config(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
