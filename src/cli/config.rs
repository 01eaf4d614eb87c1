//! `config` command: inspect and create the configuration file.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::SyncConfig;

/// Manage the netmap-sync configuration file.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the effective configuration (default)
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Show) | None => Self::show(config_path).await,
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path).await,
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
        }
    }

    async fn show(config_path: Option<PathBuf>) -> Result<()> {
        let path = SyncConfig::resolve_path(config_path)?;
        let config = SyncConfig::load_with_optional(Some(path.clone())).await?;

        println!("{}", "Sync Configuration".bold());
        if path.exists() {
            println!("Location: {}\n", path.display());
        } else {
            println!("Location: {} {}\n", path.display(), "(not found, using defaults)".yellow());
        }
        println!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }

    async fn init(force: bool, config_path: Option<PathBuf>) -> Result<()> {
        let path = SyncConfig::resolve_path(config_path)?;
        if path.exists() && !force {
            println!("❌ Configuration already exists at: {}", path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        SyncConfig::default().save_to(&path).await?;
        println!("✅ Created configuration at: {}", path.display());
        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        println!("{}", SyncConfig::resolve_path(config_path)?.display());
        Ok(())
    }
}
