//! netmap-sync CLI entry point
//!
//! Parses the command line, runs the selected command and prints failures
//! with the user-friendly error formatter.
//!
//! - `place` - Compute a link label anchor
//! - `simulate` - Run the synchronization components against an in-memory backend
//! - `config` - Show, create or locate the configuration file

use anyhow::Result;
use clap::Parser;
use netmap_sync::cli;
use netmap_sync::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    // Execute the command
    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
