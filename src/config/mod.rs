//! Configuration management for netmap-sync
//!
//! Settings are read from `~/.netmap-sync/config.toml` (or the path given by
//! `--config` / `NETMAP_SYNC_CONFIG`) and turned into the polling timing used
//! by every background worker.
//!
//! # Configuration Priority
//!
//! 1. `--config <path>` on the command line
//! 2. `NETMAP_SYNC_CONFIG` environment variable
//! 3. `~/.netmap-sync/config.toml`
//! 4. Default values
//!
//! # Modules
//!
//! - `sync_config` - [`SyncConfig`] loading, validation and saving

mod sync_config;

pub use sync_config::{CONFIG_PATH_ENV, SyncConfig};
