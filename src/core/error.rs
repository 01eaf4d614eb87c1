//! Error handling for netmap-sync
//!
//! This module provides the error taxonomy of the synchronization core and
//! user-friendly error reporting for the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** for precise handling inside the library
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Fetch failures**: [`SyncError::TransientFetch`] - a batched query
//!   failed. Workers log it and try again at the next polling period.
//! - **Lifecycle**: [`SyncError::Disposed`] - a component was used after
//!   it was shut down. Results racing with disposal are discarded.
//! - **References**: [`SyncError::UnknownReference`] - an id the backend does
//!   not know. Never surfaced to the renderer, which sees a cache miss.
//! - **Configuration**: [`SyncError::ConfigError`],
//!   [`SyncError::InvalidArgument`], [`SyncError::TomlError`]
//! - **I/O**: [`SyncError::IoError`]
//!
//! Use [`user_friendly_error`] to convert any error into an [`ErrorContext`]
//! with a suggestion before printing it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use netmap_sync::core::{ErrorContext, SyncError, user_friendly_error};
//!
//! let error = SyncError::ConfigError {
//!     message: "poll_period_ms must be greater than zero".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for synchronization operations
///
/// # Error Categories
///
/// - [`TransientFetch`] - batched query to the backend failed
/// - [`Disposed`] - component already shut down
/// - [`UnknownReference`] - id not recognized by the backend
/// - [`ConfigError`] - configuration content is invalid
/// - [`InvalidArgument`] - caller passed an out-of-range argument
/// - [`IoError`] - standard I/O errors from [`std::io::Error`]
/// - [`TomlError`] - TOML parsing errors from [`toml::de::Error`]
///
/// [`TransientFetch`]: SyncError::TransientFetch
/// [`Disposed`]: SyncError::Disposed
/// [`UnknownReference`]: SyncError::UnknownReference
/// [`ConfigError`]: SyncError::ConfigError
/// [`InvalidArgument`]: SyncError::InvalidArgument
/// [`IoError`]: SyncError::IoError
/// [`TomlError`]: SyncError::TomlError
#[derive(Error, Debug)]
pub enum SyncError {
    /// A batched backend query failed
    ///
    /// The current iteration's merge is skipped; the worker loop continues at
    /// the next polling period, which acts as an implicit retry.
    #[error("Backend query '{operation}' failed: {reason}")]
    TransientFetch {
        /// The query that failed (e.g., "get_last_values")
        operation: String,
        /// Error chain reported by the backend
        reason: String,
    },

    /// Component was used after disposal
    #[error("{component} has been disposed")]
    Disposed {
        /// Name of the disposed component
        component: String,
    },

    /// Identifier not recognized by the backend
    #[error("Unknown {kind} reference: {id}")]
    UnknownReference {
        /// Kind of the reference ("object", "metric", ...)
        kind: String,
        /// The identifier as displayed
        id: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Invalid argument passed by the caller
    #[error("Invalid value for '{name}': {reason}")]
    InvalidArgument {
        /// Name of the argument
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SyncError {
    /// Whether the failure is expected to clear up on its own by the next
    /// polling period.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }

    pub(crate) fn fetch(operation: &str, error: &anyhow::Error) -> Self {
        Self::TransientFetch {
            operation: operation.to_string(),
            reason: format!("{error:#}"),
        }
    }
}

/// A [`SyncError`] as shown to a person at the terminal, with an optional
/// explanation and a hint on what to do about it.
///
/// ```rust,no_run
/// use netmap_sync::core::{ErrorContext, SyncError};
///
/// let context = ErrorContext::new(SyncError::Disposed { component: "metric cache".into() })
///     .with_suggestion("Create a new cache instance for the reopened view")
///     .with_details("Disposed caches discard every late fetch result");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    pub error: SyncError,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Background on why the error happened
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: SyncError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Optional sections in display order, labelled.
    fn sections(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [("details", self.details.as_deref()), ("suggestion", self.suggestion.as_deref())]
            .into_iter()
            .filter_map(|(label, text)| text.map(|text| (label, text)))
    }

    /// Print to stderr: the error in red, details in yellow, the
    /// suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);
        for (label, text) in self.sections() {
            let label = if label == "details" { label.yellow() } else { label.green() };
            eprintln!("{label}: {text}");
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        for (label, text) in self.sections() {
            let title = if label == "details" { "Details" } else { "Suggestion" };
            write!(f, "\n{title}: {text}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`SyncError`], [`std::io::Error`] and [`toml::de::Error`] anywhere
/// in the error chain; anything else is wrapped with its full chain as the
/// message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(sync_error) = cause.downcast_ref::<SyncError>() {
            return create_error_context(sync_error);
        }

        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            let kind = io_error.kind();
            let context = ErrorContext::new(SyncError::IoError(std::io::Error::new(
                kind,
                io_error.to_string(),
            )));
            return match kind {
                std::io::ErrorKind::NotFound => context
                    .with_suggestion("Check that the file exists and the path is correct")
                    .with_details(format!("{error:#}")),
                std::io::ErrorKind::PermissionDenied => context
                    .with_suggestion("Check the file permissions of the configuration file")
                    .with_details(format!("{error:#}")),
                _ => context.with_details(format!("{error:#}")),
            };
        }

        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return ErrorContext::new(SyncError::ConfigError {
                message: toml_error.message().to_string(),
            })
            .with_suggestion("Check the TOML syntax of the configuration file")
            .with_details(format!("{error:#}"));
        }
    }

    ErrorContext::new(SyncError::ConfigError {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: &SyncError) -> ErrorContext {
    match error {
        SyncError::TransientFetch { operation, reason } => {
            ErrorContext::new(SyncError::TransientFetch {
                operation: operation.clone(),
                reason: reason.clone(),
            })
            .with_suggestion("Check the connection to the management server; polling retries automatically")
            .with_details("Background workers skip the failed batch and fetch again at the next polling period")
        }
        SyncError::Disposed { component } => ErrorContext::new(SyncError::Disposed {
            component: component.clone(),
        })
        .with_details("Results arriving after disposal are discarded"),
        SyncError::UnknownReference { kind, id } => {
            ErrorContext::new(SyncError::UnknownReference {
                kind: kind.clone(),
                id: id.clone(),
            })
            .with_suggestion("Verify that the object or metric still exists on the server")
        }
        SyncError::ConfigError { message } => ErrorContext::new(SyncError::ConfigError {
            message: message.clone(),
        })
        .with_suggestion("Fix the value in ~/.netmap-sync/config.toml or pass --config with a valid file"),
        SyncError::InvalidArgument { name, reason } => {
            ErrorContext::new(SyncError::InvalidArgument {
                name: name.clone(),
                reason: reason.clone(),
            })
            .with_suggestion("Run the command with --help to see accepted values")
        }
        SyncError::IoError(io_error) => ErrorContext::new(SyncError::IoError(
            std::io::Error::new(io_error.kind(), io_error.to_string()),
        )),
        SyncError::TomlError(toml_error) => ErrorContext::new(SyncError::ConfigError {
            message: toml_error.message().to_string(),
        })
        .with_suggestion("Check the TOML syntax of the configuration file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_transient_fetch_is_transient() {
        let error = SyncError::fetch("get_last_values", &anyhow::anyhow!("connection reset"));
        assert!(error.is_transient());
        assert_eq!(
            error.to_string(),
            "Backend query 'get_last_values' failed: connection reset"
        );
        assert!(!SyncError::Disposed { component: "x".into() }.is_transient());
    }

    #[test]
    fn test_error_context_display() {
        let context = ErrorContext::new(SyncError::ConfigError {
            message: "bad period".into(),
        })
        .with_suggestion("fix it")
        .with_details("period is zero");

        let text = context.to_string();
        assert!(text.contains("Configuration error: bad period"));
        assert!(text.contains("Details: period is zero"));
        assert!(text.contains("Suggestion: fix it"));
    }

    #[test]
    fn test_user_friendly_error_finds_sync_error_in_chain() {
        let error = Err::<(), _>(SyncError::InvalidArgument {
            name: "percent".into(),
            reason: "must be at most 100".into(),
        })
        .context("parsing arguments")
        .unwrap_err();

        let context = user_friendly_error(error);
        assert!(matches!(context.error, SyncError::InvalidArgument { .. }));
        assert!(context.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_io_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let context = user_friendly_error(anyhow::Error::from(io));
        assert!(matches!(context.error, SyncError::IoError(_)));
        assert!(context.suggestion.unwrap().contains("path"));
    }

    #[test]
    fn test_user_friendly_error_generic() {
        let context = user_friendly_error(anyhow::anyhow!("something odd"));
        assert!(context.to_string().contains("something odd"));
    }
}
