//! Core types for netmap-sync
//!
//! ## `error` - Error Handling
//!
//! - [`SyncError`] - Enumerated error types covering every failure mode of
//!   the synchronization core
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format
//!
//! Library code returns [`anyhow::Result`] at the seams with external
//! collaborators and wraps backend failures into [`SyncError::TransientFetch`]
//! so that workers can log them uniformly.

pub mod error;

pub use error::{ErrorContext, SyncError, user_friendly_error};
