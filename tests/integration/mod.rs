//! Integration test suite for netmap-sync
//!
//! End-to-end tests that run the synchronization components with real
//! background workers against the in-memory backend, plus the command line.
//! Workers use millisecond periods, so the whole suite runs in a few seconds.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=sync=trace cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - **subscriptions**: object reference counting and poll ownership transfer
//! - **metric_sharing**: one metric shared by several views
//! - **telemetry**: per-view node summaries and disposal
//! - **label_placement**: link label geometry
//! - **cli**: the `netmap-sync` binary

mod cli;
mod label_placement;
mod metric_sharing;
mod subscriptions;
mod telemetry;
