//! netmap-sync - background synchronization for network map views
//!
//! A network map client keeps several views open at once, and each of them
//! shows live data: the state of the nodes on the map, metric values printed
//! on links, and per-node telemetry summaries. This crate keeps that data
//! fresh without ever blocking the renderer.
//!
//! # Architecture Overview
//!
//! Three long-lived components each own one background [`worker::Worker`]
//! that polls the backend at a fixed period:
//!
//! - [`sync::SubscriptionCoordinator`] - keeps backend objects synchronized
//!   while any open view references them, with per-view reference counting
//!   and poll ownership transfer
//! - [`metrics::MetricCache`] - last values of metrics shown on link labels,
//!   shared by every view
//! - [`telemetry::NodeTelemetryCache`] - per-view node summaries for the
//!   large-label display mode
//!
//! A fourth piece, [`geometry::place_label`], is a pure function that
//! positions metric labels along a link.
//!
//! ## Threading model
//!
//! - membership tables are guarded by one lock per component, never held
//!   across a backend call
//! - readers (`get_value`, `get_cached_node_values`) never wait for a fetch;
//!   a miss means "not yet available"
//! - workers never touch render state: they post [`render::RenderRequest`]s
//!   on a channel the rendering loop drains
//! - a failed fetch is logged and retried at the next period
//!
//! # Core Modules
//!
//! ## Synchronization
//! - [`sync`] - object subscriptions of open views
//! - [`metrics`] - metric last-value cache, label text and link status
//! - [`telemetry`] - per-node summary cache
//! - [`worker`] - the polling worker shared by all three
//!
//! ## Boundaries
//! - [`backend`] - query capabilities consumed from the backend
//! - [`render`] - hand-off of repaint requests to the renderer
//! - [`geometry`] - link label placement
//!
//! ## Supporting modules
//! - [`models`] - identifiers, map content and metric values
//! - [`config`] - polling configuration (`~/.netmap-sync/config.toml`)
//! - [`core`] - error types and user-facing error reporting
//! - [`cli`] - the `netmap-sync` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use netmap_sync::backend::memory::InMemoryBackend;
//! use netmap_sync::metrics::MetricCache;
//! use netmap_sync::models::{MapId, ObjectId};
//! use netmap_sync::render::render_channel;
//! use netmap_sync::sync::SubscriptionCoordinator;
//! use netmap_sync::worker::PollTiming;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let backend = Arc::new(InMemoryBackend::new());
//! let (renderer, mut queue) = render_channel();
//!
//! let coordinator = SubscriptionCoordinator::new(backend.clone(), PollTiming::default());
//! let metrics = MetricCache::new(backend.clone(), PollTiming::default(), Some(renderer));
//!
//! // A map view opens
//! coordinator.add_objects(MapId(1), &[ObjectId(10), ObjectId(11)]);
//!
//! // Once per frame, on the rendering thread
//! for request in queue.drain() {
//!     println!("{request:?}");
//! }
//!
//! // The view closes
//! coordinator.remove_objects(MapId(1), &[ObjectId(10), ObjectId(11)]);
//! metrics.remove_metrics(MapId(1));
//! # Ok(())
//! # }
//! ```

// Synchronization components
pub mod metrics;
pub mod sync;
pub mod telemetry;
pub mod worker;

// Boundaries
pub mod backend;
pub mod geometry;
pub mod render;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
