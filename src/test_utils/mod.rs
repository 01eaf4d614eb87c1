//! Test utilities for netmap-sync
//!
//! Helpers shared by the unit tests and the integration suite: one-time
//! logging setup, polling for conditions produced by background workers, and
//! a few ready-made map views.
//!
//! Background workers run on real time, so tests wait for an observable
//! effect with [`wait_until`] instead of sleeping for a fixed duration.
//!
//! # Example
//!
//! ```rust,no_run
//! use netmap_sync::test_utils::{fast_timing, init_test_logging, wait_until};
//! use std::time::Duration;
//!
//! # async fn example() {
//! init_test_logging(None);
//! let timing = fast_timing();
//! assert!(wait_until(Duration::from_secs(1), || true).await);
//! # }
//! ```

use std::sync::Once;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::models::{LinkId, MapContent, MapLink, MapNode, ObjectId};
use crate::worker::PollTiming;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Interval between two checks of [`wait_until`].
const POLL_STEP: Duration = Duration::from_millis(5);

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber only once regardless of how many times
/// it's called. Uses `level` when given, otherwise `RUST_LOG`; with neither,
/// logging stays off.
///
/// ```bash
/// RUST_LOG=sync=trace,metrics=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show component targets like "sync"
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition was met.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_STEP).await;
    }
}

/// Short timing for workers under test: 5 ms initial delay, 20 ms period.
pub fn fast_timing() -> PollTiming {
    PollTiming::new(Duration::from_millis(5), Duration::from_millis(20))
}

/// A chain of `count` data nodes starting at `first`, each linked to the next.
///
/// Link ids equal the id of the link's first node.
pub fn chain_content(first: u64, count: u64) -> MapContent {
    let nodes = (first..first + count).map(|id| MapNode::data(ObjectId(id))).collect();
    let links = (first..(first + count).saturating_sub(1))
        .map(|id| MapLink::new(LinkId(id), ObjectId(id), ObjectId(id + 1)))
        .collect();
    MapContent {
        nodes,
        links,
        decorations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_until_times_out() {
        assert!(!wait_until(Duration::from_millis(20), || false).await);
        let mut calls = 0;
        assert!(
            wait_until(Duration::from_millis(200), || {
                calls += 1;
                calls > 2
            })
            .await
        );
    }

    #[test]
    fn test_chain_content() {
        let content = chain_content(10, 3);
        assert_eq!(content.nodes.len(), 3);
        assert_eq!(content.links.len(), 2);
        assert_eq!(content.links[1].object_a, ObjectId(11));
        assert_eq!(content.links[1].object_b, ObjectId(12));
        assert!(chain_content(1, 0).links.is_empty());
    }
}
