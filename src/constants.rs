//! Global constants used throughout the netmap-sync codebase.
//!
//! Polling intervals and label geometry constants live here so that the
//! workers, the configuration defaults and the CLI agree on the same values.

use std::time::Duration;

/// Default period between two background fetch iterations (30 seconds).
///
/// This is also the de facto retry interval: a failed fetch is never retried
/// immediately, the worker simply waits for the next period.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Delay before a freshly started worker runs its first iteration (1 second).
///
/// Gives a newly opened map view time to register its objects and metrics so
/// that the first batch covers all of them.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default position of a link label inside its zone, in percent.
pub const DEFAULT_LABEL_PERCENT: u8 = 50;

/// Number of equal sections a link is divided into for label placement.
///
/// Sections 1 and 11 hold the interface name labels, sections 2 to 10 form
/// three zones of three sections each.
pub const LINK_SECTIONS: u32 = 11;

/// Number of sections in one label zone.
pub const ZONE_SECTIONS: u32 = 3;

/// Interface utilization thresholds (tenths of a percent) used to pick the
/// link colour bucket.
pub const LINK_UTILIZATION_THRESHOLDS: [u32; 8] = [10, 100, 250, 400, 550, 700, 850, 1000];
