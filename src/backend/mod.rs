//! External collaborators consumed by the synchronization core.
//!
//! The backend query protocol is not part of this crate. The caches only
//! depend on three narrow capabilities:
//!
//! - [`ValueQuery`] - batched last-values query for metrics
//! - [`SummaryQuery`] - batched per-node tooltip/summary values
//! - [`ObjectSync`] - synchronize a set of objects into the shared object
//!   model, which emits its own change notifications
//!
//! Implementations must be cheap to share (`Send + Sync`) since each worker
//! keeps an `Arc` to its backend. Ids the backend does not recognize are
//! simply left out of the returned maps.
//!
//! [`memory::InMemoryBackend`] implements all three for tests and the
//! `simulate` command.

pub mod memory;

use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;

use crate::models::{MapId, MetricId, MetricRequest, MetricValue, ObjectId};

/// Batched last-values query.
pub trait ValueQuery: Send + Sync {
    /// Fetch the last value of every requested metric.
    fn get_last_values(
        &self,
        requests: &[MetricRequest],
    ) -> impl Future<Output = Result<HashMap<MetricId, MetricValue>>> + Send;
}

/// Batched tooltip/summary query.
pub trait SummaryQuery: Send + Sync {
    /// Fetch the summary values of every requested node.
    fn get_summary_values(
        &self,
        nodes: &[ObjectId],
    ) -> impl Future<Output = Result<HashMap<ObjectId, Vec<MetricValue>>>> + Send;
}

/// Object synchronization capability.
pub trait ObjectSync: Send + Sync {
    /// Synchronize `objects` on behalf of map view `owner`.
    fn sync_object_set(
        &self,
        objects: &[ObjectId],
        owner: MapId,
        flags: SyncFlags,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Options of an object synchronization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncFlags {
    /// Emit change notifications for updated objects
    pub notify: bool,
    /// Accept partial results when some objects are inaccessible
    pub allow_partial: bool,
    /// Wait for the backend to complete the sync before returning
    pub wait: bool,
}

impl SyncFlags {
    /// Flags used by the periodic background synchronization.
    pub const fn background() -> Self {
        Self {
            notify: true,
            allow_partial: true,
            wait: false,
        }
    }
}
