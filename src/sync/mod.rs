//! Object synchronization for open map views.
//!
//! The [`SubscriptionCoordinator`] keeps backend objects fresh while at least
//! one open map view references them. Every object has exactly one *poll
//! owner* among the views that reference it; the background worker issues
//! one batched [`ObjectSync::sync_object_set`] call per owner bucket.
//!
//! Views are reference counted so that cloned windows of the same map share
//! one registration:
//!
//! ```text
//! add_objects(M1, {A, B})     M1: 1   A -> M1, B -> M1
//! add_objects(M2, {B, C})     M2: 1   B -> M1 (shared), C -> M2
//! remove_objects(M1, {A, B})  M1: 0   A dropped, B -> M2 (transferred)
//! ```
//!
//! When the poll owner of a still-referenced object closes, the object moves
//! to the bucket of the remaining owner with the lowest map id.

mod registry;

use parking_lot::Mutex;
use std::sync::Arc;

use self::registry::{AddOutcome, ObjectRegistry, RemoveOutcome};
use crate::backend::{ObjectSync, SyncFlags};
use crate::models::{MapId, ObjectId};
use crate::worker::{Liveness, PollTiming, Worker};

/// Reference-counted object subscriptions of open map views.
#[derive(Debug)]
pub struct SubscriptionCoordinator {
    registry: Arc<Mutex<ObjectRegistry>>,
    worker: Worker,
}

impl SubscriptionCoordinator {
    /// Create the coordinator and start its background worker.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new<S>(sync: Arc<S>, timing: PollTiming) -> Self
    where
        S: ObjectSync + 'static,
    {
        let registry = Arc::new(Mutex::new(ObjectRegistry::default()));
        let task_registry = registry.clone();
        let worker = Worker::spawn("object sync", timing, move |liveness| {
            let sync = sync.clone();
            let registry = task_registry.clone();
            async move { sync_iteration(sync.as_ref(), &registry, &liveness).await }
        });

        Self { registry, worker }
    }

    /// Register an open instance of `map` referencing `objects`.
    ///
    /// Only the first open of a map creates entries; later opens just bump
    /// its reference count.
    pub fn add_objects(&self, map: MapId, objects: &[ObjectId]) {
        let outcome = self.registry.lock().add_objects(map, objects.iter().copied());
        match outcome {
            AddOutcome::Reopened { ref_count } => {
                tracing::debug!(target: "sync", "{map} reopened, ref count {ref_count}");
            }
            AddOutcome::Opened { created, shared } => {
                tracing::debug!(
                    target: "sync",
                    "{map} opened: {created} new objects, {shared} shared with other views"
                );
            }
        }
    }

    /// Unregister one open instance of `map`.
    ///
    /// The object list is informational; the coordinator releases exactly
    /// what the view registered on its first open.
    pub fn remove_objects(&self, map: MapId, objects: &[ObjectId]) {
        let outcome = {
            let mut registry = self.registry.lock();
            let unknown = objects.iter().filter(|o| !registry.owners(**o).contains(&map)).count();
            if unknown > 0 && registry.ref_count(map) == 1 {
                tracing::debug!(
                    target: "sync",
                    "{map} releases {unknown} objects it never registered"
                );
            }
            registry.remove_objects(map)
        };

        match outcome {
            RemoveOutcome::NotOpen => {
                tracing::debug!(target: "sync", "{map} is not open, ignoring release");
            }
            RemoveOutcome::StillOpen { ref_count } => {
                tracing::debug!(target: "sync", "{map} still open, ref count {ref_count}");
            }
            RemoveOutcome::Closed {
                dropped,
                transferred,
            } => {
                tracing::debug!(
                    target: "sync",
                    "{map} closed: {} objects dropped, {} transferred",
                    dropped.len(),
                    transferred.len()
                );
                for (object, owner) in transferred {
                    tracing::trace!(target: "sync", "{object} now polled by {owner}");
                }
            }
        }
    }

    /// Current reference count of `map` (0 when not open).
    pub fn ref_count(&self, map: MapId) -> u32 {
        self.registry.lock().ref_count(map)
    }

    /// View currently responsible for polling `object`.
    pub fn poll_owner(&self, object: ObjectId) -> Option<MapId> {
        self.registry.lock().poll_owner(object)
    }

    /// Every view referencing `object`, in map id order.
    pub fn owners(&self, object: ObjectId) -> Vec<MapId> {
        self.registry.lock().owners(object)
    }

    /// Objects polled on behalf of `map`.
    pub fn bucket(&self, map: MapId) -> Vec<ObjectId> {
        self.registry.lock().bucket(map)
    }

    pub fn is_tracked(&self, object: ObjectId) -> bool {
        self.registry.lock().is_tracked(object)
    }

    pub fn tracked_object_count(&self) -> usize {
        self.registry.lock().tracked_count()
    }

    pub fn open_view_count(&self) -> usize {
        self.registry.lock().open_views()
    }

    /// Run a synchronization round now instead of at the end of the period.
    pub fn request_sync(&self) {
        self.worker.wake();
    }

    /// Stop the worker without waiting for it.
    pub fn shutdown(&self) {
        self.worker.shutdown();
        self.registry.lock().clear();
    }

    /// Stop the worker and wait for its current round to finish.
    pub async fn stop(self) {
        self.registry.lock().clear();
        self.worker.stop().await;
    }
}

async fn sync_iteration<S: ObjectSync>(
    sync: &S,
    registry: &Mutex<ObjectRegistry>,
    liveness: &Liveness,
) -> anyhow::Result<()> {
    let batches = registry.lock().batches();
    if batches.is_empty() {
        return Ok(());
    }

    for (map, objects) in batches {
        if !liveness.is_running() {
            break;
        }
        tracing::trace!(target: "sync", "syncing {} objects for {map}", objects.len());
        if let Err(err) = sync.sync_object_set(&objects, map, SyncFlags::background()).await {
            tracing::warn!(target: "sync", "object sync for {map} failed: {err:#}");
        }
    }
    Ok(())
}
