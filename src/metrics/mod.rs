//! Last-value cache for metrics shown on map links.
//!
//! A [`MetricCache`] is shared by every open map view. Views register the
//! metrics their link labels display; a metric referenced from several views
//! (or several links of one view) is tracked and fetched only once. Each
//! owner view keeps an instance counter per metric so that releasing one
//! label does not drop a metric another label of the same view still shows.
//!
//! Reads are synchronous and never trigger a fetch: the background worker
//! issues one batched [`ValueQuery::get_last_values`] per period for every
//! tracked metric and merges the answers into a [`DashMap`].
//!
//! # Example
//!
//! ```rust,no_run
//! use netmap_sync::backend::memory::InMemoryBackend;
//! use netmap_sync::metrics::MetricCache;
//! use netmap_sync::models::{MapId, MetricId, MetricRequest, ObjectId};
//! use netmap_sync::worker::PollTiming;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = MetricCache::new(Arc::new(InMemoryBackend::new()), PollTiming::default(), None);
//! cache.add_metric(MetricRequest::item(ObjectId(7), MetricId(42)), MapId(1))?;
//!
//! // Later, from the renderer
//! if let Some(value) = cache.get_value(MetricId(42)) {
//!     println!("{}", value.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod status;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use format::{LabelDescriptor, apply_format};
pub use status::{link_status, most_critical_severity, utilization_level};

use crate::backend::ValueQuery;
use crate::core::SyncError;
use crate::geometry::LabelLocation;
use crate::models::{CachedValue, MapId, MetricId, MetricRequest, MetricValue, Severity};
use crate::render::{RenderRequest, RenderSender};
use crate::worker::{Liveness, PollTiming, Worker};

#[derive(Debug)]
struct TrackedMetric {
    request: MetricRequest,
    /// Registration count per owner view
    owners: BTreeMap<MapId, u32>,
}

#[derive(Debug, Default)]
struct MetricRegistry {
    metrics: HashMap<MetricId, TrackedMetric>,
}

impl MetricRegistry {
    /// Returns true when the metric was not tracked before.
    fn add(&mut self, request: MetricRequest, owner: MapId) -> bool {
        match self.metrics.entry(request.metric_id) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut().owners.entry(owner).or_insert(0) += 1;
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(TrackedMetric {
                    request,
                    owners: BTreeMap::from([(owner, 1)]),
                });
                true
            }
        }
    }

    /// Drop `owner` from every metric; returns metrics left without owners.
    fn release_owner(&mut self, owner: MapId) -> Vec<MetricId> {
        let mut dropped = Vec::new();
        self.metrics.retain(|metric, tracked| {
            tracked.owners.remove(&owner);
            if tracked.owners.is_empty() {
                dropped.push(*metric);
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Returns true when the metric lost its last owner.
    fn release_one(&mut self, metric: MetricId, owner: MapId) -> bool {
        let Some(tracked) = self.metrics.get_mut(&metric) else {
            return false;
        };
        if let Some(count) = tracked.owners.get_mut(&owner) {
            *count -= 1;
            if *count == 0 {
                tracked.owners.remove(&owner);
            }
        }
        if tracked.owners.is_empty() {
            self.metrics.remove(&metric);
            true
        } else {
            false
        }
    }

    fn requests(&self) -> Vec<MetricRequest> {
        self.metrics.values().map(|t| t.request.clone()).collect()
    }
}

type ValueMap = DashMap<MetricId, CachedValue<MetricValue>>;

/// Shared last-value cache for link metrics.
#[derive(Debug)]
pub struct MetricCache {
    registry: Arc<Mutex<MetricRegistry>>,
    values: Arc<ValueMap>,
    worker: Worker,
}

impl MetricCache {
    /// Create the cache and start its background worker.
    ///
    /// When `renderer` is set, every merge that changes at least one value
    /// posts a [`RenderRequest::MetricValuesChanged`].
    pub fn new<Q>(query: Arc<Q>, timing: PollTiming, renderer: Option<RenderSender>) -> Self
    where
        Q: ValueQuery + 'static,
    {
        let registry = Arc::new(Mutex::new(MetricRegistry::default()));
        let values = Arc::new(ValueMap::new());

        let task_registry = registry.clone();
        let task_values = values.clone();
        let worker = Worker::spawn("metric cache", timing, move |liveness| {
            let query = query.clone();
            let registry = task_registry.clone();
            let values = task_values.clone();
            let renderer = renderer.clone();
            async move {
                fetch_iteration(query.as_ref(), &registry, &values, renderer.as_ref(), &liveness)
                    .await
            }
        });

        Self {
            registry,
            values,
            worker,
        }
    }

    /// Register one use of a metric by view `owner`.
    ///
    /// A metric that is already tracked only gains a registration; a new one
    /// wakes the worker so its value shows up without waiting a full period.
    pub fn add_metric(&self, request: MetricRequest, owner: MapId) -> Result<(), SyncError> {
        self.ensure_running()?;
        let metric = request.metric_id;
        if self.registry.lock().add(request, owner) {
            tracing::debug!(target: "metrics", "tracking {metric} for {owner}");
            self.worker.wake();
        }
        Ok(())
    }

    /// Release every registration of view `owner`.
    ///
    /// Metrics still registered by another view stay tracked with their
    /// cached value; the others are dropped together with their value.
    pub fn remove_metrics(&self, owner: MapId) {
        let mut registry = self.registry.lock();
        let dropped = registry.release_owner(owner);
        for metric in &dropped {
            self.values.remove(metric);
        }
        tracing::debug!(target: "metrics", "{owner} released, {} metrics dropped", dropped.len());
    }

    /// Release a single registration of `metric` by `owner`.
    pub fn release_metric(&self, metric: MetricId, owner: MapId) {
        let mut registry = self.registry.lock();
        if registry.release_one(metric, owner) {
            self.values.remove(&metric);
            tracing::debug!(target: "metrics", "{metric} no longer tracked");
        }
    }

    /// Replace the whole registration set of view `owner` in one step.
    ///
    /// Used when a view's content changes: metrics present both before and
    /// after keep their cached value and are never dropped in between.
    pub fn replace_metrics(
        &self,
        owner: MapId,
        requests: impl IntoIterator<Item = MetricRequest>,
    ) -> Result<(), SyncError> {
        self.ensure_running()?;
        let mut added = 0;
        {
            let mut registry = self.registry.lock();
            let previous: Vec<MetricId> = registry
                .metrics
                .iter()
                .filter(|(_, t)| t.owners.contains_key(&owner))
                .map(|(metric, _)| *metric)
                .collect();
            for tracked in registry.metrics.values_mut() {
                tracked.owners.remove(&owner);
            }
            for request in requests {
                if registry.add(request, owner) {
                    added += 1;
                }
            }
            for metric in previous {
                let orphaned = registry.metrics.get(&metric).is_some_and(|t| t.owners.is_empty());
                if orphaned {
                    registry.metrics.remove(&metric);
                    self.values.remove(&metric);
                }
            }
        }
        if added > 0 {
            tracing::debug!(target: "metrics", "{owner} added {added} new metrics");
            self.worker.wake();
        }
        Ok(())
    }

    /// Cached value of `metric`, `None` if not fetched yet or unknown.
    pub fn get_value(&self, metric: MetricId) -> Option<MetricValue> {
        self.values.get(&metric).map(|cached| cached.value.clone())
    }

    /// Cached value together with the moment it was fetched.
    pub fn get_cached(&self, metric: MetricId) -> Option<CachedValue<MetricValue>> {
        self.values.get(&metric).map(|cached| cached.value().clone())
    }

    /// Cached values of every metric in `metrics` that has one.
    pub fn get_values(&self, metrics: &[MetricId]) -> HashMap<MetricId, MetricValue> {
        metrics.iter().filter_map(|m| self.get_value(*m).map(|v| (*m, v))).collect()
    }

    /// Label text of the descriptors placed at `location`.
    pub fn format_values(
        &self,
        descriptors: &[LabelDescriptor],
        location: LabelLocation,
    ) -> String {
        format::format_values(descriptors, location, |metric| self.get_value(metric))
    }

    /// Most critical threshold severity among the cached values of `metrics`.
    pub fn threshold_severity(&self, metrics: &[MetricId]) -> Severity {
        most_critical_severity(
            metrics.iter().filter_map(|m| self.get_value(*m)).map(|v| v.severity),
        )
    }

    pub fn is_tracked(&self, metric: MetricId) -> bool {
        self.registry.lock().metrics.contains_key(&metric)
    }

    pub fn tracked_count(&self) -> usize {
        self.registry.lock().metrics.len()
    }

    /// Views registered for `metric`, in map id order.
    pub fn owners(&self, metric: MetricId) -> Vec<MapId> {
        self.registry
            .lock()
            .metrics
            .get(&metric)
            .map(|t| t.owners.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of registrations of `metric` by `owner`.
    pub fn registration_count(&self, metric: MetricId, owner: MapId) -> u32 {
        self.registry
            .lock()
            .metrics
            .get(&metric)
            .and_then(|t| t.owners.get(&owner).copied())
            .unwrap_or(0)
    }

    /// Stop the worker without waiting for it.
    pub fn shutdown(&self) {
        self.worker.shutdown();
    }

    /// Stop the worker and wait for its current iteration to finish.
    pub async fn stop(self) {
        self.worker.stop().await;
    }

    fn ensure_running(&self) -> Result<(), SyncError> {
        if self.worker.is_running() {
            Ok(())
        } else {
            Err(SyncError::Disposed {
                component: "metric cache".to_string(),
            })
        }
    }
}

async fn fetch_iteration<Q: ValueQuery>(
    query: &Q,
    registry: &Mutex<MetricRegistry>,
    values: &ValueMap,
    renderer: Option<&RenderSender>,
    liveness: &Liveness,
) -> anyhow::Result<()> {
    let requests = registry.lock().requests();
    if requests.is_empty() {
        return Ok(());
    }

    tracing::trace!(target: "metrics", "fetching {} metrics", requests.len());
    let fetched = query
        .get_last_values(&requests)
        .await
        .map_err(|err| SyncError::fetch("get_last_values", &err))?;

    if !liveness.is_running() {
        tracing::debug!(
            target: "metrics",
            "discarding {} values fetched after disposal",
            fetched.len()
        );
        return Ok(());
    }

    let retrieved_at = Utc::now();
    let mut changed = Vec::new();
    {
        let registry = registry.lock();
        for (metric, value) in fetched {
            // Released while the query was in flight
            if !registry.metrics.contains_key(&metric) {
                continue;
            }
            let is_new = values.get(&metric).is_none_or(|cached| cached.value != value);
            values.insert(metric, CachedValue::new(value, retrieved_at));
            if is_new {
                changed.push(metric);
            }
        }
    }

    if !changed.is_empty() {
        changed.sort();
        tracing::trace!(target: "metrics", "{} metric values changed", changed.len());
        if let Some(renderer) = renderer {
            renderer.post(RenderRequest::MetricValuesChanged(changed));
        }
    }
    Ok(())
}
