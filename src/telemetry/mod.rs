//! Per-node telemetry summaries for the large-label display mode.
//!
//! Each open map view owns one [`NodeTelemetryCache`]. It tracks the
//! data-bearing nodes of the view's current content and keeps their summary
//! values (the values shown in a node's tooltip) fresh with one batched
//! [`SummaryQuery::get_summary_values`] per period.
//!
//! After a merge only the elements whose data actually changed are posted to
//! the renderer: the node itself, every link touching it and every
//! decoration displaying it. The view is never repainted as a whole.
//!
//! A node enters the cache as [`NodeSummary::NotFetched`] and is fetched
//! again once its summary is older than one period. Fetching is skipped
//! while the large-label mode is off.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::SummaryQuery;
use crate::core::SyncError;
use crate::models::{CachedValue, MapContent, MapId, MetricValue, NodeSummary, ObjectId};
use crate::render::{MapElement, RenderRequest, RenderSender};
use crate::worker::{Liveness, PollTiming, Worker};

#[derive(Debug, Default)]
struct TelemetryState {
    entries: HashMap<ObjectId, NodeSummary>,
    /// Monotonic fetch time per entry; the wall-clock `retrieved_at` of a
    /// summary is for display only.
    fetched_at: HashMap<ObjectId, Instant>,
    content: MapContent,
}

impl TelemetryState {
    fn needs_fetch(&self, max_age: Duration, now: Instant) -> bool {
        self.entries.iter().any(|(node, entry)| match entry {
            NodeSummary::NotFetched => true,
            NodeSummary::Fetched(_) => self
                .fetched_at
                .get(node)
                .is_none_or(|at| now.saturating_duration_since(*at) >= max_age),
        })
    }
}

/// Summary value cache of one open map view.
#[derive(Debug)]
pub struct NodeTelemetryCache {
    map: MapId,
    state: Arc<Mutex<TelemetryState>>,
    enabled: Arc<AtomicBool>,
    worker: Worker,
}

impl NodeTelemetryCache {
    /// Create the cache for view `map` and start its worker.
    ///
    /// `enabled` tells whether the large-label mode is initially on.
    pub fn new<Q>(
        map: MapId,
        query: Arc<Q>,
        timing: PollTiming,
        renderer: RenderSender,
        enabled: bool,
    ) -> Self
    where
        Q: SummaryQuery + 'static,
    {
        let state = Arc::new(Mutex::new(TelemetryState::default()));
        let enabled = Arc::new(AtomicBool::new(enabled));
        let max_age = timing.period;

        let task_state = state.clone();
        let task_enabled = enabled.clone();
        let worker = Worker::spawn("node telemetry", timing, move |liveness| {
            let query = query.clone();
            let state = task_state.clone();
            let enabled = task_enabled.clone();
            let renderer = renderer.clone();
            async move {
                if !enabled.load(Ordering::Acquire) {
                    return Ok(());
                }
                refresh_iteration(query.as_ref(), &state, max_age, &renderer, &liveness).await
            }
        });

        tracing::debug!(target: "telemetry", "telemetry cache created for {map}");
        Self {
            map,
            state,
            enabled,
            worker,
        }
    }

    pub fn map(&self) -> MapId {
        self.map
    }

    /// Update the tracked nodes to match the view's new content.
    ///
    /// Entries of nodes that left the view are purged; new data-bearing
    /// nodes are inserted as not yet fetched and trigger an early fetch.
    pub fn content_changed(&self, content: MapContent) -> Result<(), SyncError> {
        if !self.worker.is_running() {
            return Err(SyncError::Disposed {
                component: format!("telemetry cache of {}", self.map),
            });
        }

        let present: HashSet<ObjectId> = content.data_node_ids().collect();
        let (purged, added) = {
            let mut state = self.state.lock();
            let before = state.entries.len();
            state.entries.retain(|node, _| present.contains(node));
            state.fetched_at.retain(|node, _| present.contains(node));
            let purged = before - state.entries.len();

            let mut added = 0;
            for node in present {
                if let Entry::Vacant(entry) = state.entries.entry(node) {
                    entry.insert(NodeSummary::NotFetched);
                    added += 1;
                }
            }
            state.content = content;
            (purged, added)
        };

        tracing::debug!(
            target: "telemetry",
            "{} content changed: {added} nodes added, {purged} purged",
            self.map
        );
        if added > 0 && self.is_enabled() {
            self.worker.wake();
        }
        Ok(())
    }

    /// Cached summary values of `node`; `None` until the first fetch
    /// completes or when the node is not part of the view.
    pub fn get_cached_node_values(&self, node: ObjectId) -> Option<Vec<MetricValue>> {
        self.state.lock().entries.get(&node).and_then(|s| s.values().map(<[MetricValue]>::to_vec))
    }

    /// Full cache slot of `node`, including the not-yet-fetched state.
    pub fn summary(&self, node: ObjectId) -> Option<NodeSummary> {
        self.state.lock().entries.get(&node).cloned()
    }

    /// Tracked node ids in ascending order.
    pub fn tracked_nodes(&self) -> Vec<ObjectId> {
        let mut nodes: Vec<ObjectId> = self.state.lock().entries.keys().copied().collect();
        nodes.sort();
        nodes
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Switch the large-label mode. Turning it on fetches right away.
    pub fn set_enabled(&self, enabled: bool) {
        let was_enabled = self.enabled.swap(enabled, Ordering::AcqRel);
        if enabled && !was_enabled {
            tracing::debug!(target: "telemetry", "telemetry enabled for {}", self.map);
            self.worker.wake();
        }
    }

    /// Stop the worker. A fetch still in flight is discarded on completion.
    pub fn dispose(&self) {
        self.worker.shutdown();
    }

    pub fn is_disposed(&self) -> bool {
        !self.worker.is_running()
    }

    /// Dispose and wait for the worker to exit.
    pub async fn stop(self) {
        self.worker.stop().await;
    }
}

async fn refresh_iteration<Q: SummaryQuery>(
    query: &Q,
    state: &Mutex<TelemetryState>,
    max_age: Duration,
    renderer: &RenderSender,
    liveness: &Liveness,
) -> anyhow::Result<()> {
    let nodes = {
        let state = state.lock();
        if !state.needs_fetch(max_age, Instant::now()) {
            return Ok(());
        }
        let mut nodes: Vec<ObjectId> = state.entries.keys().copied().collect();
        nodes.sort();
        nodes
    };

    tracing::trace!(target: "telemetry", "fetching summaries of {} nodes", nodes.len());
    let mut fetched = query
        .get_summary_values(&nodes)
        .await
        .map_err(|err| SyncError::fetch("get_summary_values", &err))?;

    if !liveness.is_running() {
        tracing::debug!(target: "telemetry", "discarding summaries fetched after disposal");
        return Ok(());
    }

    let retrieved_at = Utc::now();
    let fetched_at = Instant::now();
    let requests = {
        let mut guard = state.lock();
        let state = &mut *guard;
        let mut changed = HashSet::new();
        for node in &nodes {
            // Purged while the query was in flight
            let Some(entry) = state.entries.get_mut(node) else {
                continue;
            };
            let values = fetched.remove(node).unwrap_or_default();
            let is_changed = match entry.values() {
                None => !values.is_empty(),
                Some(previous) => previous != values.as_slice(),
            };
            *entry = NodeSummary::Fetched(CachedValue::new(values, retrieved_at));
            state.fetched_at.insert(*node, fetched_at);
            if is_changed {
                changed.insert(*node);
            }
        }
        refresh_requests(&state.content, &changed)
    };

    if !requests.is_empty() {
        tracing::trace!(target: "telemetry", "posting {} refresh requests", requests.len());
        renderer.post_all(requests);
    }
    Ok(())
}

/// Repaints needed after the summaries of `changed` nodes changed.
fn refresh_requests(content: &MapContent, changed: &HashSet<ObjectId>) -> Vec<RenderRequest> {
    if changed.is_empty() {
        return Vec::new();
    }

    let nodes = content
        .nodes
        .iter()
        .filter(|n| changed.contains(&n.object_id))
        .map(|n| RenderRequest::Refresh(MapElement::Node(n.object_id)));
    let links = content
        .links
        .iter()
        .filter(|l| changed.contains(&l.object_a) || changed.contains(&l.object_b))
        .map(|l| RenderRequest::Refresh(MapElement::Link(l.id)));
    let decorations = content
        .decorations
        .iter()
        .filter(|d| d.object_ids.iter().any(|o| changed.contains(o)))
        .map(|d| RenderRequest::UpdateDecorationFigure(d.id));

    nodes.chain(links).chain(decorations).collect()
}
