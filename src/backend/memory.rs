//! In-memory backend.
//!
//! Holds metric values, node summaries and known objects in [`DashMap`]s and
//! records every call so tests can assert on batching. Failure injection
//! turns every subsequent call into a [`SyncError::TransientFetch`] until it
//! is switched off again.

use anyhow::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{ObjectSync, SummaryQuery, SyncFlags, ValueQuery};
use crate::core::SyncError;
use crate::models::{MapId, MetricId, MetricRequest, MetricValue, ObjectId};

/// One recorded `sync_object_set` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCall {
    pub owner: MapId,
    pub objects: Vec<ObjectId>,
    pub flags: SyncFlags,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    values: DashMap<MetricId, MetricValue>,
    summaries: DashMap<ObjectId, Vec<MetricValue>>,
    objects: DashMap<ObjectId, ()>,
    failing: AtomicBool,
    value_queries: AtomicUsize,
    summary_queries: AtomicUsize,
    sync_calls: Mutex<Vec<SyncCall>>,
    synced: Mutex<HashSet<ObjectId>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, value: MetricValue) {
        self.values.insert(value.metric_id, value);
    }

    pub fn remove_value(&self, metric: MetricId) {
        self.values.remove(&metric);
    }

    pub fn set_summary(&self, node: ObjectId, values: Vec<MetricValue>) {
        self.summaries.insert(node, values);
    }

    pub fn add_object(&self, object: ObjectId) {
        self.objects.insert(object, ());
    }

    /// Make every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn value_query_count(&self) -> usize {
        self.value_queries.load(Ordering::SeqCst)
    }

    pub fn summary_query_count(&self) -> usize {
        self.summary_queries.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> Vec<SyncCall> {
        self.sync_calls.lock().clone()
    }

    /// Objects synchronized at least once.
    pub fn synced_objects(&self) -> HashSet<ObjectId> {
        self.synced.lock().clone()
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::TransientFetch {
                operation: operation.to_string(),
                reason: "backend unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ValueQuery for InMemoryBackend {
    async fn get_last_values(
        &self,
        requests: &[MetricRequest],
    ) -> Result<HashMap<MetricId, MetricValue>> {
        self.value_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available("get_last_values")?;

        Ok(requests
            .iter()
            .filter_map(|r| self.values.get(&r.metric_id).map(|v| (r.metric_id, v.clone())))
            .collect())
    }
}

impl SummaryQuery for InMemoryBackend {
    async fn get_summary_values(
        &self,
        nodes: &[ObjectId],
    ) -> Result<HashMap<ObjectId, Vec<MetricValue>>> {
        self.summary_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available("get_summary_values")?;

        Ok(nodes
            .iter()
            .filter_map(|n| self.summaries.get(n).map(|v| (*n, v.clone())))
            .collect())
    }
}

impl ObjectSync for InMemoryBackend {
    async fn sync_object_set(
        &self,
        objects: &[ObjectId],
        owner: MapId,
        flags: SyncFlags,
    ) -> Result<()> {
        self.check_available("sync_object_set")?;

        self.sync_calls.lock().push(SyncCall {
            owner,
            objects: objects.to_vec(),
            flags,
        });

        let known: Vec<ObjectId> =
            objects.iter().copied().filter(|o| self.objects.contains_key(o)).collect();
        if known.len() < objects.len() && !flags.allow_partial {
            return Err(SyncError::UnknownReference {
                kind: "object".to_string(),
                id: format!("{} of {} requested", objects.len() - known.len(), objects.len()),
            }
            .into());
        }
        self.synced.lock().extend(known);
        Ok(())
    }
}
