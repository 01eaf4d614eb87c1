//! Membership tables of the subscription coordinator.
//!
//! Pure bookkeeping with no I/O: reference counts per map view, per-view
//! request buckets, and per-object owner sets with the current poll owner.
//!
//! # Invariants
//!
//! - an object is tracked iff its owner set is non-empty
//! - every tracked object sits in exactly one bucket: its poll owner's
//! - every owner in an owner set has a reference count > 0

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{MapId, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ObjectEntry {
    owners: BTreeSet<MapId>,
    poll_owner: MapId,
}

/// Outcome of [`ObjectRegistry::add_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AddOutcome {
    /// View was already open; only its reference count changed
    Reopened { ref_count: u32 },
    /// First open of the view; `created` objects got new entries
    Opened { created: usize, shared: usize },
}

/// Outcome of [`ObjectRegistry::remove_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoveOutcome {
    /// View was not open
    NotOpen,
    /// Other instances of the view remain open
    StillOpen { ref_count: u32 },
    /// View closed; objects were dropped or handed over
    Closed {
        dropped: Vec<ObjectId>,
        transferred: Vec<(ObjectId, MapId)>,
    },
}

#[derive(Debug, Default)]
pub(crate) struct ObjectRegistry {
    ref_counts: BTreeMap<MapId, u32>,
    buckets: BTreeMap<MapId, BTreeSet<ObjectId>>,
    objects: BTreeMap<ObjectId, ObjectEntry>,
}

impl ObjectRegistry {
    pub(crate) fn add_objects(
        &mut self,
        map: MapId,
        objects: impl IntoIterator<Item = ObjectId>,
    ) -> AddOutcome {
        if let Some(count) = self.ref_counts.get_mut(&map) {
            *count += 1;
            return AddOutcome::Reopened { ref_count: *count };
        }
        self.ref_counts.insert(map, 1);

        let bucket = self.buckets.entry(map).or_default();
        let mut created = 0;
        let mut shared = 0;
        for object in objects {
            match self.objects.get_mut(&object) {
                Some(entry) => {
                    if entry.owners.insert(map) {
                        shared += 1;
                    }
                }
                None => {
                    self.objects.insert(
                        object,
                        ObjectEntry {
                            owners: BTreeSet::from([map]),
                            poll_owner: map,
                        },
                    );
                    bucket.insert(object);
                    created += 1;
                }
            }
        }
        AddOutcome::Opened { created, shared }
    }

    pub(crate) fn remove_objects(&mut self, map: MapId) -> RemoveOutcome {
        let Some(count) = self.ref_counts.get_mut(&map) else {
            return RemoveOutcome::NotOpen;
        };
        *count -= 1;
        if *count > 0 {
            return RemoveOutcome::StillOpen { ref_count: *count };
        }
        self.ref_counts.remove(&map);
        let bucket = self.buckets.remove(&map).unwrap_or_default();

        // The view may reference objects polled by another view; those never
        // entered its bucket, so walk every owner set.
        let mut dropped = Vec::new();
        for (object, entry) in &mut self.objects {
            if entry.owners.remove(&map) && entry.owners.is_empty() {
                dropped.push(*object);
            }
        }
        for object in &dropped {
            self.objects.remove(object);
        }

        let mut transferred = Vec::new();
        for object in bucket {
            let Some(entry) = self.objects.get_mut(&object) else {
                continue;
            };
            // Lowest remaining map id takes over polling.
            if let Some(&next) = entry.owners.first() {
                entry.poll_owner = next;
                self.buckets.entry(next).or_default().insert(object);
                transferred.push((object, next));
            }
        }

        if self.ref_counts.is_empty() {
            self.clear();
        }
        RemoveOutcome::Closed {
            dropped,
            transferred,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.ref_counts.clear();
        self.buckets.clear();
        self.objects.clear();
    }

    pub(crate) fn ref_count(&self, map: MapId) -> u32 {
        self.ref_counts.get(&map).copied().unwrap_or(0)
    }

    pub(crate) fn poll_owner(&self, object: ObjectId) -> Option<MapId> {
        self.objects.get(&object).map(|e| e.poll_owner)
    }

    pub(crate) fn owners(&self, object: ObjectId) -> Vec<MapId> {
        self.objects.get(&object).map(|e| e.owners.iter().copied().collect()).unwrap_or_default()
    }

    pub(crate) fn bucket(&self, map: MapId) -> Vec<ObjectId> {
        self.buckets.get(&map).map(|b| b.iter().copied().collect()).unwrap_or_default()
    }

    pub(crate) fn is_tracked(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    pub(crate) fn tracked_count(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn open_views(&self) -> usize {
        self.ref_counts.len()
    }

    /// Non-empty buckets, one batch per poll owner.
    pub(crate) fn batches(&self) -> Vec<(MapId, Vec<ObjectId>)> {
        self.buckets
            .iter()
            .filter(|(_, objects)| !objects.is_empty())
            .map(|(map, objects)| (*map, objects.iter().copied().collect()))
            .collect()
    }
}
