//! Shared data models for map synchronization
//!
//! This module provides the identifiers and value types that flow between the
//! caches, the background workers, the external backend and the renderer.
//!
//! - [`map`] - Map content as seen by a view: nodes, links and decorations
//! - [`value`] - Metric values, fetch requests and cached entries

pub mod map;
pub mod value;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use map::{LinkRouting, MapContent, MapDecoration, MapLink, MapNode};
pub use value::{CachedValue, MetricRequest, MetricValue, NodeSummary, Severity};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a backend object (node, interface, ...).
    ObjectId,
    "object"
);

id_type!(
    /// Identifier of a map object. One open map view is keyed by this id;
    /// cloned windows of the same map share it.
    MapId,
    "map"
);

id_type!(
    /// Identifier of a collected metric (DCI).
    MetricId,
    "metric"
);

id_type!(
    /// Identifier of a link element inside a map.
    LinkId,
    "link"
);

id_type!(
    /// Identifier of a decoration element inside a map.
    ElementId,
    "element"
);
