//! Map content as seen by one open view.

use serde::{Deserialize, Serialize};

use super::{ElementId, LinkId, ObjectId};
use crate::constants::DEFAULT_LABEL_PERCENT;

/// How a link is routed between its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkRouting {
    /// Straight line between the two nodes
    #[default]
    Direct,
    /// Orthogonal segments chosen by the renderer
    Manhattan,
    /// User-defined bend points
    BendPoints,
}

/// A link between two map nodes.
///
/// Parallel links between the same pair of nodes carry a duplicate index and
/// the number of such links so that their labels can be spread along the
/// zone instead of overlapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLink {
    pub id: LinkId,
    pub object_a: ObjectId,
    pub object_b: ObjectId,
    #[serde(default)]
    pub duplicate_index: Option<u32>,
    #[serde(default)]
    pub duplicate_count: u32,
    /// Logical direction is reversed relative to the stored endpoint order
    #[serde(default)]
    pub direction_inverted: bool,
    /// Label position inside its zone, in percent
    #[serde(default = "default_label_percent")]
    pub label_percent: u8,
    #[serde(default)]
    pub routing: LinkRouting,
}

fn default_label_percent() -> u8 {
    DEFAULT_LABEL_PERCENT
}

impl MapLink {
    pub fn new(id: LinkId, object_a: ObjectId, object_b: ObjectId) -> Self {
        Self {
            id,
            object_a,
            object_b,
            duplicate_index: None,
            duplicate_count: 0,
            direction_inverted: false,
            label_percent: DEFAULT_LABEL_PERCENT,
            routing: LinkRouting::Direct,
        }
    }

    /// Mark this link as one of `count` parallel links, at position `index`.
    #[must_use]
    pub fn with_duplicate(mut self, index: u32, count: u32) -> Self {
        self.duplicate_index = Some(index);
        self.duplicate_count = count;
        self
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.direction_inverted = true;
        self
    }

    #[must_use]
    pub fn with_routing(mut self, routing: LinkRouting) -> Self {
        self.routing = routing;
        self
    }

    pub fn touches(&self, object: ObjectId) -> bool {
        self.object_a == object || self.object_b == object
    }
}

/// A node placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapNode {
    pub object_id: ObjectId,
    /// Whether the backend collects data for this object (text boxes and
    /// other passive shapes do not)
    pub collects_data: bool,
}

impl MapNode {
    pub fn data(object_id: ObjectId) -> Self {
        Self {
            object_id,
            collects_data: true,
        }
    }

    pub fn passive(object_id: ObjectId) -> Self {
        Self {
            object_id,
            collects_data: false,
        }
    }
}

/// A decoration overlay that displays data of one or more objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDecoration {
    pub id: ElementId,
    pub object_ids: Vec<ObjectId>,
}

/// Snapshot of a view's content used by the telemetry cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapContent {
    #[serde(default)]
    pub nodes: Vec<MapNode>,
    #[serde(default)]
    pub links: Vec<MapLink>,
    #[serde(default)]
    pub decorations: Vec<MapDecoration>,
}

impl MapContent {
    /// Object ids of nodes the backend collects data for.
    pub fn data_node_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.nodes.iter().filter(|n| n.collects_data).map(|n| n.object_id)
    }
}
