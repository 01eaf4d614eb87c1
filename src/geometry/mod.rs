//! Link label placement.
//!
//! A straight link is cut into [`LINK_SECTIONS`] equal sections:
//!
//! ```text
//!  A |  1  |  2   3   4  |  5   6   7  |  8   9  10  | 11  | B
//!    | if  |   near A    |   center    |   near B    | if  |
//! ```
//!
//! Sections 1 and 11 hold the interface names of the two endpoints
//! ([`endpoint_anchor`]); the remaining nine form three zones of
//! [`ZONE_SECTIONS`] sections for metric labels ([`place_label`]). Inside a
//! zone a label sits at the link's configured percentage, or, for parallel
//! links between the same two nodes, at a slot derived from its duplicate
//! index so that sibling labels do not overlap.
//!
//! Everything here is pure and may be called from any thread.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LABEL_PERCENT, LINK_SECTIONS, ZONE_SECTIONS};
use crate::models::{LinkRouting, MapLink};

/// A point in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Label zone along a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelLocation {
    NearA,
    #[default]
    Center,
    NearB,
}

impl LabelLocation {
    /// Sections between endpoint A and the start of this zone.
    pub const fn base_sections(self) -> u32 {
        match self {
            Self::NearA => 1,
            Self::Center => 1 + ZONE_SECTIONS,
            Self::NearB => 1 + 2 * ZONE_SECTIONS,
        }
    }
}

/// One end of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    A,
    B,
}

/// Label settings of one link in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPlacement {
    pub location: LabelLocation,
    pub duplicate_index: Option<u32>,
    /// Number of parallel links; 0 for a single link
    pub duplicate_count: u32,
    pub direction_inverted: bool,
    /// Position inside the zone in percent, used when there are no duplicates
    pub label_percent: u8,
}

impl LabelPlacement {
    pub const fn new(location: LabelLocation) -> Self {
        Self {
            location,
            duplicate_index: None,
            duplicate_count: 0,
            direction_inverted: false,
            label_percent: DEFAULT_LABEL_PERCENT,
        }
    }

    /// Settings of `link` for the zone at `location`.
    pub fn from_link(link: &MapLink, location: LabelLocation) -> Self {
        Self {
            location,
            duplicate_index: link.duplicate_index,
            duplicate_count: link.duplicate_count,
            direction_inverted: link.direction_inverted,
            label_percent: link.label_percent,
        }
    }

    #[must_use]
    pub const fn with_duplicate(mut self, index: u32, count: u32) -> Self {
        self.duplicate_index = Some(index);
        self.duplicate_count = count;
        self
    }

    #[must_use]
    pub const fn inverted(mut self, inverted: bool) -> Self {
        self.direction_inverted = inverted;
        self
    }

    #[must_use]
    pub const fn with_percent(mut self, percent: u8) -> Self {
        self.label_percent = percent;
        self
    }

    /// Offset from the zone start, as a fraction of the zone length.
    fn zone_fraction(&self) -> f64 {
        if self.duplicate_count > 0 {
            let count = self.duplicate_count;
            let index = self.duplicate_index.unwrap_or(0).min(count);
            let fraction = f64::from(index) + 1.0;
            let fraction = fraction / (f64::from(count) + 2.0);
            if self.direction_inverted {
                1.0 - fraction
            } else {
                fraction
            }
        } else {
            f64::from(self.label_percent.min(100)) / 100.0
        }
    }
}

/// Anchor point of a metric label on the straight link from `a` to `b`.
///
/// Identical inputs always give the identical point. A zero-length link
/// places every label on `a`.
///
/// ```rust
/// use netmap_sync::geometry::{place_label, LabelLocation, LabelPlacement, Point};
///
/// let anchor = place_label(
///     Point::new(0.0, 0.0),
///     Point::new(1100.0, 0.0),
///     &LabelPlacement::new(LabelLocation::Center),
/// );
/// assert_eq!(anchor, Point::new(550.0, 0.0));
/// ```
pub fn place_label(a: Point, b: Point, placement: &LabelPlacement) -> Point {
    let length = distance(a, b);
    if length == 0.0 {
        return a;
    }
    let section = length / f64::from(LINK_SECTIONS);
    let zone = section * f64::from(ZONE_SECTIONS);
    let along = section * f64::from(placement.location.base_sections())
        + zone * placement.zone_fraction();
    project(a, b, along)
}

/// Anchor point of the interface name shown at `endpoint`: the middle of
/// the first or last section.
pub fn endpoint_anchor(a: Point, b: Point, endpoint: Endpoint) -> Point {
    let length = distance(a, b);
    if length == 0.0 {
        return a;
    }
    let section = length / f64::from(LINK_SECTIONS);
    let along = match endpoint {
        Endpoint::A => section * 0.5,
        Endpoint::B => section * (f64::from(LINK_SECTIONS) - 0.5),
    };
    project(a, b, along)
}

/// Anchor of a metric label on a link drawn along `route`.
///
/// Only links routed through bend points (a route with interior points)
/// put `NearA` on the first point, `NearB` on the last and `Center` in the
/// middle of the route. Every other link, Manhattan included, uses
/// [`place_label`] between the first and last route points. Returns `None`
/// for an empty route.
pub fn place_link_label(link: &MapLink, route: &[Point], location: LabelLocation) -> Option<Point> {
    let (first, last) = (route.first()?, route.last()?);
    if link.routing == LinkRouting::BendPoints && route.len() > 2 {
        return Some(match location {
            LabelLocation::NearA => *first,
            LabelLocation::NearB => *last,
            LabelLocation::Center => route_middle(route),
        });
    }
    Some(place_label(*first, *last, &LabelPlacement::from_link(link, location)))
}

/// Middle point of a polyline: its middle vertex for an odd number of
/// points, otherwise the midpoint of its middle segment.
fn route_middle(route: &[Point]) -> Point {
    let n = route.len();
    if n % 2 == 1 {
        return route[(n - 1) / 2];
    }
    let (p1, p2) = (route[n / 2 - 1], route[n / 2]);
    Point::new(p1.x + (p2.x - p1.x) / 2.0, p1.y + (p2.y - p1.y) / 2.0)
}

fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Move `along` units from `a` towards `b`.
fn project(a: Point, b: Point, along: f64) -> Point {
    let angle = (b.y - a.y).abs().atan2((b.x - a.x).abs());
    let dx = along * angle.cos();
    let dy = along * angle.sin();
    let x = if b.x >= a.x { a.x + dx } else { a.x - dx };
    let y = if b.y >= a.y { a.y + dy } else { a.y - dy };
    Point::new(x, y)
}
