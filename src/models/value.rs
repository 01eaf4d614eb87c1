//! Metric values and cache entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MetricId, ObjectId};

/// Severity of the most critical active threshold on a metric, or status of
/// an object.
///
/// Ordering follows criticality: `Normal < Warning < Minor < Major <
/// Critical`. [`Severity::Unknown`] sorts last and is never considered "more
/// critical" than a known value; use [`Severity::is_known`] before comparing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Minor,
    Major,
    Critical,
    #[default]
    Unknown,
}

impl Severity {
    /// Whether this is an actual severity rather than [`Severity::Unknown`].
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// Last known value of one metric as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Object the metric is collected on
    pub node_id: ObjectId,
    /// Metric identifier
    pub metric_id: MetricId,
    /// Display name of the metric
    pub name: String,
    /// Textual value as formatted by the backend
    pub value: String,
    /// Severity of the most critical active threshold
    #[serde(default)]
    pub severity: Severity,
    /// Collection timestamp reported by the backend
    pub timestamp: DateTime<Utc>,
}

impl MetricValue {
    pub fn new(
        node_id: ObjectId,
        metric_id: MetricId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            metric_id,
            name: name.into(),
            value: value.into(),
            severity: Severity::Unknown,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// One metric to fetch in a batched last-values query.
///
/// Table metrics additionally name the column and instance (row) whose cell
/// should be returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricRequest {
    pub node_id: ObjectId,
    pub metric_id: MetricId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl MetricRequest {
    pub fn item(node_id: ObjectId, metric_id: MetricId) -> Self {
        Self {
            node_id,
            metric_id,
            column: None,
            instance: None,
        }
    }

    pub fn table_cell(
        node_id: ObjectId,
        metric_id: MetricId,
        column: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            node_id,
            metric_id,
            column: Some(column.into()),
            instance: Some(instance.into()),
        }
    }
}

/// A cached payload together with the moment it was retrieved.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<T> {
    pub value: T,
    pub retrieved_at: DateTime<Utc>,
}

impl<T> CachedValue<T> {
    pub fn new(value: T, retrieved_at: DateTime<Utc>) -> Self {
        Self {
            value,
            retrieved_at,
        }
    }
}

/// Per-node telemetry summary slot.
///
/// `NotFetched` means "not yet known"; a fetched empty vector means the
/// backend answered and the node has no summary values.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSummary {
    NotFetched,
    Fetched(CachedValue<Vec<MetricValue>>),
}

impl NodeSummary {
    /// Values of a fetched summary, `None` while not yet known.
    pub fn values(&self) -> Option<&[MetricValue]> {
        match self {
            Self::NotFetched => None,
            Self::Fetched(cached) => Some(&cached.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Normal < Severity::Warning);
        assert!(Severity::Major < Severity::Critical);
        assert!(Severity::Critical < Severity::Unknown);
        assert!(!Severity::Unknown.is_known());
        assert!(Severity::Normal.is_known());
    }

    #[test]
    fn test_not_fetched_is_distinct_from_empty() {
        let empty = NodeSummary::Fetched(CachedValue::new(Vec::new(), Utc::now()));
        assert_eq!(NodeSummary::NotFetched.values(), None);
        assert_eq!(empty.values(), Some(&[][..]));
    }
}
