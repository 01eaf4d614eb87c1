//! Label text built from cached metric values.

use serde::{Deserialize, Serialize};

use crate::geometry::LabelLocation;
use crate::models::{MetricId, MetricValue};

/// One metric shown on a link label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDescriptor {
    pub metric_id: MetricId,
    /// Which of the three link label zones the value is shown in
    pub location: LabelLocation,
    /// Format string with `%s` placeholders; `%%` prints a literal percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LabelDescriptor {
    pub fn new(metric_id: MetricId, location: LabelLocation) -> Self {
        Self {
            metric_id,
            location,
            format: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Display text for `value`.
    pub fn render(&self, value: &MetricValue) -> String {
        match &self.format {
            Some(format) => apply_format(format, &value.value),
            None => value.value.clone(),
        }
    }
}

/// Substitute every `%s` in `format` with `value`.
///
/// Unrecognized `%` sequences are copied verbatim.
pub fn apply_format(format: &str, value: &str) -> String {
    let mut out = String::with_capacity(format.len() + value.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                out.push_str(value);
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}

/// Newline-joined text of every descriptor at `location` that has a value.
///
/// `lookup` is expected to be a non-blocking cache read.
pub fn format_values<F>(
    descriptors: &[LabelDescriptor],
    location: LabelLocation,
    lookup: F,
) -> String
where
    F: Fn(MetricId) -> Option<MetricValue>,
{
    descriptors
        .iter()
        .filter(|d| d.location == location)
        .filter_map(|d| lookup(d.metric_id).map(|value| d.render(&value)))
        .collect::<Vec<_>>()
        .join("\n")
}
