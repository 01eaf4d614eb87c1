//! Link colouring derived from cached values.

use crate::constants::LINK_UTILIZATION_THRESHOLDS;
use crate::models::Severity;

/// Most critical known severity, or [`Severity::Unknown`] if none is known.
pub fn most_critical_severity(severities: impl IntoIterator<Item = Severity>) -> Severity {
    let mut result = Severity::Unknown;
    for severity in severities {
        if !severity.is_known() {
            continue;
        }
        if !result.is_known() || severity > result {
            result = severity;
        }
        if result == Severity::Critical {
            break;
        }
    }
    result
}

/// Status of a link from the status of its endpoint objects and, when
/// enabled, the thresholds of its metrics.
///
/// Threshold severity wins when it is more critical than the object status
/// or when the object status is unknown.
pub fn link_status(
    object_statuses: impl IntoIterator<Item = Severity>,
    threshold_severities: impl IntoIterator<Item = Severity>,
    use_thresholds: bool,
) -> Severity {
    let status = most_critical_severity(object_statuses);
    if !use_thresholds {
        return status;
    }
    let threshold = most_critical_severity(threshold_severities);
    if threshold.is_known() && (!status.is_known() || threshold > status) {
        threshold
    } else {
        status
    }
}

/// Colour bucket for an interface utilization given in tenths of a percent.
///
/// Returns an index in `0..LINK_UTILIZATION_THRESHOLDS.len() - 1`.
pub fn utilization_level(utilization: u32) -> usize {
    let last = LINK_UTILIZATION_THRESHOLDS.len() - 1;
    let mut level = 0;
    while level < last && utilization >= LINK_UTILIZATION_THRESHOLDS[level] {
        level += 1;
    }
    level
}
