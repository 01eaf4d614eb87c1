use netmap_sync::backend::memory::InMemoryBackend;
use netmap_sync::geometry::LabelLocation;
use netmap_sync::metrics::{LabelDescriptor, MetricCache};
use netmap_sync::models::{MapId, MetricId, MetricRequest, MetricValue, ObjectId, Severity};
use netmap_sync::render::{RenderRequest, render_channel};
use netmap_sync::test_utils::{fast_timing, wait_until};
use std::sync::Arc;
use std::time::Duration;

const NODE: ObjectId = ObjectId(7);
const SHARED: MetricId = MetricId(42);
const M1: MapId = MapId(1);
const M2: MapId = MapId(2);

#[tokio::test]
async fn test_shared_metric_fetched_once_for_both_views() {
    let backend = Arc::new(InMemoryBackend::new());
    let (renderer, mut queue) = render_channel();
    let cache = MetricCache::new(backend.clone(), fast_timing(), Some(renderer));

    cache.add_metric(MetricRequest::item(NODE, SHARED), M1).unwrap();
    cache.add_metric(MetricRequest::item(NODE, SHARED), M2).unwrap();
    assert_eq!(cache.tracked_count(), 1);
    assert_eq!(cache.owners(SHARED), vec![M1, M2]);

    backend.set_value(MetricValue::new(NODE, SHARED, "Inbound traffic", "87"));
    assert!(wait_until(Duration::from_secs(2), || cache.get_value(SHARED).is_some()).await);

    // One change notification serves both views
    let changes: Vec<RenderRequest> = queue.drain();
    assert_eq!(changes, vec![RenderRequest::MetricValuesChanged(vec![SHARED])]);

    let descriptors = [LabelDescriptor::new(SHARED, LabelLocation::Center).with_format("%s %%")];
    assert_eq!(cache.format_values(&descriptors, LabelLocation::Center), "87 %");

    // Closing one view keeps the value for the other
    cache.remove_metrics(M1);
    assert!(cache.is_tracked(SHARED));
    assert!(cache.get_value(SHARED).is_some());

    cache.remove_metrics(M2);
    assert!(!cache.is_tracked(SHARED));
    assert!(cache.get_value(SHARED).is_none());

    cache.stop().await;
}

#[tokio::test]
async fn test_value_updates_are_reported_once() {
    let backend = Arc::new(InMemoryBackend::new());
    let (renderer, mut queue) = render_channel();
    let cache = MetricCache::new(backend.clone(), fast_timing(), Some(renderer));
    cache.add_metric(MetricRequest::item(NODE, SHARED), M1).unwrap();

    let first = MetricValue::new(NODE, SHARED, "Load", "10");
    backend.set_value(first.clone());
    assert!(wait_until(Duration::from_secs(2), || cache.get_value(SHARED).is_some()).await);

    // Several polling rounds with the same value
    let before = backend.value_query_count();
    assert!(wait_until(Duration::from_secs(2), || backend.value_query_count() >= before + 3).await);
    assert_eq!(queue.drain().len(), 1);

    let second = MetricValue::new(NODE, SHARED, "Load", "95").with_severity(Severity::Major);
    backend.set_value(second.clone());
    assert!(
        wait_until(Duration::from_secs(2), || cache.get_value(SHARED) == Some(second.clone()))
            .await
    );
    assert_eq!(queue.drain(), vec![RenderRequest::MetricValuesChanged(vec![SHARED])]);
    assert_eq!(cache.threshold_severity(&[SHARED]), Severity::Major);

    cache.stop().await;
}

#[tokio::test]
async fn test_outage_keeps_last_known_values() {
    let backend = Arc::new(InMemoryBackend::new());
    let cache = MetricCache::new(backend.clone(), fast_timing(), None);
    cache.add_metric(MetricRequest::item(NODE, SHARED), M1).unwrap();

    backend.set_value(MetricValue::new(NODE, SHARED, "Load", "10"));
    assert!(wait_until(Duration::from_secs(2), || cache.get_value(SHARED).is_some()).await);

    backend.set_failing(true);
    let failed_from = backend.value_query_count();
    assert!(
        wait_until(Duration::from_secs(2), || backend.value_query_count() >= failed_from + 2)
            .await
    );
    assert_eq!(cache.get_value(SHARED).map(|v| v.value), Some("10".to_string()));

    backend.set_failing(false);
    backend.set_value(MetricValue::new(NODE, SHARED, "Load", "11"));
    assert!(
        wait_until(Duration::from_secs(2), || {
            cache.get_value(SHARED).is_some_and(|v| v.value == "11")
        })
        .await
    );

    cache.stop().await;
}
