use netmap_sync::backend::memory::InMemoryBackend;
use netmap_sync::core::SyncError;
use netmap_sync::models::{ElementId, LinkId, MapDecoration, MapId, MetricId, MetricValue, ObjectId};
use netmap_sync::render::{MapElement, RenderRequest, render_channel};
use netmap_sync::telemetry::NodeTelemetryCache;
use netmap_sync::test_utils::{chain_content, fast_timing, wait_until};
use std::sync::Arc;
use std::time::Duration;

const VIEW: MapId = MapId(3);

fn summary(node: u64, value: &str) -> Vec<MetricValue> {
    vec![MetricValue::new(ObjectId(node), MetricId(1), "CPU usage", value)]
}

#[tokio::test]
async fn test_changed_node_repaints_node_links_and_decorations() {
    let backend = Arc::new(InMemoryBackend::new());
    let (renderer, mut queue) = render_channel();
    let cache = NodeTelemetryCache::new(VIEW, backend.clone(), fast_timing(), renderer, true);

    // Nodes 1-2-3-4 with a decoration grouping 2 and 3
    let mut content = chain_content(1, 4);
    content.decorations.push(MapDecoration {
        id: ElementId(900),
        object_ids: vec![ObjectId(2), ObjectId(3)],
    });
    backend.set_summary(ObjectId(2), summary(2, "35"));
    cache.content_changed(content).unwrap();

    assert!(
        wait_until(Duration::from_secs(2), || {
            cache.get_cached_node_values(ObjectId(2)).is_some_and(|v| !v.is_empty())
        })
        .await
    );
    assert_eq!(
        queue.drain(),
        vec![
            RenderRequest::Refresh(MapElement::Node(ObjectId(2))),
            RenderRequest::Refresh(MapElement::Link(LinkId(1))),
            RenderRequest::Refresh(MapElement::Link(LinkId(2))),
            RenderRequest::UpdateDecorationFigure(ElementId(900)),
        ]
    );

    // Nodes without data are cached as empty and never repainted
    assert_eq!(cache.get_cached_node_values(ObjectId(1)), Some(Vec::new()));

    // Only node 4 changes next
    backend.set_summary(ObjectId(4), summary(4, "80"));
    assert!(
        wait_until(Duration::from_secs(2), || {
            cache.get_cached_node_values(ObjectId(4)).is_some_and(|v| !v.is_empty())
        })
        .await
    );
    assert_eq!(
        queue.drain(),
        vec![
            RenderRequest::Refresh(MapElement::Node(ObjectId(4))),
            RenderRequest::Refresh(MapElement::Link(LinkId(3))),
        ]
    );

    cache.stop().await;
}

#[tokio::test]
async fn test_removed_nodes_are_purged() {
    let backend = Arc::new(InMemoryBackend::new());
    let (renderer, _queue) = render_channel();
    let cache = NodeTelemetryCache::new(VIEW, backend.clone(), fast_timing(), renderer, true);

    cache.content_changed(chain_content(1, 4)).unwrap();
    assert_eq!(cache.tracked_nodes().len(), 4);

    cache.content_changed(chain_content(3, 3)).unwrap();
    assert_eq!(cache.tracked_nodes(), vec![ObjectId(3), ObjectId(4), ObjectId(5)]);
    assert!(cache.summary(ObjectId(1)).is_none());

    cache.stop().await;
}

#[tokio::test]
async fn test_disabled_cache_does_not_fetch() {
    let backend = Arc::new(InMemoryBackend::new());
    let (renderer, mut queue) = render_channel();
    let cache = NodeTelemetryCache::new(VIEW, backend.clone(), fast_timing(), renderer, false);

    backend.set_summary(ObjectId(1), summary(1, "5"));
    cache.content_changed(chain_content(1, 2)).unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.summary_query_count(), 0);

    cache.set_enabled(true);
    assert!(
        wait_until(Duration::from_secs(2), || {
            cache.get_cached_node_values(ObjectId(1)).is_some_and(|v| !v.is_empty())
        })
        .await
    );
    assert!(!queue.drain().is_empty());

    cache.stop().await;
}

#[tokio::test]
async fn test_disposed_cache_stops_repainting() {
    let backend = Arc::new(InMemoryBackend::new());
    let (renderer, mut queue) = render_channel();
    let cache = NodeTelemetryCache::new(VIEW, backend.clone(), fast_timing(), renderer, true);
    cache.content_changed(chain_content(1, 2)).unwrap();

    cache.dispose();
    assert!(cache.is_disposed());
    backend.set_summary(ObjectId(1), summary(1, "99"));
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(queue.drain().is_empty());
    assert!(matches!(
        cache.content_changed(chain_content(1, 3)),
        Err(SyncError::Disposed { .. })
    ));
}
