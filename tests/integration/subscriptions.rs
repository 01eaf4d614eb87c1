use netmap_sync::backend::SyncFlags;
use netmap_sync::backend::memory::InMemoryBackend;
use netmap_sync::models::{MapId, ObjectId};
use netmap_sync::sync::SubscriptionCoordinator;
use netmap_sync::test_utils::{fast_timing, init_test_logging, wait_until};
use std::sync::Arc;
use std::time::Duration;

const M1: MapId = MapId(1);
const M2: MapId = MapId(2);
const A: ObjectId = ObjectId(100);
const B: ObjectId = ObjectId(101);
const C: ObjectId = ObjectId(102);

fn backend_with(objects: &[ObjectId]) -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    for object in objects {
        backend.add_object(*object);
    }
    backend
}

#[tokio::test]
async fn test_two_views_then_owner_closes() {
    init_test_logging(None);
    let backend = backend_with(&[A, B, C]);
    let coordinator = SubscriptionCoordinator::new(backend.clone(), fast_timing());

    // View M1 opens with {A, B}
    coordinator.add_objects(M1, &[A, B]);
    assert_eq!(coordinator.ref_count(M1), 1);
    assert_eq!(coordinator.poll_owner(A), Some(M1));
    assert_eq!(coordinator.poll_owner(B), Some(M1));

    // View M2 opens with {B, C}; B stays with M1
    coordinator.add_objects(M2, &[B, C]);
    assert_eq!(coordinator.ref_count(M2), 1);
    assert_eq!(coordinator.poll_owner(B), Some(M1));
    assert_eq!(coordinator.poll_owner(C), Some(M2));
    assert!(!coordinator.bucket(M2).contains(&B));

    // M1 closes: A is gone, B moves to M2
    coordinator.remove_objects(M1, &[A, B]);
    assert_eq!(coordinator.ref_count(M1), 0);
    assert!(!coordinator.is_tracked(A));
    assert_eq!(coordinator.poll_owner(B), Some(M2));
    assert_eq!(coordinator.bucket(M2), vec![B, C]);

    // B keeps being synchronized, now on behalf of M2
    let transferred = wait_until(Duration::from_secs(2), || {
        backend
            .sync_calls()
            .iter()
            .any(|call| call.owner == M2 && call.objects.contains(&B))
    })
    .await;
    assert!(transferred);

    // Closing the last view removes everything
    coordinator.remove_objects(M2, &[B, C]);
    assert_eq!(coordinator.tracked_object_count(), 0);
    assert_eq!(coordinator.open_view_count(), 0);

    coordinator.stop().await;
}

#[tokio::test]
async fn test_cloned_window_shares_registration() {
    let backend = backend_with(&[A, B]);
    let coordinator = SubscriptionCoordinator::new(backend, fast_timing());

    coordinator.add_objects(M1, &[A, B]);
    coordinator.add_objects(M1, &[A, B]);
    assert_eq!(coordinator.ref_count(M1), 2);
    assert_eq!(coordinator.bucket(M1), vec![A, B]);

    // Closing one window keeps the subscription
    coordinator.remove_objects(M1, &[A, B]);
    assert_eq!(coordinator.ref_count(M1), 1);
    assert!(coordinator.is_tracked(A));

    coordinator.remove_objects(M1, &[A, B]);
    assert!(!coordinator.is_tracked(A));

    // Extra releases never drive the count negative
    coordinator.remove_objects(M1, &[A, B]);
    assert_eq!(coordinator.ref_count(M1), 0);

    coordinator.stop().await;
}

#[tokio::test]
async fn test_balanced_sequences_leave_no_entries() {
    let backend = backend_with(&[]);
    let coordinator = SubscriptionCoordinator::new(backend, fast_timing());

    let views: Vec<(MapId, Vec<ObjectId>)> = (1..=5)
        .map(|v| {
            let objects = (v..v + 4).map(|o| ObjectId(o * 10)).collect();
            (MapId(v), objects)
        })
        .collect();

    for (map, objects) in &views {
        coordinator.add_objects(*map, objects);
    }
    for (map, objects) in views.iter().take(3) {
        coordinator.add_objects(*map, objects);
    }
    assert!(coordinator.tracked_object_count() > 0);

    // Close in an order different from the opening order
    for (map, objects) in views.iter().rev() {
        coordinator.remove_objects(*map, objects);
    }
    for (map, objects) in views.iter().take(3) {
        coordinator.remove_objects(*map, objects);
    }

    assert_eq!(coordinator.tracked_object_count(), 0);
    assert_eq!(coordinator.open_view_count(), 0);
    coordinator.stop().await;
}

#[tokio::test]
async fn test_worker_survives_backend_outage() {
    let backend = backend_with(&[A]);
    backend.set_failing(true);
    let coordinator = SubscriptionCoordinator::new(backend.clone(), fast_timing());
    coordinator.add_objects(M1, &[A]);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(backend.synced_objects().is_empty());

    backend.set_failing(false);
    let synced = wait_until(Duration::from_secs(2), || backend.synced_objects().contains(&A)).await;
    assert!(synced);
    assert!(backend.sync_calls().iter().all(|c| c.flags == SyncFlags::background()));

    coordinator.stop().await;
}

#[tokio::test]
async fn test_request_sync_runs_before_period() {
    let backend = backend_with(&[A]);
    let timing = netmap_sync::worker::PollTiming::new(Duration::ZERO, Duration::from_secs(3600));
    let coordinator = SubscriptionCoordinator::new(backend.clone(), timing);

    // First round ran with nothing registered
    tokio::time::sleep(Duration::from_millis(20)).await;
    coordinator.add_objects(M1, &[A]);
    assert!(backend.sync_calls().is_empty());

    coordinator.request_sync();
    assert!(wait_until(Duration::from_secs(2), || !backend.sync_calls().is_empty()).await);
    coordinator.stop().await;
}
