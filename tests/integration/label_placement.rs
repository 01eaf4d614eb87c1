use netmap_sync::geometry::{LabelLocation, LabelPlacement, Point, place_label, place_link_label};
use netmap_sync::models::{LinkId, LinkRouting, MapLink, ObjectId};

fn assert_near(actual: Point, x: f64, y: f64) {
    assert!(
        (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
        "expected ({x}, {y}), got ({}, {})",
        actual.x,
        actual.y
    );
}

#[test]
fn test_center_label_on_horizontal_link() {
    let placement = LabelPlacement::new(LabelLocation::Center).with_percent(50);
    let anchor = place_label(Point::new(0.0, 0.0), Point::new(1100.0, 0.0), &placement);
    assert_eq!(anchor, Point::new(550.0, 0.0));
}

#[test]
fn test_label_follows_link_direction_in_every_quadrant() {
    let placement = LabelPlacement::new(LabelLocation::NearA).with_percent(0);
    let origin = Point::new(500.0, 500.0);

    // 300-400-500 triangle: 500 units long, first zone starts at 500/11
    let offset = 500.0 / 11.0;
    let (dx, dy) = (offset * 0.6, offset * 0.8);
    let cases = [
        (Point::new(800.0, 900.0), 500.0 + dx, 500.0 + dy),
        (Point::new(200.0, 900.0), 500.0 - dx, 500.0 + dy),
        (Point::new(800.0, 100.0), 500.0 + dx, 500.0 - dy),
        (Point::new(200.0, 100.0), 500.0 - dx, 500.0 - dy),
    ];
    for (target, x, y) in cases {
        assert_near(place_label(origin, target, &placement), x, y);
    }
}

#[test]
fn test_parallel_links_get_distinct_slots() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(0.0, 1100.0);
    let anchors: Vec<Point> = (0..3u32)
        .map(|index| {
            let link = MapLink::new(LinkId(u64::from(index)), ObjectId(1), ObjectId(2))
                .with_duplicate(index, 3);
            place_label(a, b, &LabelPlacement::from_link(&link, LabelLocation::Center))
        })
        .collect();

    // Slots at 1/5, 2/5 and 3/5 of the center zone
    assert_near(anchors[0], 0.0, 400.0 + 300.0 * 0.2);
    assert_near(anchors[1], 0.0, 400.0 + 300.0 * 0.4);
    assert_near(anchors[2], 0.0, 400.0 + 300.0 * 0.6);
}

#[test]
fn test_inverted_parallel_link_mirrors_slot() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(1100.0, 0.0);
    let link = MapLink::new(LinkId(5), ObjectId(2), ObjectId(1)).with_duplicate(0, 3).inverted();
    let anchor = place_label(a, b, &LabelPlacement::from_link(&link, LabelLocation::NearB));
    assert_near(anchor, 700.0 + 300.0 * 0.8, 0.0);
}

#[test]
fn test_placement_is_deterministic() {
    let placement = LabelPlacement::new(LabelLocation::NearB).with_percent(37);
    let a = Point::new(-12.5, 40.0);
    let b = Point::new(310.0, -77.25);
    let first = place_label(a, b, &placement);
    for _ in 0..10 {
        assert_eq!(place_label(a, b, &placement), first);
    }
}

#[test]
fn test_bend_point_link_uses_route_points() {
    let link =
        MapLink::new(LinkId(1), ObjectId(1), ObjectId(2)).with_routing(LinkRouting::BendPoints);
    let route = [Point::new(0.0, 0.0), Point::new(0.0, 100.0), Point::new(200.0, 100.0)];

    assert_eq!(place_link_label(&link, &route, LabelLocation::NearA), Some(route[0]));
    assert_eq!(place_link_label(&link, &route, LabelLocation::Center), Some(route[1]));
    assert_eq!(place_link_label(&link, &route, LabelLocation::NearB), Some(route[2]));
    assert_eq!(place_link_label(&link, &[], LabelLocation::Center), None);
}

#[test]
fn test_manhattan_link_keeps_labels_off_endpoints() {
    let link =
        MapLink::new(LinkId(1), ObjectId(1), ObjectId(2)).with_routing(LinkRouting::Manhattan);
    let route = [Point::new(0.0, 0.0), Point::new(1100.0, 0.0)];

    let near_a = place_link_label(&link, &route, LabelLocation::NearA);
    assert_eq!(near_a, Some(Point::new(250.0, 0.0)));
}
