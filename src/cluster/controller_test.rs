#[cfg(test)]
mod tests {
    use crate::cluster::{
        Bounds, ClusterController, ClusterEvent, ClusterFeature, ClusterIndex, ClusterOptions,
        ControllerOptions, ExpansionState, Point, PointList, Viewport,
    };
    use quickcheck::{QuickCheck, TestResult};

    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const LYON: (f64, f64) = (45.764, 4.8357);

    fn ring(prefix: &str, center: (f64, f64), count: usize) -> PointList {
        // 20 m ring
        let dlat = 0.02 / 111.19492664455873;
        let dlon = dlat / center.0.to_radians().cos();
        (0..count)
            .map(|i| {
                let a = 2.0 * std::f64::consts::PI * i as f64 / count as f64;
                Point::new(
                    format!("{prefix}{i}"),
                    center.0 + dlat * a.cos(),
                    center.1 + dlon * a.sin(),
                    prefix,
                )
            })
            .collect()
    }

    fn cluster_with(features: &[ClusterFeature], count: usize) -> &ClusterFeature {
        features
            .iter()
            .find(|f| f.point_count() == Some(count))
            .unwrap()
    }

    fn setup() -> (ClusterIndex, Vec<ClusterFeature>) {
        let mut points = ring("small", PARIS, 5);
        points.extend(ring("large", LYON, 12));
        points.push(Point::new("solo", 43.2965, 5.3698, "marseille"));
        let index = ClusterIndex::with_points(ClusterOptions::default(), points);
        let features = index.query(&Bounds::WORLD, 12.0);
        (index, features)
    }

    #[test]
    fn test_small_cluster_expands() {
        let (index, features) = setup();
        let mut controller = ClusterController::default();
        assert_eq!(controller.state(), ExpansionState::Collapsed);

        let small = cluster_with(&features, 5);
        let id = small.cluster_id().unwrap();
        assert_eq!(controller.activate(&index, small), Some(ClusterEvent::Expanded(id)));
        assert_eq!(controller.state(), ExpansionState::Expanded { cluster: id });
        assert_eq!(index.get_leaves(id, usize::MAX).unwrap().len(), 5);

        let pins = controller.expanded_pins(&index, small, 12.0);
        assert_eq!(pins.len(), 5);
        let ids: Vec<&str> = pins.iter().map(|p| p.point.id.as_str()).collect();
        assert_eq!(ids, vec!["small0", "small1", "small2", "small3", "small4"]);
        for (i, pin) in pins.iter().enumerate() {
            let angle = (pin.longitude - small.longitude)
                .atan2(pin.latitude - small.latitude)
                .to_degrees()
                .rem_euclid(360.0);
            assert!((angle - 72.0 * i as f64).abs() < 1e-6);
        }
        assert_eq!(pins, controller.expanded_pins(&index, small, 12.0));
    }

    #[test]
    fn test_large_cluster_zooms() {
        let (index, features) = setup();
        let mut controller = ClusterController::default();

        let large = cluster_with(&features, 12);
        let id = large.cluster_id().unwrap();
        let expected = index.get_expansion_zoom(id).unwrap();

        assert_eq!(
            controller.activate(&index, large),
            Some(ClusterEvent::ZoomTo {
                longitude: large.longitude,
                latitude: large.latitude,
                zoom: expected,
            })
        );
        assert_eq!(controller.state(), ExpansionState::Collapsed);
    }

    #[test]
    fn test_zoom_capped_at_max_zoom() {
        let points = (0..10)
            .map(|i| Point::new(format!("dup{i}"), 10.0, 10.0, "f"))
            .collect();
        let index = ClusterIndex::with_points(ClusterOptions::default(), points);
        let features = index.query(&Bounds::WORLD, 12.0);
        let mut controller = ClusterController::default();

        match controller.activate(&index, &features[0]) {
            Some(ClusterEvent::ZoomTo { zoom, .. }) => assert_eq!(zoom, 20),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_points_replaced_collapses() {
        let (mut index, features) = setup();
        let mut controller = ClusterController::default();
        let small = cluster_with(&features, 5);
        let id = small.cluster_id().unwrap();
        controller.activate(&index, small);

        index.load(ring("small", PARIS, 3));
        assert_eq!(controller.on_points_replaced(), Some(ClusterEvent::Collapsed(id)));
        assert_eq!(controller.state(), ExpansionState::Collapsed);
        assert_eq!(controller.on_points_replaced(), None);
    }

    #[test]
    fn test_stale_activation_is_noop() {
        let (mut index, features) = setup();
        let mut controller = ClusterController::default();
        let small = cluster_with(&features, 5).clone();

        index.load(ring("other", PARIS, 5));
        assert_eq!(controller.activate(&index, &small), None);
        assert_eq!(controller.state(), ExpansionState::Collapsed);
        assert!(controller.expanded_pins(&index, &small, 12.0).is_empty());
    }

    #[test]
    fn test_expanded_pins_empty_when_stale() {
        let (mut index, features) = setup();
        let mut controller = ClusterController::default();
        let small = cluster_with(&features, 5).clone();
        controller.activate(&index, &small);

        index.load(ring("other", PARIS, 5));
        assert!(controller.expanded_pins(&index, &small, 12.0).is_empty());
    }

    #[test]
    fn test_same_cluster_toggles() {
        let (index, features) = setup();
        let mut controller = ClusterController::default();
        let small = cluster_with(&features, 5);
        let id = small.cluster_id().unwrap();

        controller.activate(&index, small);
        assert_eq!(controller.activate(&index, small), Some(ClusterEvent::Collapsed(id)));
        assert_eq!(controller.state(), ExpansionState::Collapsed);
        assert_eq!(controller.collapse(), None);
    }

    #[test]
    fn test_other_cluster_replaces_expansion() {
        let mut points = ring("a", PARIS, 3);
        points.extend(ring("b", LYON, 4));
        let index = ClusterIndex::with_points(ClusterOptions::default(), points);
        let features = index.query(&Bounds::WORLD, 12.0);
        let mut controller = ClusterController::default();

        let a = cluster_with(&features, 3);
        let b = cluster_with(&features, 4);
        controller.activate(&index, a);
        let b_id = b.cluster_id().unwrap();
        assert_eq!(controller.activate(&index, b), Some(ClusterEvent::Expanded(b_id)));
        assert_eq!(controller.expanded(), Some(b_id));
        assert!(controller.expanded_pins(&index, a, 12.0).is_empty());
    }

    #[test]
    fn test_point_selection_keeps_state() {
        let (index, features) = setup();
        let mut controller = ClusterController::default();
        let small = cluster_with(&features, 5);
        controller.activate(&index, small);
        let before = controller.state();

        let solo = features.iter().find(|f| !f.is_cluster()).unwrap();
        assert_eq!(
            controller.activate(&index, solo),
            Some(ClusterEvent::LocationSelected {
                id: "solo".to_string()
            })
        );
        assert_eq!(controller.state(), before);
    }

    #[test]
    fn test_viewport_settle() {
        let (index, features) = setup();
        let mut controller = ClusterController::default();
        let small = cluster_with(&features, 5);
        let id = small.cluster_id().unwrap();
        controller.activate(&index, small);

        // Panning within the same integer zoom keeps the expansion
        let pan = Viewport::new(Bounds::new(2.0, 48.0, 3.0, 49.0), 12.7);
        assert_eq!(controller.on_viewport_settled(&index, &pan), None);
        assert_eq!(controller.expanded(), Some(id));

        let zoomed = Viewport::new(Bounds::new(2.0, 48.0, 3.0, 49.0), 13.2);
        assert_eq!(
            controller.on_viewport_settled(&index, &zoomed),
            Some(ClusterEvent::Collapsed(id))
        );
        assert_eq!(controller.state(), ExpansionState::Collapsed);
    }

    #[test]
    fn test_custom_spread_limit() {
        let (index, features) = setup();
        let mut controller = ClusterController::new(ControllerOptions {
            max_spreadable_size: 4,
            ..ControllerOptions::default()
        });
        let small = cluster_with(&features, 5);
        assert!(matches!(
            controller.activate(&index, small),
            Some(ClusterEvent::ZoomTo { .. })
        ));
    }

    #[test]
    fn test_expansion_exclusivity() {
        fn prop(clicks: Vec<u8>) -> TestResult {
            let (mut index, mut features) = setup();
            let mut controller = ClusterController::default();

            for click in clicks {
                match click % 8 {
                    0 => {
                        controller.on_points_replaced();
                        index.load(ring("small", PARIS, 5));
                        features = index.query(&Bounds::WORLD, 12.0);
                    }
                    1 => {
                        controller.collapse();
                    }
                    n => {
                        let f = &features[usize::from(n) % features.len()];
                        controller.activate(&index, f);
                    }
                }

                // The state holds a single id; make sure it names a live, spreadable cluster
                if let Some(id) = controller.expanded() {
                    let live = features.iter().filter(|f| f.cluster_id() == Some(id)).count();
                    let ok = live == 1
                        && index
                            .get_leaves(id, usize::MAX)
                            .is_ok_and(|leaves| leaves.len() <= 8);
                    if !ok {
                        return TestResult::failed();
                    }
                }
            }
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(100)
            .quickcheck(prop as fn(Vec<u8>) -> TestResult);
    }
}
