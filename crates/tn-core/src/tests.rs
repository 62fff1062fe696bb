//! Unit tests for tn-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ClusterId, EdgeId, EndpointId, NodeId, PathId, WayId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(ClusterId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(PathId::INVALID.0, u64::MAX);
        assert_eq!(NodeId::default(), NodeId::INVALID);
    }

    #[test]
    fn endpoint_display_uses_way_suffix() {
        let way = WayId::from(12345i64);
        assert_eq!(EndpointId::start(&way).to_string(), "12345_start");
        assert_eq!(EndpointId::end(&way).to_string(), "12345_end");
        assert!(EndpointId::start(&way).is_start());
        assert!(!EndpointId::end(&way).is_start());
    }

    #[test]
    fn merged_way_id_nests() {
        let a = WayId::from("A");
        let b = WayId::from("B");
        let ab = WayId::merged(&a, &b);
        assert_eq!(ab.as_str(), "merged_A_B");
        let c = WayId::from("C");
        assert_eq!(WayId::merged(&ab, &c).as_str(), "merged_merged_A_B_C");
    }
}

#[cfg(test)]
mod geo {
    use crate::{path_length_m, Bounds, GeoPoint, TrailPoint};

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(35.3606, 138.7274);
        assert!(p.distance_m(p) < 1e-6);
    }

    #[test]
    fn one_degree_latitude() {
        let a = GeoPoint::new(35.0, 138.0);
        let b = GeoPoint::new(36.0, 138.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(35.1, 138.2);
        let b = GeoPoint::new(35.2, 138.4);
        assert!((a.distance_m(b) - b.distance_m(a)).abs() < 1e-6);
    }

    #[test]
    fn path_length_is_cumulative() {
        // An out-and-back polyline: cumulative length is twice the
        // endpoint-to-endpoint span, even though its ends coincide.
        let pts = [
            TrailPoint::new(35.0, 138.0),
            TrailPoint::new(35.001, 138.0),
            TrailPoint::new(35.0, 138.0),
        ];
        let leg = pts[0].pos().distance_m(pts[1].pos());
        assert!((path_length_m(&pts) - 2.0 * leg).abs() < 1e-6);
        assert_eq!(path_length_m(&pts[..1]), 0.0);
    }

    #[test]
    fn envelope_contains_radius() {
        let c = GeoPoint::new(43.0, 142.0);
        let env = c.degree_envelope(100.0);
        // Points 99 m due north and due east must be inside.
        let north = GeoPoint::new(43.0 + 99.0 / 111_195.0, 142.0);
        let east = GeoPoint::new(43.0, 142.0 + 99.0 / (111_195.0 * 43f64.to_radians().cos()));
        assert!(c.distance_m(north) < 100.0);
        assert!(c.distance_m(east) < 100.0);
        assert!(env.contains(north));
        assert!(env.contains(east));
        assert!(!env.contains(GeoPoint::new(43.01, 142.0)));
    }

    #[test]
    fn bounds_from_points() {
        let b = Bounds::from_points([
            GeoPoint::new(1.0, 5.0),
            GeoPoint::new(-2.0, 7.0),
            GeoPoint::new(0.5, 4.0),
        ])
        .unwrap();
        assert_eq!(b, Bounds { minlat: -2.0, minlon: 4.0, maxlat: 1.0, maxlon: 7.0 });
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }
}
