//! Unit tests for tn-elevation.

#[cfg(test)]
mod helpers {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tn_core::GeoPoint;

    use crate::{ElevationError, ElevationProvider, ElevationResult};

    /// Counts calls; fails for negative latitudes.
    #[derive(Default)]
    pub struct CountingProvider {
        pub calls: AtomicUsize,
    }

    impl ElevationProvider for CountingProvider {
        fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if pos.lat < 0.0 {
                return Err(ElevationError::Unavailable {
                    lat: pos.lat,
                    lon: pos.lon,
                    reason: "southern hemisphere".into(),
                });
            }
            Ok(pos.lat * 10.0)
        }
    }
}

// ── Providers & policy ────────────────────────────────────────────────────────

#[cfg(test)]
mod provider {
    use tn_core::GeoPoint;

    use crate::{ConstantElevation, ElevationPolicy, ElevationProvider, FnElevation};

    #[test]
    fn constant_everywhere() {
        let p = ConstantElevation(812.0);
        assert_eq!(p.elevation(GeoPoint::new(0.0, 0.0)).unwrap(), 812.0);
        assert_eq!(p.elevation(GeoPoint::new(45.0, 140.0)).unwrap(), 812.0);
    }

    #[test]
    fn batch_matches_single_lookups() {
        let p = FnElevation::new(|g: GeoPoint| Ok(g.lon));
        let pts = [GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 2.0)];
        let got: Vec<f64> = p.elevations(&pts).into_iter().map(Result::unwrap).collect();
        assert_eq!(got, vec![1.0, 2.0]);
    }

    #[test]
    fn policy_fallback() {
        assert_eq!(ElevationPolicy::Strict.fallback(), None);
        assert_eq!(ElevationPolicy::Permissive.fallback(), Some(0.0));
        assert_eq!(ElevationPolicy::default(), ElevationPolicy::Strict);
    }

    #[test]
    fn source_tags_tell_providers_apart() {
        assert_ne!(ConstantElevation(0.0).source_tag(), ConstantElevation(100.0).source_tag());
        let boxed: Box<dyn ElevationProvider> = Box::new(ConstantElevation(3.5));
        assert_eq!(boxed.source_tag(), ConstantElevation(3.5).source_tag());
    }
}

// ── Memoization ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod memo {
    use std::sync::atomic::Ordering;

    use tn_core::GeoPoint;

    use super::helpers::CountingProvider;
    use crate::{ConstantElevation, ElevationProvider, MemoizedElevation};

    #[test]
    fn at_most_one_lookup_per_coordinate() {
        let memo = MemoizedElevation::new(CountingProvider::default());
        let a = GeoPoint::new(35.0, 138.0);
        let b = GeoPoint::new(35.5, 138.0);

        assert_eq!(memo.elevation(a).unwrap(), 350.0);
        assert_eq!(memo.elevation(a).unwrap(), 350.0);
        assert_eq!(memo.elevation(b).unwrap(), 355.0);
        assert_eq!(memo.elevation(a).unwrap(), 350.0);

        assert_eq!(memo.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.lookups(), 2);
        assert_eq!(memo.hits(), 2);
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn memo_keeps_inner_source_tag() {
        let memo = MemoizedElevation::new(ConstantElevation(42.0));
        assert_eq!(memo.source_tag(), ConstantElevation(42.0).source_tag());
    }

    #[test]
    fn failures_are_memoized() {
        let memo = MemoizedElevation::new(CountingProvider::default());
        let south = GeoPoint::new(-10.0, 20.0);
        assert!(memo.elevation(south).is_err());
        assert!(memo.elevation(south).is_err());
        assert_eq!(memo.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_workers_share_one_lookup() {
        let memo = MemoizedElevation::new(CountingProvider::default());
        let p = GeoPoint::new(43.1, 141.3);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        assert!((memo.elevation(p).unwrap() - 431.0).abs() < 1e-9);
                    }
                });
            }
        });
        assert_eq!(memo.inner().calls.load(Ordering::SeqCst), 1);
    }
}

// ── DEM tiles ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dem {
    use std::f64::consts::PI;
    use std::fmt::Write as _;

    use tempfile::TempDir;
    use tn_core::{Bounds, GeoPoint};

    use crate::dem::{lat_from_y, lon_from_x, TILE_PX};
    use crate::{DemTileDirectory, ElevationError, ElevationProvider, TileKey};

    const Z: u8 = 14;

    /// Centre of pixel (`row`, `col`) inside tile `key`.
    fn pixel_centre(key: TileKey, row: usize, col: usize) -> GeoPoint {
        let world = (1u64 << key.z) as f64 * TILE_PX as f64;
        let gx = key.x as f64 * TILE_PX as f64 + col as f64 + 0.5;
        let gy = key.y as f64 * TILE_PX as f64 + row as f64 + 0.5;
        let lon = gx / world * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * gy / world)).sinh().atan().to_degrees();
        GeoPoint::new(lat, lon)
    }

    /// Write a tile where cell (row, col) holds `row * 1000 + col`, with the
    /// top-left cell marked as no-data.
    fn write_tile(dir: &TempDir, key: TileKey) {
        let mut text = String::new();
        for row in 0..TILE_PX {
            let line: Vec<String> = (0..TILE_PX)
                .map(|col| {
                    if row == 0 && col == 0 {
                        "e".to_string()
                    } else {
                        format!("{}.0", row * 1000 + col)
                    }
                })
                .collect();
            writeln!(text, "{}", line.join(",")).unwrap();
        }
        let path = dir
            .path()
            .join(key.z.to_string())
            .join(key.x.to_string());
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(format!("{}.txt", key.y)), text).unwrap();
    }

    #[test]
    fn tile_contains_its_point() {
        let p = GeoPoint::new(35.3606, 138.7274);
        let key = TileKey::containing(p, Z);
        assert!(key.west_lon() <= p.lon && p.lon < lon_from_x(key.x + 1, Z));
        assert!(key.north_lat() >= p.lat && p.lat > lat_from_y(key.y + 1, Z));
    }

    #[test]
    fn reads_cell_under_point() {
        let dir = tempfile::tempdir().unwrap();
        let key = TileKey::containing(GeoPoint::new(35.3606, 138.7274), Z);
        write_tile(&dir, key);

        let dem = DemTileDirectory::with_zoom(dir.path(), Z);
        let got = dem.elevation(pixel_centre(key, 10, 20)).unwrap();
        assert_eq!(got, 10_020.0);
        let got = dem.elevation(pixel_centre(key, 255, 3)).unwrap();
        assert_eq!(got, 255_003.0);
    }

    #[test]
    fn no_data_cell_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let key = TileKey::containing(GeoPoint::new(36.0, 137.6), Z);
        write_tile(&dir, key);
        let dem = DemTileDirectory::with_zoom(dir.path(), Z);
        assert_eq!(dem.elevation(pixel_centre(key, 0, 0)).unwrap(), 0.0);
    }

    #[test]
    fn missing_tile_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let dem = DemTileDirectory::with_zoom(dir.path(), Z);
        let err = dem.elevation(GeoPoint::new(35.0, 135.0)).unwrap_err();
        assert!(matches!(err, ElevationError::TileUnavailable { z: Z, .. }));
    }

    #[test]
    fn malformed_tile_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let p = GeoPoint::new(35.0, 135.0);
        let key = TileKey::containing(p, Z);
        let path = dir.path().join(Z.to_string()).join(key.x.to_string());
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(format!("{}.txt", key.y)), "1.0,abc\n").unwrap();

        let dem = DemTileDirectory::with_zoom(dir.path(), Z);
        assert!(matches!(
            dem.elevation(p).unwrap_err(),
            ElevationError::MalformedTile { .. }
        ));
    }

    #[test]
    fn prefetch_loads_each_tile_once() {
        let dir = tempfile::tempdir().unwrap();
        let key = TileKey::containing(GeoPoint::new(35.3606, 138.7274), Z);
        write_tile(&dir, key);
        let dem = DemTileDirectory::with_zoom(dir.path(), Z);

        let a = pixel_centre(key, 1, 1);
        let b = pixel_centre(key, 200, 200);
        dem.prefetch(Bounds::from_points([a, b]).unwrap());
        assert_eq!(dem.loaded_tiles(), 1);

        let got = dem.elevations(&[a, b]);
        assert_eq!(got[0].clone().unwrap(), 1_001.0);
        assert_eq!(got[1].clone().unwrap(), 200_200.0);
        assert_eq!(dem.loaded_tiles(), 1);
    }
}
