//! Unit tests for tn-route.
//!
//! Points sit on the equator 0.001° of longitude apart, about 111.19 m, so
//! every such arc rounds to 111 m.

#[cfg(test)]
mod helpers {
    use tn_core::{GeoPoint, GeometryId, PathId};

    use crate::MemoryPathStore;

    pub fn at(step: u32) -> GeoPoint {
        GeoPoint::new(0.0, step as f64 * 0.001)
    }

    /// Store with geometry `g` at `at(g)` for every id used, and one path per
    /// entry of `paths`.
    pub fn store(paths: &[(u64, &[u64])]) -> MemoryPathStore {
        let mut s = MemoryPathStore::new();
        for (_, geoms) in paths {
            for &g in *geoms {
                s.add_geometry(GeometryId(g), at(g as u32));
            }
        }
        for &(p, geoms) in paths {
            let ids: Vec<GeometryId> = geoms.iter().map(|&g| GeometryId(g)).collect();
            s.add_path(PathId(p), &ids).unwrap();
        }
        s
    }

    pub fn ids(raw: &[u64]) -> Vec<GeometryId> {
        raw.iter().map(|&g| GeometryId(g)).collect()
    }

    pub fn paths(raw: &[u64]) -> Vec<PathId> {
        raw.iter().map(|&p| PathId(p)).collect()
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use tn_core::{GeometryId, PathId};

    use super::helpers::{at, ids};
    use crate::{MemoryPathStore, PathStore, RouteError};

    #[test]
    fn sequences_follow_order_column() {
        let mut s = MemoryPathStore::new();
        for g in 1..=3 {
            s.add_geometry(GeometryId(g), at(g as u32));
        }
        s.add_order(PathId(5), GeometryId(3), 2).unwrap();
        s.add_order(PathId(5), GeometryId(1), 0).unwrap();
        s.add_order(PathId(5), GeometryId(2), 1).unwrap();

        let seqs = s.path_sequences().unwrap();
        assert_eq!(seqs.len(), 1);
        let got: Vec<GeometryId> = seqs[0].nodes.iter().map(|n| n.id).collect();
        assert_eq!(got, ids(&[1, 2, 3]));
    }

    #[test]
    fn paths_listed_in_id_order() {
        let s = super::helpers::store(&[(20, &[3, 4]), (10, &[1, 2])]);
        let order: Vec<PathId> = s.path_sequences().unwrap().iter().map(|q| q.path).collect();
        assert_eq!(order, vec![PathId(10), PathId(20)]);
    }

    #[test]
    fn dangling_order_rejected() {
        let mut s = MemoryPathStore::new();
        s.add_geometry(GeometryId(1), at(1));
        let err = s.add_order(PathId(1), GeometryId(2), 0).unwrap_err();
        assert!(matches!(
            err,
            RouteError::DanglingOrder { path: PathId(1), geometry: GeometryId(2) }
        ));
        assert_eq!(s.path_count(), 0);
    }

    #[test]
    fn contains_unreferenced_geometry() {
        let mut s = MemoryPathStore::new();
        s.add_geometry(GeometryId(9), at(9));
        assert!(s.contains_geometry(GeometryId(9)).unwrap());
        assert!(!s.contains_geometry(GeometryId(8)).unwrap());
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod network {
    use tn_core::{GeoPoint, GeometryId, NodeId, PathId};

    use super::helpers::{at, store};
    use crate::{RoutingNetwork, RoutingNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = RoutingNetwork::empty();
        assert!(net.is_empty());
        assert_eq!(net.edge_count(), 0);
        assert_eq!(net.snap_to_node(at(0)), None);
    }

    #[test]
    fn shared_geometry_joins_paths() {
        let net = RoutingNetwork::from_store(&store(&[(10, &[1, 2]), (20, &[2, 3])])).unwrap();
        assert_eq!(net.node_count(), 3);
        assert_eq!(net.edge_count(), 4);

        let mid = net.node_of_geometry(GeometryId(2)).unwrap();
        assert_eq!(net.out_degree(mid), 2);
        let owners: Vec<PathId> = net.out_edges(mid).map(|e| net.edge_path[e.index()]).collect();
        assert_eq!(owners, vec![PathId(10), PathId(20)]);
    }

    #[test]
    fn arc_lengths_are_rounded_metres() {
        let net = RoutingNetwork::from_store(&store(&[(1, &[1, 2])])).unwrap();
        assert_eq!(net.edge_length_m, vec![111, 111]);
    }

    #[test]
    fn builder_reuses_geometry_node() {
        let mut b = RoutingNetworkBuilder::new();
        let a = b.add_node(GeometryId(7), at(1));
        let again = b.add_node(GeometryId(7), at(5));
        assert_eq!(a, again);
        assert_eq!(b.node_count(), 1);
        let net = b.build();
        assert_eq!(net.node_pos[0], at(1));
        assert_eq!(net.geometry_of(NodeId(0)), GeometryId(7));
    }

    #[test]
    fn single_point_path_has_no_arcs() {
        let net = RoutingNetwork::from_store(&store(&[(1, &[4])])).unwrap();
        assert_eq!(net.node_count(), 1);
        assert_eq!(net.edge_count(), 0);
    }

    #[test]
    fn csr_rows_cover_all_arcs() {
        let net = RoutingNetwork::from_store(&store(&[(1, &[1, 2, 3]), (2, &[3, 4])])).unwrap();
        assert_eq!(net.node_out_start.len(), net.node_count() + 1);
        assert_eq!(*net.node_out_start.last().unwrap() as usize, net.edge_count());
        for n in 0..net.node_count() {
            let node = NodeId(n as u32);
            for e in net.out_edges(node) {
                assert_eq!(net.edge_from[e.index()], node);
            }
        }
    }

    #[test]
    fn snap_picks_nearest() {
        let net = RoutingNetwork::from_store(&store(&[(1, &[1, 2, 3])])).unwrap();
        let n = net.snap_to_node(GeoPoint::new(0.0001, 0.0021)).unwrap();
        assert_eq!(net.geometry_of(n), GeometryId(2));
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod router {
    use tn_core::{GeoPoint, GeometryId, NodeId, PathId};

    use super::helpers::{ids, paths, store};
    use crate::{DijkstraRouter, MemoryPathStore, RouteError, RouteFinder, Router, RoutingNetwork};

    fn finder(s: MemoryPathStore) -> RouteFinder<MemoryPathStore> {
        RouteFinder::new(s).unwrap()
    }

    #[test]
    fn path_listed_once_per_route() {
        let f = finder(store(&[(10, &[1, 2, 3, 4]), (20, &[4, 5])]));
        let route = f.find(GeometryId(1), GeometryId(5)).unwrap();
        assert_eq!(route.paths, paths(&[10, 20]));
        assert_eq!(route.geometries, ids(&[1, 2, 3, 4, 5]));
        assert_eq!(route.distance_m, 4 * 111);
    }

    #[test]
    fn reverse_query_reverses_paths() {
        let f = finder(store(&[(10, &[1, 2, 3, 4]), (20, &[4, 5])]));
        let route = f.find(GeometryId(5), GeometryId(1)).unwrap();
        assert_eq!(route.paths, paths(&[20, 10]));
        assert_eq!(route.geometries, ids(&[5, 4, 3, 2, 1]));
    }

    #[test]
    fn disconnected_is_empty_not_error() {
        let f = finder(store(&[(10, &[1, 2]), (30, &[6, 7])]));
        let route = f.find(GeometryId(1), GeometryId(7)).unwrap();
        assert!(route.is_empty());
        assert_eq!(route.distance_m, 0);
    }

    #[test]
    fn unknown_geometry_is_not_found() {
        let f = finder(store(&[(10, &[1, 2])]));
        let err = f.find(GeometryId(1), GeometryId(99)).unwrap_err();
        assert!(matches!(err, RouteError::GeometryNotFound(GeometryId(99))));
        let err = f.find(GeometryId(98), GeometryId(1)).unwrap_err();
        assert!(matches!(err, RouteError::GeometryNotFound(GeometryId(98))));
    }

    #[test]
    fn same_endpoint_is_empty() {
        let f = finder(store(&[(10, &[1, 2])]));
        assert!(f.find(GeometryId(2), GeometryId(2)).unwrap().is_empty());
    }

    #[test]
    fn stored_geometry_off_every_path_is_empty() {
        let mut s = store(&[(10, &[1, 2])]);
        s.add_geometry(GeometryId(8), GeoPoint::new(1.0, 1.0));
        let f = finder(s);
        assert!(f.find(GeometryId(1), GeometryId(8)).unwrap().is_empty());
    }

    #[test]
    fn shortest_alternative_wins() {
        // g1 (0,0) and g2 (0,0.002) joined directly by path 1 (222 m) and by
        // a detour through g3 (0.005,0.001) over paths 2 and 3.
        let mut s = MemoryPathStore::new();
        s.add_geometry(GeometryId(1), GeoPoint::new(0.0, 0.0));
        s.add_geometry(GeometryId(2), GeoPoint::new(0.0, 0.002));
        s.add_geometry(GeometryId(3), GeoPoint::new(0.005, 0.001));
        s.add_path(PathId(2), &ids(&[1, 3])).unwrap();
        s.add_path(PathId(3), &ids(&[3, 2])).unwrap();
        s.add_path(PathId(1), &ids(&[1, 2])).unwrap();

        let route = finder(s).find(GeometryId(1), GeometryId(2)).unwrap();
        assert_eq!(route.paths, paths(&[1]));
        assert_eq!(route.distance_m, 222);
    }

    #[test]
    fn equal_cost_routes_resolve_identically() {
        // Two parallel paths of identical length between g1 and g2.
        let mut s = MemoryPathStore::new();
        s.add_geometry(GeometryId(1), GeoPoint::new(0.0, 0.0));
        s.add_geometry(GeometryId(2), GeoPoint::new(0.0, 0.001));
        s.add_path(PathId(5), &ids(&[1, 2])).unwrap();
        s.add_path(PathId(6), &ids(&[1, 2])).unwrap();

        let first = finder(s.clone()).find(GeometryId(1), GeometryId(2)).unwrap();
        for _ in 0..5 {
            assert_eq!(finder(s.clone()).find(GeometryId(1), GeometryId(2)).unwrap(), first);
        }
        assert_eq!(first.paths.len(), 1);
    }

    #[test]
    fn router_rejects_foreign_node() {
        let net = RoutingNetwork::from_store(&store(&[(1, &[1, 2])])).unwrap();
        let err = DijkstraRouter.route(&net, NodeId(0), NodeId(9)).unwrap_err();
        assert!(matches!(err, RouteError::UnknownNode(NodeId(9))));
    }
}

// ── Importer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod import {
    use tn_core::{GeoPoint, GeometryId, PathId};

    use super::helpers::paths;
    use crate::{PathImporter, PathStore, RouteFinder};

    fn p(lon: f64) -> GeoPoint {
        GeoPoint::new(0.0, lon)
    }

    #[test]
    fn near_ends_share_geometry() {
        let mut imp = PathImporter::new();
        assert!(imp.add_path(PathId(1), &[p(0.0), p(0.0005), p(0.001)]));
        // 0.00102° is about 2 m from the end of path 1.
        assert!(imp.add_path(PathId(2), &[p(0.00102), p(0.002)]));

        let stats = imp.stats();
        assert_eq!(stats.paths, 2);
        assert_eq!(stats.snapped, 1);
        assert_eq!(stats.geometries, 4);

        let seqs = imp.sequences();
        assert_eq!(seqs[0].nodes[2].id, seqs[1].nodes[0].id);
        // The shared vertex keeps the first path's position.
        assert_eq!(seqs[1].nodes[0].pos, p(0.001));
    }

    #[test]
    fn far_ends_stay_apart() {
        let mut imp = PathImporter::new();
        imp.add_path(PathId(1), &[p(0.0), p(0.001)]);
        // About 22 m away.
        imp.add_path(PathId(2), &[p(0.0012), p(0.002)]);
        assert_eq!(imp.stats().snapped, 0);
        assert_eq!(imp.stats().geometries, 4);
    }

    #[test]
    fn wider_radius_snaps() {
        let mut imp = PathImporter::new().with_snap_m(30.0);
        imp.add_path(PathId(1), &[p(0.0), p(0.001)]);
        imp.add_path(PathId(2), &[p(0.0012), p(0.002)]);
        assert_eq!(imp.stats().snapped, 1);
    }

    #[test]
    fn interior_points_never_snap() {
        let mut imp = PathImporter::new();
        imp.add_path(PathId(1), &[p(0.0), p(0.001)]);
        imp.add_path(PathId(2), &[p(0.01), p(0.00101), p(0.02)]);
        assert_eq!(imp.stats().snapped, 0);
    }

    #[test]
    fn short_path_skipped() {
        let mut imp = PathImporter::new();
        assert!(!imp.add_path(PathId(1), &[p(0.0)]));
        let (seqs, stats) = imp.finish();
        assert!(seqs.is_empty());
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn imported_paths_are_routable() {
        let mut imp = PathImporter::new();
        imp.add_path(PathId(1), &[p(0.0), p(0.001)]);
        imp.add_path(PathId(2), &[p(0.001), p(0.002)]);
        imp.add_path(PathId(3), &[p(0.002), p(0.003)]);
        let start = imp.sequences()[0].nodes[0].id;
        let dest = imp.sequences()[2].nodes[1].id;

        let store = imp.into_store();
        assert_eq!(store.geometry_count(), 4);
        assert!(store.contains_geometry(GeometryId(1)).unwrap());

        let route = RouteFinder::new(store).unwrap().find(start, dest).unwrap();
        assert_eq!(route.paths, paths(&[1, 2, 3]));
        assert_eq!(route.distance_m, 333);
    }
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite {
    use tempfile::TempDir;
    use tn_core::{GeoPoint, GeometryId, PathId};

    use super::helpers::{ids, paths};
    use crate::{MemoryPathStore, PathImporter, PathStore, RouteFinder, SqlitePathStore};

    fn imported() -> PathImporter {
        let mut imp = PathImporter::new();
        imp.add_path(PathId(1), &[GeoPoint::new(35.0, 138.0), GeoPoint::new(35.0, 138.001)]);
        imp.add_path(
            PathId(2),
            &[GeoPoint::new(35.0, 138.001), GeoPoint::new(35.0005, 138.0015), GeoPoint::new(35.001, 138.002)],
        );
        imp
    }

    #[test]
    fn schema_is_idempotent() {
        let store = SqlitePathStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        assert!(store.path_sequences().unwrap().is_empty());
    }

    #[test]
    fn sequences_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("paths.db");
        let imp = imported();
        {
            let store = SqlitePathStore::open(&db).unwrap();
            store.insert_sequences(imp.sequences()).unwrap();
        }
        let store = SqlitePathStore::open(&db).unwrap();
        assert_eq!(store.path_sequences().unwrap(), imp.sequences());
        assert!(store.contains_geometry(GeometryId(1)).unwrap());
        assert!(!store.contains_geometry(GeometryId(50)).unwrap());
    }

    #[test]
    fn routes_match_memory_store() {
        let imp = imported();
        let sql = SqlitePathStore::open_in_memory().unwrap();
        sql.insert_sequences(imp.sequences()).unwrap();
        let mem = MemoryPathStore::from_sequences(imp.sequences());

        let from = GeometryId(1);
        let to = GeometryId(4);
        let a = RouteFinder::new(sql).unwrap().find(from, to).unwrap();
        let b = RouteFinder::new(mem).unwrap().find(from, to).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.paths, paths(&[1, 2]));
        assert_eq!(a.geometries, ids(&[1, 2, 3, 4]));
    }

    #[test]
    fn dangling_rows_skipped_on_read() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("paths.db");
        let store = SqlitePathStore::open(&db).unwrap();
        store.insert_geometry(GeometryId(1), GeoPoint::new(35.0, 138.0)).unwrap();
        store.insert_geometry(GeometryId(2), GeoPoint::new(35.0, 138.001)).unwrap();
        {
            let conn = rusqlite::Connection::open(&db).unwrap();
            conn.execute_batch(
                "INSERT INTO path_geometry_orders VALUES (7, 1, 0);
                 INSERT INTO path_geometry_orders VALUES (7, 99, 1);
                 INSERT INTO path_geometry_orders VALUES (7, 2, 2);",
            )
            .unwrap();
        }
        let seqs = store.path_sequences().unwrap();
        assert_eq!(seqs.len(), 1);
        let got: Vec<GeometryId> = seqs[0].nodes.iter().map(|n| n.id).collect();
        assert_eq!(got, ids(&[1, 2]));
    }

    #[test]
    fn clear_empties_tables() {
        let store = SqlitePathStore::open_in_memory().unwrap();
        store.insert_sequences(imported().sequences()).unwrap();
        store.clear().unwrap();
        assert!(store.path_sequences().unwrap().is_empty());
        assert!(!store.contains_geometry(GeometryId(1)).unwrap());
    }
}
