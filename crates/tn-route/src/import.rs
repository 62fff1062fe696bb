//! Turning merged network elements into stored paths.
//!
//! Each imported path gets fresh geometry ids for its interior points.  Its
//! two end points are **snapped**: when an end of an earlier path lies within
//! `snap_m` metres, that geometry is reused instead, which is what joins the
//! paths into one routing graph.

use rstar::{RTree, RTreeObject, AABB};

use tn_core::{GeoPoint, GeometryId, PathId};

use crate::store::{GeometryNode, MemoryPathStore, PathSequence};

/// Default snapping radius for path ends.
pub const DEFAULT_SNAP_M: f64 = 20.0;

#[derive(Clone)]
struct EndEntry {
    point: [f64; 2],
    node:  GeometryNode,
}

impl RTreeObject for EndEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub paths:      usize,
    /// Paths with fewer than two points.
    pub skipped:    usize,
    pub geometries: usize,
    /// Path ends that reused an existing geometry.
    pub snapped:    usize,
}

/// Accumulates path sequences with shared end geometries.
///
/// # Example
///
/// ```
/// use tn_core::{GeoPoint, PathId};
/// use tn_route::PathImporter;
///
/// let mut imp = PathImporter::new();
/// imp.add_path(PathId(1), &[GeoPoint::new(35.0, 138.0), GeoPoint::new(35.0, 138.01)]);
/// imp.add_path(PathId(2), &[GeoPoint::new(35.0, 138.01), GeoPoint::new(35.01, 138.01)]);
/// assert_eq!(imp.stats().geometries, 3);
/// ```
pub struct PathImporter {
    snap_m:        f64,
    next_geometry: u64,
    ends:          RTree<EndEntry>,
    sequences:     Vec<PathSequence>,
    stats:         ImportStats,
}

impl Default for PathImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathImporter {
    pub fn new() -> Self {
        Self {
            snap_m:        DEFAULT_SNAP_M,
            next_geometry: 1,
            ends:          RTree::new(),
            sequences:     Vec::new(),
            stats:         ImportStats::default(),
        }
    }

    /// Snapping radius in metres; `0` disables snapping except for exact
    /// coincidence.
    pub fn with_snap_m(mut self, snap_m: f64) -> Self {
        self.snap_m = snap_m.max(0.0);
        self
    }

    /// Add one path.  Returns `false` (and records nothing) for a path with
    /// fewer than two points.
    pub fn add_path(&mut self, path: PathId, points: &[GeoPoint]) -> bool {
        if points.len() < 2 {
            log::warn!("import: path {path} has {} points, skipping", points.len());
            self.stats.skipped += 1;
            return false;
        }

        let last = points.len() - 1;
        let mut nodes = Vec::with_capacity(points.len());
        for (i, &pos) in points.iter().enumerate() {
            let node = if i == 0 || i == last {
                self.end_node(pos)
            } else {
                self.fresh(pos)
            };
            nodes.push(node);
        }

        self.sequences.push(PathSequence { path, nodes });
        self.stats.paths += 1;
        true
    }

    fn fresh(&mut self, pos: GeoPoint) -> GeometryNode {
        let node = GeometryNode { id: GeometryId(self.next_geometry), pos };
        self.next_geometry += 1;
        self.stats.geometries += 1;
        node
    }

    fn end_node(&mut self, pos: GeoPoint) -> GeometryNode {
        if let Some(existing) = self.nearest_end(pos) {
            self.stats.snapped += 1;
            return existing;
        }
        let node = self.fresh(pos);
        self.ends.insert(EndEntry { point: [pos.lat, pos.lon], node });
        node
    }

    /// Closest stored end within the snap radius; ties go to the lower id.
    fn nearest_end(&self, pos: GeoPoint) -> Option<GeometryNode> {
        let (lo, hi) = pos.degree_envelope(self.snap_m).corners();
        self.ends
            .locate_in_envelope(&AABB::from_corners(lo, hi))
            .map(|e| (pos.distance_m(e.node.pos), e.node))
            .filter(|(d, _)| *d <= self.snap_m)
            .min_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)))
            .map(|(_, node)| node)
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    pub fn sequences(&self) -> &[PathSequence] {
        &self.sequences
    }

    /// Consume the importer, returning its sequences and counts.
    pub fn finish(self) -> (Vec<PathSequence>, ImportStats) {
        log::info!(
            "import: {} paths, {} geometries, {} ends snapped, {} skipped",
            self.stats.paths,
            self.stats.geometries,
            self.stats.snapped,
            self.stats.skipped,
        );
        (self.sequences, self.stats)
    }

    pub fn into_store(self) -> MemoryPathStore {
        let (sequences, _) = self.finish();
        MemoryPathStore::from_sequences(&sequences)
    }
}
