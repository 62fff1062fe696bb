//! Persisted path records.
//!
//! # Model
//!
//! A stored path is an ordered list of geometry points.  Geometry points are
//! rows of their own and may be **shared** between paths: two trails that
//! meet at a junction reference the same geometry id there, which is what
//! connects them in the routing graph.
//!
//! ```text
//! path_geometries      (id, lat, lon)
//! path_geometry_orders (path_id, geometry_id, sequence)
//! ```

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use tn_core::{GeoPoint, GeometryId, PathId};

use crate::{RouteError, RouteResult};

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometryNode {
    pub id:  GeometryId,
    pub pos: GeoPoint,
}

/// One path's geometry in `sequence` order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathSequence {
    pub path:  PathId,
    pub nodes: Vec<GeometryNode>,
}

// ── PathStore trait ───────────────────────────────────────────────────────────

/// Read access to the persisted network.
pub trait PathStore {
    /// Whether a geometry row with this id exists, whether or not any path
    /// references it.
    fn contains_geometry(&self, id: GeometryId) -> RouteResult<bool>;

    /// Every path with its ordered geometry, in ascending path id order.
    fn path_sequences(&self) -> RouteResult<Vec<PathSequence>>;
}

impl<S: PathStore + ?Sized> PathStore for &S {
    fn contains_geometry(&self, id: GeometryId) -> RouteResult<bool> {
        (**self).contains_geometry(id)
    }

    fn path_sequences(&self) -> RouteResult<Vec<PathSequence>> {
        (**self).path_sequences()
    }
}

// ── MemoryPathStore ───────────────────────────────────────────────────────────

/// In-memory [`PathStore`], for tests and for routing straight from an
/// import without a database.
///
/// # Example
///
/// ```
/// use tn_core::{GeoPoint, GeometryId, PathId};
/// use tn_route::{MemoryPathStore, PathStore};
///
/// let mut store = MemoryPathStore::new();
/// store.add_geometry(GeometryId(1), GeoPoint::new(35.0, 138.0));
/// store.add_geometry(GeometryId(2), GeoPoint::new(35.0, 138.001));
/// store.add_path(PathId(10), &[GeometryId(1), GeometryId(2)]).unwrap();
/// assert_eq!(store.path_sequences().unwrap().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryPathStore {
    geometries: FxHashMap<GeometryId, GeoPoint>,
    /// path → (sequence, geometry)
    orders:     BTreeMap<PathId, Vec<(u32, GeometryId)>>,
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from complete sequences, registering their geometry rows.
    pub fn from_sequences(sequences: &[PathSequence]) -> Self {
        let mut store = Self::new();
        for seq in sequences {
            for (i, node) in seq.nodes.iter().enumerate() {
                store.geometries.insert(node.id, node.pos);
                store.orders.entry(seq.path).or_default().push((i as u32, node.id));
            }
        }
        store
    }

    pub fn add_geometry(&mut self, id: GeometryId, pos: GeoPoint) {
        self.geometries.insert(id, pos);
    }

    /// Append one order row.  The geometry must already exist.
    pub fn add_order(&mut self, path: PathId, geometry: GeometryId, sequence: u32) -> RouteResult<()> {
        if !self.geometries.contains_key(&geometry) {
            return Err(RouteError::DanglingOrder { path, geometry });
        }
        self.orders.entry(path).or_default().push((sequence, geometry));
        Ok(())
    }

    /// Add `geometries` as the whole sequence of `path`, numbered from 0.
    pub fn add_path(&mut self, path: PathId, geometries: &[GeometryId]) -> RouteResult<()> {
        for (i, &g) in geometries.iter().enumerate() {
            self.add_order(path, g, i as u32)?;
        }
        Ok(())
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn path_count(&self) -> usize {
        self.orders.len()
    }
}

impl PathStore for MemoryPathStore {
    fn contains_geometry(&self, id: GeometryId) -> RouteResult<bool> {
        Ok(self.geometries.contains_key(&id))
    }

    fn path_sequences(&self) -> RouteResult<Vec<PathSequence>> {
        let mut out = Vec::with_capacity(self.orders.len());
        for (&path, orders) in &self.orders {
            let mut orders = orders.clone();
            orders.sort_by_key(|&(seq, _)| seq);
            let nodes = orders
                .into_iter()
                .filter_map(|(_, id)| self.geometries.get(&id).map(|&pos| GeometryNode { id, pos }))
                .collect();
            out.push(PathSequence { path, nodes });
        }
        Ok(out)
    }
}
