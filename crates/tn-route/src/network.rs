//! Routing graph over stored geometry points.
//!
//! # Data layout
//!
//! One [`NodeId`] per distinct [`GeometryId`].  Every pair of
//! sequence-adjacent geometries of a stored path becomes two directed arcs,
//! kept in **Compressed Sparse Row (CSR)** format: the outgoing arcs of node
//! `n` are
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Arcs of one node keep the order in which they were added, so a network
//! built twice from the same store is identical arc for arc.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest node, for callers
//! that start from a coordinate instead of a geometry id.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use tn_core::{EdgeId, GeoPoint, GeometryId, NodeId, PathId};

use crate::store::PathStore;
use crate::RouteResult;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in degree space.  Good enough to pick the
    /// nearest vertex on a trail network of regional extent.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── RoutingNetwork ────────────────────────────────────────────────────────────

/// Undirected path graph in CSR form, plus the geometry lookup and spatial
/// index.  Build with [`RoutingNetworkBuilder`] or
/// [`from_store`](Self::from_store).
pub struct RoutingNetwork {
    /// Position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Stored geometry each node stands for.  Indexed by `NodeId`.
    pub node_geometry: Vec<GeometryId>,

    /// CSR row pointer, length `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source node of each arc, for walking predecessor arcs back.
    pub edge_from: Vec<NodeId>,

    pub edge_to: Vec<NodeId>,

    /// Great-circle length of each arc, rounded to whole metres.
    pub edge_length_m: Vec<u32>,

    /// Stored path each arc belongs to.
    pub edge_path: Vec<PathId>,

    by_geometry: FxHashMap<GeometryId, NodeId>,
    spatial_idx: RTree<NodeEntry>,
}

impl RoutingNetwork {
    pub fn empty() -> Self {
        RoutingNetworkBuilder::new().build()
    }

    /// Build the graph from every path sequence in `store`.
    pub fn from_store<S: PathStore + ?Sized>(store: &S) -> RouteResult<Self> {
        let sequences = store.path_sequences()?;
        let mut b = RoutingNetworkBuilder::new();
        let mut short = 0usize;
        for seq in &sequences {
            if seq.nodes.len() < 2 {
                short += 1;
                log::warn!("route: path {} has {} geometry points, no arcs", seq.path, seq.nodes.len());
            }
            let ids: Vec<NodeId> = seq.nodes.iter().map(|g| b.add_node(g.id, g.pos)).collect();
            for pair in ids.windows(2) {
                if pair[0] != pair[1] {
                    b.add_link(pair[0], pair[1], seq.path);
                }
            }
        }
        let net = b.build();
        log::info!(
            "route: network of {} nodes, {} arcs from {} paths ({} too short)",
            net.node_count(),
            net.edge_count(),
            sequences.len(),
            short,
        );
        Ok(net)
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    /// Number of directed arcs (two per stored segment).
    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Node standing for `geometry`, if any path references it.
    pub fn node_of_geometry(&self, geometry: GeometryId) -> Option<NodeId> {
        self.by_geometry.get(&geometry).copied()
    }

    pub fn geometry_of(&self, node: NodeId) -> GeometryId {
        self.node_geometry[node.index()]
    }

    /// Nearest node to `pos`; `None` only for an empty network.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }
}

// ── RoutingNetworkBuilder ─────────────────────────────────────────────────────

/// Incremental construction of a [`RoutingNetwork`].
///
/// # Example
///
/// ```
/// use tn_core::{GeoPoint, GeometryId, PathId};
/// use tn_route::RoutingNetworkBuilder;
///
/// let mut b = RoutingNetworkBuilder::new();
/// let a = b.add_node(GeometryId(1), GeoPoint::new(35.0, 138.0));
/// let c = b.add_node(GeometryId(2), GeoPoint::new(35.0, 138.001));
/// b.add_link(a, c, PathId(7));
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2);
/// ```
#[derive(Default)]
pub struct RoutingNetworkBuilder {
    nodes:       Vec<(GeometryId, GeoPoint)>,
    by_geometry: FxHashMap<GeometryId, NodeId>,
    raw_edges:   Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    length_m: u32,
    path:     PathId,
}

impl RoutingNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `geometry`, created on first sight.  Later calls for the
    /// same geometry return the existing node and ignore `pos`.
    pub fn add_node(&mut self, geometry: GeometryId, pos: GeoPoint) -> NodeId {
        if let Some(&id) = self.by_geometry.get(&geometry) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push((geometry, pos));
        self.by_geometry.insert(geometry, id);
        id
    }

    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: u32, path: PathId) {
        self.raw_edges.push(RawEdge { from, to, length_m, path });
    }

    /// Arcs in both directions between two nodes of `path`, weighted by
    /// their rounded great-circle distance.
    pub fn add_link(&mut self, a: NodeId, b: NodeId, path: PathId) {
        let d = self.nodes[a.index()].1.distance_m(self.nodes[b.index()].1);
        let length_m = d.round() as u32;
        self.add_directed_edge(a, b, length_m, path);
        self.add_directed_edge(b, a, length_m, path);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    pub fn build(self) -> RoutingNetwork {
        let node_count = self.nodes.len();

        // Stable: arcs of one node keep insertion order.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:     Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<u32>    = raw.iter().map(|e| e.length_m).collect();
        let edge_path:     Vec<PathId> = raw.iter().map(|e| e.path).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, (_, p))| NodeEntry { point: [p.lat, p.lon], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        let (node_geometry, node_pos) = self.nodes.into_iter().unzip();

        RoutingNetwork {
            node_pos,
            node_geometry,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_path,
            by_geometry: self.by_geometry,
            spatial_idx,
        }
    }
}
