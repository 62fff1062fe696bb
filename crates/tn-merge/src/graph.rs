//! Trail multigraph.
//!
//! # Data layout
//!
//! Nodes and edges live in two arenas addressed by [`NodeId`] / [`EdgeId`].
//! Removal tombstones the slot (`None`) so handles held elsewhere never alias
//! a different element.  Each node keeps an incidence list of edge ids; a
//! self-loop appears in its node's list **twice**, so it contributes 2 to the
//! degree, as in the usual multigraph convention.
//!
//! Parallel edges and self-loops are both legal.  A circular spur is real
//! trail topology.

use rustc_hash::FxHashMap;

use tn_core::{ClusterId, EdgeId, GeoPoint, NodeId, TrailPoint, WayId};

use crate::cluster::ClusterMap;
use crate::way::WaySet;

// ── Node / Edge ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub cluster: ClusterId,
    pub pos:     GeoPoint,
    /// Incident edges; self-loops are listed twice.
    pub edges:   Vec<EdgeId>,
}

/// One trail segment between two junctions.
///
/// `geometry` runs from `from` to `to`: its first point lies in `from`'s
/// cluster and its last point in `to`'s.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub way:      WayId,
    pub geometry: Vec<TrailPoint>,
    pub from:     NodeId,
    pub to:       NodeId,
}

impl Edge {
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// The end of this edge that is not `node`.  For a self-loop, `node`.
    #[inline]
    pub fn opposite(&self, node: NodeId) -> NodeId {
        if self.from == node { self.to } else { self.from }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes:            usize,
    pub edges:            usize,
    pub self_loops:       usize,
    pub skipped_unmapped: usize,
}

// ── TrailGraph ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct TrailGraph {
    nodes:      Vec<Option<Node>>,
    edges:      Vec<Option<Edge>>,
    by_cluster: FxHashMap<ClusterId, NodeId>,
    live_nodes: usize,
    live_edges: usize,
}

impl TrailGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One edge per way whose two endpoints are both mapped, one node per
    /// cluster such an edge touches.
    ///
    /// Ways with an unmapped endpoint are skipped with a warning; no node is
    /// ever created for an unknown endpoint.
    pub fn build(ways: &WaySet, clusters: &ClusterMap) -> (Self, BuildStats) {
        let mut graph = TrailGraph::new();
        let mut stats = BuildStats::default();

        for way in ways.iter() {
            let Some((c_start, c_end)) = clusters.ends_of(&way.id) else {
                log::warn!("graph: way {} has an unmapped endpoint, skipping", way.id);
                stats.skipped_unmapped += 1;
                continue;
            };
            let from = graph.node_for_cluster(c_start, clusters.anchor(c_start).unwrap_or_else(|| way.first().pos()));
            let to = graph.node_for_cluster(c_end, clusters.anchor(c_end).unwrap_or_else(|| way.last().pos()));
            if from == to {
                stats.self_loops += 1;
            }
            graph.add_edge(from, to, way.id.clone(), way.geometry.clone());
        }

        stats.nodes = graph.node_count();
        stats.edges = graph.edge_count();
        log::info!(
            "graph: {} nodes, {} edges ({} self-loops, {} ways skipped)",
            stats.nodes,
            stats.edges,
            stats.self_loops,
            stats.skipped_unmapped,
        );
        (graph, stats)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Node of `cluster`, created at `pos` if it does not exist yet.
    pub fn node_for_cluster(&mut self, cluster: ClusterId, pos: GeoPoint) -> NodeId {
        if let Some(&id) = self.by_cluster.get(&cluster) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node { cluster, pos, edges: Vec::new() }));
        self.by_cluster.insert(cluster, id);
        self.live_nodes += 1;
        id
    }

    /// Add an edge `from → to`.  Both nodes must be live.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, way: WayId, geometry: Vec<TrailPoint>) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge { way, geometry, from, to }));
        for end in [from, to] {
            if let Some(node) = self.node_mut(end) {
                node.edges.push(id);
            }
        }
        self.live_edges += 1;
        id
    }

    /// Remove `edge` and detach it from its end nodes.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Option<Edge> {
        let removed = self.edges.get_mut(edge.index())?.take()?;
        for end in [removed.from, removed.to] {
            if let Some(node) = self.node_mut(end) {
                if let Some(pos) = node.edges.iter().position(|&e| e == edge) {
                    node.edges.swap_remove(pos);
                }
            }
        }
        self.live_edges -= 1;
        Some(removed)
    }

    /// Remove `node` together with every edge still incident to it.
    pub fn remove_node(&mut self, node: NodeId) -> Option<Node> {
        let incident = self.node(node)?.edges.clone();
        for e in incident {
            self.remove_edge(e);
        }
        let removed = self.nodes.get_mut(node.index())?.take()?;
        self.by_cluster.remove(&removed.cluster);
        self.live_nodes -= 1;
        Some(removed)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())?.as_ref()
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())?.as_mut()
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())?.as_ref()
    }

    pub fn node_of_cluster(&self, cluster: ClusterId) -> Option<NodeId> {
        self.by_cluster.get(&cluster).copied()
    }

    /// Number of incident edge ends; 0 for a missing node.
    #[inline]
    pub fn degree(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| n.edges.len())
    }

    pub fn node_count(&self) -> usize {
        self.live_nodes
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Live nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Live edges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i as u32), e)))
    }
}
