//! Routing trait, Dijkstra, and the geometry-id front end.
//!
//! # Cost units
//!
//! Costs are whole metres (`u64`), summed from the rounded arc lengths of
//! [`RoutingNetwork::edge_length_m`].
//!
//! # Outcomes
//!
//! | Query                                   | Result                        |
//! |-----------------------------------------|-------------------------------|
//! | endpoint geometry not in the store      | `Err(GeometryNotFound)`       |
//! | `from == to`                            | `Ok` empty route              |
//! | no connecting path                      | `Ok` empty route              |
//! | connected                               | `Ok` route with its path ids  |

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use tn_core::{EdgeId, GeometryId, NodeId, PathId};

use crate::network::RoutingNetwork;
use crate::store::PathStore;
use crate::{RouteError, RouteResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Stored paths traversed, each once, in source → destination order.
    pub paths: Vec<PathId>,
    /// Total length in metres.
    pub distance_m: u64,
    /// Geometry points visited, source and destination included.  Empty for
    /// an empty route.
    pub geometries: Vec<GeometryId>,
}

impl Route {
    /// `true` when no path is traversed: the endpoints coincide or are not
    /// connected.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// Implementations must be `Send + Sync` so one router can serve concurrent
/// queries against a shared network.
pub trait Router: Send + Sync {
    /// Shortest route between two nodes of `network`.  An unreachable
    /// destination yields an empty route, not an error.
    fn route(&self, network: &RoutingNetwork, from: NodeId, to: NodeId) -> RouteResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Binary-heap Dijkstra over the CSR arcs with early exit at the target.
///
/// Ties are broken on node id, and an arc only replaces a predecessor when
/// it is strictly shorter, so equal-cost alternatives resolve the same way on
/// every run.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &RoutingNetwork, from: NodeId, to: NodeId) -> RouteResult<Route> {
        for n in [from, to] {
            if n.index() >= network.node_count() {
                return Err(RouteError::UnknownNode(n));
            }
        }
        Ok(dijkstra(network, from, to))
    }
}

fn dijkstra(network: &RoutingNetwork, from: NodeId, to: NodeId) -> Route {
    if from == to {
        return Route::default();
    }

    let n = network.node_count();
    let mut dist      = vec![u64::MAX; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return reconstruct(network, &prev_edge, from, to, cost);
        }

        // Stale entry.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(network.edge_length_m[edge.index()] as u64);

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    log::debug!("route: no connection from {from} to {to}");
    Route::default()
}

fn reconstruct(
    network: &RoutingNetwork,
    prev_edge: &[EdgeId],
    from: NodeId,
    to: NodeId,
    distance_m: u64,
) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();

    let mut seen = FxHashSet::default();
    let mut paths = Vec::new();
    let mut geometries = Vec::with_capacity(edges.len() + 1);
    geometries.push(network.geometry_of(from));
    for e in edges {
        let path = network.edge_path[e.index()];
        if seen.insert(path) {
            paths.push(path);
        }
        geometries.push(network.geometry_of(network.edge_to[e.index()]));
    }

    Route { paths, distance_m, geometries }
}

// ── RouteFinder ───────────────────────────────────────────────────────────────

/// Answers queries phrased in stored geometry ids.
///
/// The network is built once from the store when the finder is created;
/// the store is kept to tell unknown geometries from isolated ones.
pub struct RouteFinder<S, R = DijkstraRouter> {
    store:   S,
    network: RoutingNetwork,
    router:  R,
}

impl<S: PathStore> RouteFinder<S, DijkstraRouter> {
    pub fn new(store: S) -> RouteResult<Self> {
        Self::with_router(store, DijkstraRouter)
    }
}

impl<S: PathStore, R: Router> RouteFinder<S, R> {
    pub fn with_router(store: S, router: R) -> RouteResult<Self> {
        let network = RoutingNetwork::from_store(&store)?;
        Ok(Self { store, network, router })
    }

    pub fn network(&self) -> &RoutingNetwork {
        &self.network
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shortest route between two stored geometries.
    pub fn find(&self, from: GeometryId, to: GeometryId) -> RouteResult<Route> {
        for g in [from, to] {
            if !self.store.contains_geometry(g)? {
                return Err(RouteError::GeometryNotFound(g));
            }
        }
        if from == to {
            return Ok(Route::default());
        }
        // Stored but referenced by no path: nothing reaches it.
        let (Some(a), Some(b)) = (self.network.node_of_geometry(from), self.network.node_of_geometry(to))
        else {
            log::debug!("route: {from} or {to} is not on any path");
            return Ok(Route::default());
        };
        self.router.route(&self.network, a, b)
    }
}
