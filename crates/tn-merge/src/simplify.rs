//! Degree-2 contraction.
//!
//! Repeats passes over the graph until no degree-2 node can be removed.  Each
//! pass snapshots the degree-2 nodes in ascending id order and contracts them
//! one by one; a node is re-checked just before its turn, since an earlier
//! contraction in the same pass may have removed it or changed its degree.
//!
//! Contracting node `n` with incident edges `e1 < e2` towards neighbours
//! `n1`, `n2`:
//!
//! ```text
//!   n1 ──e1── n ──e2── n2     ⇒     n1 ────merged_{w1}_{w2}──── n2
//! ```
//!
//! The merged geometry runs `n1 → n → n2`, with the shared junction point
//! appearing once.  Which end of each original geometry touches `n` is read
//! from the [`ClusterMap`] entry of the way's start endpoint.
//!
//! A node whose two edges lead to the same neighbour, or whose edge is a
//! self-loop, has no unambiguous contraction and is left in place.

use tn_core::{ClusterId, EndpointId, NodeId, TrailPoint, WayId};

use crate::cluster::ClusterMap;
use crate::graph::{Edge, TrailGraph};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimplifyStats {
    pub passes:          usize,
    pub contracted:      usize,
    /// Degree-2 nodes left in place because their edges form a loop.
    pub skipped_loops:   usize,
    /// Degree-2 nodes left in place because edge or cluster data was missing.
    pub skipped_missing: usize,
}

enum Outcome {
    Contracted,
    Stale,
    Loop,
    Missing,
}

/// Contract every contractible degree-2 node of `graph`, keeping `clusters`
/// in step with the merged ways.
pub fn simplify(graph: &mut TrailGraph, clusters: &mut ClusterMap) -> SimplifyStats {
    let mut stats = SimplifyStats::default();
    let (nodes_before, edges_before) = (graph.node_count(), graph.edge_count());

    loop {
        let candidates: Vec<NodeId> = graph
            .nodes()
            .filter(|(_, n)| n.edges.len() == 2)
            .map(|(id, _)| id)
            .collect();
        if candidates.is_empty() {
            stats.skipped_loops = 0;
            stats.skipped_missing = 0;
            break;
        }

        stats.passes += 1;
        let (mut contracted, mut loops, mut missing) = (0, 0, 0);
        for n in candidates {
            match contract(graph, clusters, n) {
                Outcome::Contracted => contracted += 1,
                Outcome::Stale => {}
                Outcome::Loop => loops += 1,
                Outcome::Missing => missing += 1,
            }
        }
        log::debug!(
            "simplify pass {}: {} candidates contracted, {} loops, {} missing",
            stats.passes,
            contracted,
            loops,
            missing,
        );

        stats.contracted += contracted;
        // What the last pass could not contract is what remains.
        stats.skipped_loops = loops;
        stats.skipped_missing = missing;
        if contracted == 0 {
            break;
        }
    }

    log::info!(
        "simplify: {} → {} nodes, {} → {} edges in {} passes ({} contracted, {} loops kept)",
        nodes_before,
        graph.node_count(),
        edges_before,
        graph.edge_count(),
        stats.passes,
        stats.contracted,
        stats.skipped_loops,
    );
    stats
}

fn contract(graph: &mut TrailGraph, clusters: &mut ClusterMap, n: NodeId) -> Outcome {
    let Some(node) = graph.node(n) else {
        return Outcome::Stale;
    };
    let &[ea, eb] = node.edges.as_slice() else {
        return Outcome::Stale;
    };
    if ea == eb {
        return Outcome::Loop;
    }
    let n_cluster = node.cluster;
    let (e1, e2) = if ea < eb { (ea, eb) } else { (eb, ea) };

    let (Some(edge1), Some(edge2)) = (graph.edge(e1), graph.edge(e2)) else {
        log::warn!("simplify: node {n} references a missing edge, skipping");
        return Outcome::Missing;
    };
    if edge1.is_self_loop() || edge2.is_self_loop() {
        return Outcome::Loop;
    }
    let (n1, n2) = (edge1.opposite(n), edge2.opposite(n));
    if n1 == n2 {
        return Outcome::Loop;
    }
    let (Some(c1), Some(c2)) = (graph.node(n1).map(|x| x.cluster), graph.node(n2).map(|x| x.cluster)) else {
        log::warn!("simplify: node {n} has a missing neighbour, skipping");
        return Outcome::Missing;
    };

    // geometry 1 must end at n, geometry 2 must start at n.
    let Some(starts1_at_n) = starts_at(clusters, edge1, n_cluster) else {
        return Outcome::Missing;
    };
    let Some(starts2_at_n) = starts_at(clusters, edge2, n_cluster) else {
        return Outcome::Missing;
    };
    let geometry = join(&edge1.geometry, starts1_at_n, &edge2.geometry, !starts2_at_n);
    let (w1, w2) = (edge1.way.clone(), edge2.way.clone());
    let merged = WayId::merged(&w1, &w2);

    graph.remove_node(n);
    graph.add_edge(n1, n2, merged.clone(), geometry);

    clusters.remove_way(&w1);
    clusters.remove_way(&w2);
    clusters.insert(EndpointId::start(&merged), c1);
    clusters.insert(EndpointId::end(&merged), c2);
    Outcome::Contracted
}

/// Whether `edge`'s geometry starts in cluster `at`, according to the
/// cluster map.  `None` if the way's start endpoint is unmapped.
fn starts_at(clusters: &ClusterMap, edge: &Edge, at: ClusterId) -> Option<bool> {
    match clusters.get(&EndpointId::start(&edge.way)) {
        Some(c) => Some(c == at),
        None => {
            log::warn!("simplify: way {} has no start cluster, skipping", edge.way);
            None
        }
    }
}

/// `first` (reversed if `rev_first`) followed by `second` (reversed if
/// `rev_second`) without its leading point.
fn join(first: &[TrailPoint], rev_first: bool, second: &[TrailPoint], rev_second: bool) -> Vec<TrailPoint> {
    let mut out = Vec::with_capacity(first.len() + second.len().saturating_sub(1));
    if rev_first {
        out.extend(first.iter().rev().cloned());
    } else {
        out.extend_from_slice(first);
    }
    if rev_second {
        out.extend(second.iter().rev().skip(1).cloned());
    } else {
        out.extend(second.iter().skip(1).cloned());
    }
    out
}
