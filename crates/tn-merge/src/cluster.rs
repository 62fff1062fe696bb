//! Junction clustering.
//!
//! Endpoints that lie within `horizontal_m` of each other (great-circle) and
//! differ in altitude by less than `vertical_m` are judged to be the same
//! physical junction.  The relation is closed transitively with a
//! [`UnionFind`], so the result is a partition of the input endpoints.
//!
//! # Concurrency
//!
//! Pair discovery runs on the Rayon pool: one R-tree query per endpoint,
//! proposing only pairs `(i, j)` with `i < j`.  Proposals travel over an
//! `mpsc` channel to a single applier thread, which owns the union-find.
//! The applier sorts the proposals before applying them, so the partition is
//! the same however the discovery work was scheduled.
//!
//! # Same-way guard
//!
//! The two ends of one way are never placed in the same cluster.  A union
//! that would join a set holding one end of a way with a set holding the
//! other end is rejected and counted.

use std::sync::mpsc;

use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use tn_core::{ClusterId, EndpointId, GeoPoint, WayId};

use crate::union_find::UnionFind;
use crate::way::Endpoint;
use crate::{config_error, MergeResult};

// ── Config & stats ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum great-circle distance between two endpoints of one junction.
    pub horizontal_m: f64,
    /// Altitude differences at or above this keep endpoints apart.
    pub vertical_m:   f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { horizontal_m: 25.0, vertical_m: 15.0 }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> MergeResult<()> {
        for (name, v) in [("horizontal_m", self.horizontal_m), ("vertical_m", self.vertical_m)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(config_error(format!("{name} must be positive, got {v}")));
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub endpoints:         usize,
    /// Pairs that passed the distance and altitude tests.
    pub candidate_pairs:   usize,
    /// Candidate pairs that joined two previously separate clusters.
    pub unions:            usize,
    pub rejected_same_way: usize,
    pub clusters:          usize,
}

// ── ClusterMap ────────────────────────────────────────────────────────────────

/// `EndpointId → ClusterId`, plus each cluster's anchor position.
///
/// Cluster ids are dense.  After [`cluster_endpoints`] they are numbered in
/// order of each cluster's lowest endpoint index, and the anchor is that
/// endpoint's coordinate.  The simplifier inserts entries for merged ways and
/// removes the entries of the ways it consumed.
#[derive(Clone, Debug, Default)]
pub struct ClusterMap {
    assignment: FxHashMap<EndpointId, ClusterId>,
    anchors:    Vec<GeoPoint>,
}

impl ClusterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new cluster anchored at `anchor`.
    pub fn add_cluster(&mut self, anchor: GeoPoint) -> ClusterId {
        let id = ClusterId(self.anchors.len() as u32);
        self.anchors.push(anchor);
        id
    }

    #[inline]
    pub fn get(&self, endpoint: &EndpointId) -> Option<ClusterId> {
        self.assignment.get(endpoint).copied()
    }

    /// Cluster of both ends of `way`, if both are mapped.
    pub fn ends_of(&self, way: &WayId) -> Option<(ClusterId, ClusterId)> {
        Some((self.get(&EndpointId::start(way))?, self.get(&EndpointId::end(way))?))
    }

    pub fn insert(&mut self, endpoint: EndpointId, cluster: ClusterId) -> Option<ClusterId> {
        self.assignment.insert(endpoint, cluster)
    }

    pub fn remove(&mut self, endpoint: &EndpointId) -> Option<ClusterId> {
        self.assignment.remove(endpoint)
    }

    /// Drop both endpoint entries of `way`.
    pub fn remove_way(&mut self, way: &WayId) {
        self.assignment.remove(&EndpointId::start(way));
        self.assignment.remove(&EndpointId::end(way));
    }

    pub fn anchor(&self, cluster: ClusterId) -> Option<GeoPoint> {
        self.anchors.get(cluster.index()).copied()
    }

    /// Number of mapped endpoints.
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    pub fn cluster_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EndpointId, ClusterId)> + '_ {
        self.assignment.iter().map(|(e, &c)| (e, c))
    }

    /// Endpoints currently mapped to `cluster`, sorted for stable output.
    pub fn members(&self, cluster: ClusterId) -> Vec<&EndpointId> {
        let mut out: Vec<&EndpointId> = self
            .assignment
            .iter()
            .filter(|&(_, &c)| c == cluster)
            .map(|(e, _)| e)
            .collect();
        out.sort();
        out
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// `[lat, lon]` of one endpoint, tagged with its index in the input slice.
struct EndpointEntry {
    point: [f64; 2],
    idx:   u32,
}

impl RTreeObject for EndpointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

// ── Clustering ────────────────────────────────────────────────────────────────

/// Partition `endpoints` into junction clusters.
///
/// Every input endpoint is mapped, singletons included.
pub fn cluster_endpoints(
    endpoints: &[Endpoint],
    cfg: &ClusterConfig,
) -> MergeResult<(ClusterMap, ClusterStats)> {
    cfg.validate()?;
    let n = endpoints.len();
    if u32::try_from(n).is_err() {
        return Err(config_error(format!("too many endpoints to cluster: {n}")));
    }

    let tree = RTree::bulk_load(
        endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| EndpointEntry { point: [e.lat, e.lon], idx: i as u32 })
            .collect(),
    );

    // Dense way index per endpoint, for the same-way guard.
    let mut way_index: FxHashMap<&WayId, u32> = FxHashMap::default();
    let way_of: Vec<u32> = endpoints
        .iter()
        .map(|e| {
            let next = way_index.len() as u32;
            *way_index.entry(e.way_id()).or_insert(next)
        })
        .collect();

    let (tx, rx) = mpsc::channel::<(u32, u32)>();
    let (mut uf, mut stats) = std::thread::scope(|s| {
        let way_of = &way_of;
        let applier = s.spawn(move || apply_unions(rx, way_of));

        endpoints.par_iter().enumerate().for_each_with(tx, |tx, (i, a)| {
            let (lo, hi) = a.pos().degree_envelope(cfg.horizontal_m).corners();
            for cand in tree.locate_in_envelope(&AABB::from_corners(lo, hi)) {
                let j = cand.idx as usize;
                if j <= i {
                    continue;
                }
                let b = &endpoints[j];
                if way_of[i] == way_of[j]
                    || (a.alt - b.alt).abs() >= cfg.vertical_m
                    || a.pos().distance_m(b.pos()) > cfg.horizontal_m
                {
                    continue;
                }
                // The applier only stops once every sender is gone.
                let _ = tx.send((i as u32, j as u32));
            }
        });

        match applier.join() {
            Ok(r) => r,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    // Canonical numbering: clusters in order of their lowest endpoint index.
    let mut map = ClusterMap::new();
    let mut root_cluster: Vec<ClusterId> = vec![ClusterId::INVALID; n];
    for (i, ep) in endpoints.iter().enumerate() {
        let root = uf.find(i as u32) as usize;
        if root_cluster[root] == ClusterId::INVALID {
            root_cluster[root] = map.add_cluster(ep.pos());
        }
        map.insert(ep.id.clone(), root_cluster[root]);
    }

    stats.endpoints = n;
    stats.clusters = map.cluster_count();
    log::info!(
        "clustered {} endpoints into {} junctions ({} candidate pairs, {} unions, {} rejected as same-way)",
        stats.endpoints,
        stats.clusters,
        stats.candidate_pairs,
        stats.unions,
        stats.rejected_same_way,
    );
    Ok((map, stats))
}

/// Single-writer side of clustering: drain proposals, then apply them in
/// sorted order.
fn apply_unions(rx: mpsc::Receiver<(u32, u32)>, way_of: &[u32]) -> (UnionFind, ClusterStats) {
    let mut pairs: Vec<(u32, u32)> = rx.into_iter().collect();
    pairs.sort_unstable();
    pairs.dedup();

    let mut uf = UnionFind::new(way_of.len());
    let mut ways: Vec<FxHashSet<u32>> = way_of.iter().map(|&w| std::iter::once(w).collect()).collect();
    let mut stats = ClusterStats { candidate_pairs: pairs.len(), ..ClusterStats::default() };

    for (i, j) in pairs {
        let ra = uf.find(i);
        let rb = uf.find(j);
        if ra == rb {
            continue;
        }
        let (small, large) = if ways[ra as usize].len() <= ways[rb as usize].len() {
            (ra, rb)
        } else {
            (rb, ra)
        };
        if ways[small as usize].iter().any(|w| ways[large as usize].contains(w)) {
            stats.rejected_same_way += 1;
            continue;
        }
        uf.union(ra, rb);
        let root = uf.find(ra);
        let other = if root == ra { rb } else { ra };
        let moved = std::mem::take(&mut ways[other as usize]);
        ways[root as usize].extend(moved);
        stats.unions += 1;
    }
    (uf, stats)
}
