//! Way and endpoint records.
//!
//! Both are immutable once loaded.  Clustering maps endpoints to junctions
//! but never edits them; filtering moves retained records without touching
//! their contents.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use tn_core::{path_length_m, Bounds, EndpointId, GeoPoint, TrailPoint, WayEnd, WayId};

// ── Way ───────────────────────────────────────────────────────────────────────

/// One input trail segment.  `geometry` always has at least two points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id:       WayId,
    pub geometry: Vec<TrailPoint>,
    /// External node ids parallel to `geometry`, when the source had them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes:    Vec<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags:     BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds:   Option<Bounds>,
}

impl Way {
    pub fn first(&self) -> &TrailPoint {
        &self.geometry[0]
    }

    pub fn last(&self) -> &TrailPoint {
        &self.geometry[self.geometry.len() - 1]
    }

    /// Cumulative great-circle length in metres.
    pub fn length_m(&self) -> f64 {
        path_length_m(&self.geometry)
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// First or last coordinate of a way, with its resolved elevation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id:  EndpointId,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl Endpoint {
    pub fn new(way: &WayId, end: WayEnd, point: &TrailPoint, alt: f64) -> Self {
        Self {
            id:  EndpointId { way: way.clone(), end },
            lat: point.lat,
            lon: point.lon,
            alt,
        }
    }

    #[inline]
    pub fn way_id(&self) -> &WayId {
        &self.id.way
    }

    #[inline]
    pub fn is_start(&self) -> bool {
        self.id.is_start()
    }

    #[inline]
    pub fn pos(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

// ── WaySet ────────────────────────────────────────────────────────────────────

/// Ways keyed by id, iterated in insertion order.
///
/// Insertion order is the graph builder's edge order, which in turn decides
/// the synthetic ids of merged segments, so it must be deterministic.
#[derive(Clone, Debug, Default)]
pub struct WaySet {
    ways:  Vec<Way>,
    index: FxHashMap<WayId, usize>,
}

impl WaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `way` unless a way with the same id is already present.
    /// Returns `false` for a duplicate; the first occurrence wins.
    pub fn insert(&mut self, way: Way) -> bool {
        if self.index.contains_key(&way.id) {
            return false;
        }
        self.index.insert(way.id.clone(), self.ways.len());
        self.ways.push(way);
        true
    }

    pub fn get(&self, id: &WayId) -> Option<&Way> {
        self.index.get(id).map(|&i| &self.ways[i])
    }

    pub fn contains(&self, id: &WayId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Way> + '_ {
        self.ways.iter()
    }

    pub fn len(&self) -> usize {
        self.ways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }

    /// Keep only ways for which `keep` returns `true`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Way) -> bool) {
        self.ways.retain(|w| keep(w));
        self.index = self
            .ways
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id.clone(), i))
            .collect();
    }
}

impl FromIterator<Way> for WaySet {
    fn from_iter<I: IntoIterator<Item = Way>>(iter: I) -> Self {
        let mut set = WaySet::new();
        for way in iter {
            set.insert(way);
        }
        set
    }
}
