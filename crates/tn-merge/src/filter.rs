//! Segment filter.
//!
//! Drops short, flat ways before clustering.  A way survives if it is long
//! **or** climbs; both endpoints of a dropped way leave with it.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use tn_core::WayId;

use crate::way::{Endpoint, WaySet};
use crate::{config_error, MergeResult};

/// Retention thresholds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum cumulative path length.
    pub min_length_m:         f64,
    /// Minimum absolute altitude difference between the two endpoints.
    pub min_elevation_diff_m: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { min_length_m: 500.0, min_elevation_diff_m: 20.0 }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> MergeResult<()> {
        if !(self.min_length_m.is_finite() && self.min_length_m >= 0.0) {
            return Err(config_error(format!(
                "min_length_m must be a non-negative number, got {}",
                self.min_length_m
            )));
        }
        if !(self.min_elevation_diff_m.is_finite() && self.min_elevation_diff_m >= 0.0) {
            return Err(config_error(format!(
                "min_elevation_diff_m must be a non-negative number, got {}",
                self.min_elevation_diff_m
            )));
        }
        Ok(())
    }

    /// Retention predicate.
    #[inline]
    pub fn keeps(&self, length_m: f64, elevation_diff_m: f64) -> bool {
        length_m >= self.min_length_m || elevation_diff_m >= self.min_elevation_diff_m
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept:    usize,
    pub dropped: usize,
}

/// Apply `cfg` to a loaded way set.
///
/// A way with no endpoint records counts as flat (its elevation difference
/// is taken as zero) and survives only on length.
pub fn filter_segments(
    mut ways: WaySet,
    endpoints: Vec<Endpoint>,
    cfg: &FilterConfig,
) -> (WaySet, Vec<Endpoint>, FilterStats) {
    let mut alts: FxHashMap<&WayId, [f64; 2]> = FxHashMap::default();
    for ep in &endpoints {
        let slot = alts.entry(ep.way_id()).or_insert([0.0; 2]);
        slot[usize::from(!ep.is_start())] = ep.alt;
    }

    let mut dropped: FxHashSet<WayId> = FxHashSet::default();
    for way in ways.iter() {
        let diff = alts.get(&way.id).map_or(0.0, |[a, b]| (a - b).abs());
        let length = way.length_m();
        if !cfg.keeps(length, diff) {
            log::debug!("filter: dropping way {} ({length:.1} m, {diff:.1} m climb)", way.id);
            dropped.insert(way.id.clone());
        }
    }
    drop(alts);

    let stats = FilterStats { kept: ways.len() - dropped.len(), dropped: dropped.len() };
    log::info!("filter: kept {} ways, dropped {}", stats.kept, stats.dropped);
    if dropped.is_empty() {
        return (ways, endpoints, stats);
    }

    ways.retain(|w| !dropped.contains(&w.id));
    let endpoints = endpoints
        .into_iter()
        .filter(|ep| !dropped.contains(ep.way_id()))
        .collect();
    (ways, endpoints, stats)
}
