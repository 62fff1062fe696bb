//! Per-coordinate memoization.
//!
//! Ways share endpoints, so the same coordinate is looked up many times
//! during a load.  [`MemoizedElevation`] guarantees at most one underlying
//! lookup per distinct `(lat, lon)` pair, failures included.
//!
//! # Concurrency
//!
//! Entries live in a sharded `DashMap`.  Reads of an existing entry take a
//! shard read lock only.  A miss holds the shard's write lock while the inner
//! provider runs, so two workers racing on the same coordinate never both
//! reach the provider.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use tn_core::{Bounds, GeoPoint};

use crate::{ElevationProvider, ElevationResult};

/// Exact bit pattern of a coordinate.  Two coordinates share an entry only
/// if they are bit-identical.
type CoordKey = (u64, u64);

#[inline]
fn key(p: GeoPoint) -> CoordKey {
    (p.lat.to_bits(), p.lon.to_bits())
}

/// Memoizing wrapper around any [`ElevationProvider`].
pub struct MemoizedElevation<P> {
    inner:    P,
    entries:  DashMap<CoordKey, ElevationResult<f64>>,
    requests: AtomicU64,
    lookups:  AtomicU64,
}

impl<P: ElevationProvider> MemoizedElevation<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries:  DashMap::new(),
            requests: AtomicU64::new(0),
            lookups:  AtomicU64::new(0),
        }
    }

    /// Number of calls made to the wrapped provider.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of requests answered from the memo.
    pub fn hits(&self) -> u64 {
        self.requests.load(Ordering::Relaxed).saturating_sub(self.lookups())
    }

    /// Number of distinct coordinates seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: ElevationProvider> ElevationProvider for MemoizedElevation<P> {
    fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let k = key(pos);

        if let Some(hit) = self.entries.get(&k) {
            return hit.value().clone();
        }

        self.entries
            .entry(k)
            .or_insert_with(|| {
                self.lookups.fetch_add(1, Ordering::Relaxed);
                self.inner.elevation(pos)
            })
            .value()
            .clone()
    }

    fn prefetch(&self, area: Bounds) {
        self.inner.prefetch(area);
    }

    fn source_tag(&self) -> String {
        self.inner.source_tag()
    }
}
