//! Provider trait and failure policy.
//!
//! # Pluggability
//!
//! The loader and serializer call elevation through [`ElevationProvider`],
//! so applications can plug in a DEM service, a database of spot heights,
//! or a constant without touching the pipeline.

use tn_core::{Bounds, GeoPoint};

use crate::ElevationResult;

// ── Provider trait ────────────────────────────────────────────────────────────

/// Source of ground elevation in metres.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the loader shares one provider
/// across Rayon workers that process input files concurrently.
pub trait ElevationProvider: Send + Sync {
    /// Elevation at `pos`, in metres.
    fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64>;

    /// Warm whatever backing data covers `area`.  No-op by default;
    /// tile-backed providers load every tile intersecting the box once.
    fn prefetch(&self, _area: Bounds) {}

    /// Elevation for a batch of nearby points (typically one edge).
    ///
    /// Prefetches the batch's bounding box, then looks points up one by one.
    fn elevations(&self, points: &[GeoPoint]) -> Vec<ElevationResult<f64>> {
        if let Some(area) = Bounds::from_points(points.iter().copied()) {
            self.prefetch(area);
        }
        points.iter().map(|&p| self.elevation(p)).collect()
    }

    /// Names the data behind this provider.  Results derived from one
    /// provider's elevations must not be reused with another's, so caches
    /// key on this.  Defaults to the type name.
    fn source_tag(&self) -> String {
        std::any::type_name::<Self>().to_owned()
    }
}

impl<P: ElevationProvider + ?Sized> ElevationProvider for &P {
    fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64> {
        (**self).elevation(pos)
    }

    fn prefetch(&self, area: Bounds) {
        (**self).prefetch(area)
    }

    fn elevations(&self, points: &[GeoPoint]) -> Vec<ElevationResult<f64>> {
        (**self).elevations(points)
    }

    fn source_tag(&self) -> String {
        (**self).source_tag()
    }
}

impl<P: ElevationProvider + ?Sized> ElevationProvider for Box<P> {
    fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64> {
        (**self).elevation(pos)
    }

    fn prefetch(&self, area: Bounds) {
        (**self).prefetch(area)
    }

    fn elevations(&self, points: &[GeoPoint]) -> Vec<ElevationResult<f64>> {
        (**self).elevations(points)
    }

    fn source_tag(&self) -> String {
        (**self).source_tag()
    }
}

// ── Failure policy ────────────────────────────────────────────────────────────

/// What to do when a lookup fails after the provider has given up.
///
/// | Policy       | Effect                                                  |
/// |--------------|---------------------------------------------------------|
/// | `Strict`     | the enclosing unit (way) fails and is skipped           |
/// | `Permissive` | substitute [`ElevationPolicy::FALLBACK_M`] and continue |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElevationPolicy {
    #[default]
    Strict,
    Permissive,
}

impl ElevationPolicy {
    /// Substitute elevation used by `Permissive`.
    pub const FALLBACK_M: f64 = 0.0;

    /// The value to substitute for a failed lookup, or `None` when the
    /// failure must propagate.
    #[inline]
    pub fn fallback(self) -> Option<f64> {
        match self {
            ElevationPolicy::Strict     => None,
            ElevationPolicy::Permissive => Some(Self::FALLBACK_M),
        }
    }
}

// ── Simple providers ──────────────────────────────────────────────────────────

/// Returns the same elevation everywhere.  Used when no DEM is configured.
#[derive(Copy, Clone, Debug, Default)]
pub struct ConstantElevation(pub f64);

impl ElevationProvider for ConstantElevation {
    fn elevation(&self, _pos: GeoPoint) -> ElevationResult<f64> {
        Ok(self.0)
    }

    fn source_tag(&self) -> String {
        format!("constant:{}", self.0)
    }
}

/// Wraps a closure as a provider.
///
/// ```
/// use tn_core::GeoPoint;
/// use tn_elevation::{ElevationProvider, FnElevation};
///
/// let slope = FnElevation::new(|p: GeoPoint| Ok(p.lat * 1_000.0));
/// assert_eq!(slope.elevation(GeoPoint::new(0.5, 0.0)).unwrap(), 500.0);
/// ```
pub struct FnElevation<F>(F);

impl<F> FnElevation<F>
where
    F: Fn(GeoPoint) -> ElevationResult<f64> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ElevationProvider for FnElevation<F>
where
    F: Fn(GeoPoint) -> ElevationResult<f64> + Send + Sync,
{
    fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64> {
        (self.0)(pos)
    }
}
