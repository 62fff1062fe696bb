//! Geographic coordinate types and great-circle helpers.
//!
//! Coordinates are `f64`: endpoints of independently surveyed ways are
//! compared at metre scale, and serialized output must reproduce input
//! coordinates exactly.

/// Mean Earth radius in metres used by every distance computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude on the mean sphere.
const METRES_PER_DEG: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

// ── GeoPoint ──────────────────────────────────────────────────────────────────

/// A WGS-84 coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Lat/lon box guaranteed to contain every point within `radius_m` of
    /// `self`.  Used to prefilter R-tree queries before the exact haversine
    /// check.
    ///
    /// The longitude half-width widens with latitude and is clamped to the
    /// full circle near the poles.
    pub fn degree_envelope(self, radius_m: f64) -> Bounds {
        let dlat = radius_m / METRES_PER_DEG;
        let cos_lat = self.lat.to_radians().cos().abs();
        let dlon = if cos_lat < 1e-9 {
            180.0
        } else {
            (radius_m / (METRES_PER_DEG * cos_lat)).min(180.0)
        };
        // 1 % slack absorbs the sphere/box mismatch at the corners.
        let (dlat, dlon) = (dlat * 1.01, dlon * 1.01);
        Bounds {
            minlat: self.lat - dlat,
            minlon: self.lon - dlon,
            maxlat: self.lat + dlat,
            maxlon: self.lon + dlon,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat, self.lon)
    }
}

// ── TrailPoint ────────────────────────────────────────────────────────────────

/// One vertex of a way's geometry.  `alt` is filled in lazily: endpoints at
/// load time, everything else when the network is serialized.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrailPoint {
    pub lat: f64,
    pub lon: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub alt: Option<f64>,
}

impl TrailPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, alt: None }
    }

    #[inline]
    pub fn with_alt(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt: Some(alt) }
    }

    #[inline]
    pub fn pos(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Cumulative great-circle length of a polyline, in metres.
pub fn path_length_m(points: &[TrailPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| w[0].pos().distance_m(w[1].pos()))
        .sum()
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Axis-aligned lat/lon bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
}

impl Bounds {
    /// Smallest box containing every point.  `None` for an empty slice.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds {
            minlat: first.lat,
            minlon: first.lon,
            maxlat: first.lat,
            maxlon: first.lon,
        };
        for p in iter {
            b.minlat = b.minlat.min(p.lat);
            b.minlon = b.minlon.min(p.lon);
            b.maxlat = b.maxlat.max(p.lat);
            b.maxlon = b.maxlon.max(p.lon);
        }
        Some(b)
    }

    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.minlat && p.lat <= self.maxlat && p.lon >= self.minlon && p.lon <= self.maxlon
    }

    /// Corners as `([minlat, minlon], [maxlat, maxlon])`, the layout used by
    /// the R-tree envelopes.
    #[inline]
    pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
        ([self.minlat, self.minlon], [self.maxlat, self.maxlon])
    }
}
