//! Elevation error type.

use thiserror::Error;

/// Errors produced by elevation providers.
///
/// `Clone` so that failures can be memoized alongside successes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ElevationError {
    #[error("DEM tile {z}/{x}/{y} unavailable")]
    TileUnavailable { z: u8, x: u32, y: u32 },

    #[error("malformed DEM tile {z}/{x}/{y}: {reason}")]
    MalformedTile { z: u8, x: u32, y: u32, reason: String },

    #[error("no elevation at ({lat:.7}, {lon:.7}): {reason}")]
    Unavailable { lat: f64, lon: f64, reason: String },
}

pub type ElevationResult<T> = Result<T, ElevationError>;
