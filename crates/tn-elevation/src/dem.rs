//! Local DEM tiles in the GSI text format.
//!
//! # Layout
//!
//! Tiles live under a root directory as `{z}/{x}/{y}.txt`, addressed with
//! the usual slippy-map (XYZ) scheme.  Each file holds 256 lines of 256
//! comma-separated elevations in metres, row 0 at the tile's north edge.
//! The literal `e` marks a cell with no data and reads as 0 m.
//!
//! # Caching
//!
//! Parsed tiles (and failures) are kept in a `DashMap` for the lifetime of
//! the provider, so each file is read at most once per run.

use std::f64::consts::PI;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use tn_core::{Bounds, GeoPoint};

use crate::{ElevationError, ElevationProvider, ElevationResult};

/// Zoom level of the 10 m-mesh DEM tiles.
pub const DEFAULT_ZOOM: u8 = 14;

/// Tile edge length in pixels.
pub const TILE_PX: usize = 256;

// ── Tile math ─────────────────────────────────────────────────────────────────

/// XYZ address of one tile.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// Tile containing `pos` at zoom `z`.
    pub fn containing(pos: GeoPoint, z: u8) -> Self {
        let (gx, gy) = global_pixel(pos, z);
        let max = (1u64 << z) - 1;
        Self {
            z,
            x: ((gx / TILE_PX as f64).floor().max(0.0) as u64).min(max) as u32,
            y: ((gy / TILE_PX as f64).floor().max(0.0) as u64).min(max) as u32,
        }
    }

    /// Longitude of the tile's west edge.
    pub fn west_lon(self) -> f64 {
        lon_from_x(self.x, self.z)
    }

    /// Latitude of the tile's north edge.
    pub fn north_lat(self) -> f64 {
        lat_from_y(self.y, self.z)
    }

    fn relative_path(self) -> PathBuf {
        PathBuf::from(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.txt", self.y))
    }
}

/// Web-Mercator pixel coordinates of `pos` across the whole world at zoom `z`.
fn global_pixel(pos: GeoPoint, z: u8) -> (f64, f64) {
    let world = (1u64 << z) as f64 * TILE_PX as f64;
    let x = (pos.lon + 180.0) / 360.0 * world;
    let lat = pos.lat.to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

/// Longitude of the west edge of tile column `x`.
pub fn lon_from_x(x: u32, z: u8) -> f64 {
    x as f64 / (1u64 << z) as f64 * 360.0 - 180.0
}

/// Latitude of the north edge of tile row `y`.
pub fn lat_from_y(y: u32, z: u8) -> f64 {
    let n = PI * (1.0 - 2.0 * y as f64 / (1u64 << z) as f64);
    n.sinh().atan().to_degrees()
}

// ── Tile data ─────────────────────────────────────────────────────────────────

struct DemTile {
    /// Row-major, `TILE_PX` columns.  Short files leave trailing rows empty.
    cells: Vec<f32>,
    rows:  usize,
}

impl DemTile {
    fn parse(text: &str, key: TileKey) -> ElevationResult<Self> {
        let mut cells = Vec::with_capacity(TILE_PX * TILE_PX);
        let mut rows = 0usize;
        for (row, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            if row >= TILE_PX {
                break;
            }
            let before = cells.len();
            for (col, raw) in line.split(',').enumerate() {
                if col >= TILE_PX {
                    break;
                }
                let raw = raw.trim();
                let v = if raw == "e" {
                    0.0
                } else {
                    raw.parse::<f32>().map_err(|e| ElevationError::MalformedTile {
                        z: key.z,
                        x: key.x,
                        y: key.y,
                        reason: format!("row {row} col {col}: {e}"),
                    })?
                };
                cells.push(v);
            }
            // Pad ragged rows so indexing stays row * TILE_PX + col.
            cells.resize(before + TILE_PX, 0.0);
            rows += 1;
        }
        Ok(Self { cells, rows })
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        if row >= self.rows || col >= TILE_PX {
            return 0.0;
        }
        self.cells[row * TILE_PX + col] as f64
    }
}

// ── Provider ──────────────────────────────────────────────────────────────────

/// [`ElevationProvider`] backed by a directory of DEM text tiles.
pub struct DemTileDirectory {
    root:  PathBuf,
    zoom:  u8,
    tiles: DashMap<TileKey, ElevationResult<Arc<DemTile>>>,
}

impl DemTileDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_zoom(root, DEFAULT_ZOOM)
    }

    pub fn with_zoom(root: impl Into<PathBuf>, zoom: u8) -> Self {
        Self { root: root.into(), zoom, tiles: DashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of tiles read (or attempted) so far.
    pub fn loaded_tiles(&self) -> usize {
        self.tiles.len()
    }

    fn tile(&self, key: TileKey) -> ElevationResult<Arc<DemTile>> {
        if let Some(t) = self.tiles.get(&key) {
            return t.value().clone();
        }
        self.tiles
            .entry(key)
            .or_insert_with(|| self.read_tile(key))
            .value()
            .clone()
    }

    fn read_tile(&self, key: TileKey) -> ElevationResult<Arc<DemTile>> {
        let path = self.root.join(key.relative_path());
        match std::fs::read_to_string(&path) {
            Ok(text) => DemTile::parse(&text, key).map(Arc::new),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    log::warn!("reading DEM tile {}: {e}", path.display());
                }
                Err(ElevationError::TileUnavailable { z: key.z, x: key.x, y: key.y })
            }
        }
    }
}

impl ElevationProvider for DemTileDirectory {
    fn elevation(&self, pos: GeoPoint) -> ElevationResult<f64> {
        let key = TileKey::containing(pos, self.zoom);
        let tile = self.tile(key)?;

        let (gx, gy) = global_pixel(pos, self.zoom);
        let col = gx.floor() - key.x as f64 * TILE_PX as f64;
        let row = gy.floor() - key.y as f64 * TILE_PX as f64;
        if col < 0.0 || row < 0.0 {
            return Ok(0.0);
        }
        Ok(tile.at(row as usize, col as usize))
    }

    fn prefetch(&self, area: Bounds) {
        let nw = TileKey::containing(GeoPoint::new(area.maxlat, area.minlon), self.zoom);
        let se = TileKey::containing(GeoPoint::new(area.minlat, area.maxlon), self.zoom);
        for x in nw.x..=se.x {
            for y in nw.y..=se.y {
                // Failures are cached and resurface on the actual lookup.
                let _ = self.tile(TileKey { z: self.zoom, x, y });
            }
        }
    }

    fn source_tag(&self) -> String {
        format!("dem:{}:z{}", self.root.display(), self.zoom)
    }
}
