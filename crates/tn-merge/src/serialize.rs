//! Network serializer.
//!
//! # Output format
//!
//! The simplified graph is written as numbered JSON chunks,
//! `{prefix}_1.json`, `{prefix}_2.json`, …, each holding at most
//! `chunk_size` elements:
//!
//! ```json
//! {"elements": [
//!   {"id": 1,
//!    "bounds": {"minlat": 35.1, "minlon": 138.2, "maxlat": 35.2, "maxlon": 138.3},
//!    "geometry": [{"lat": 35.1, "lon": 138.2, "alt": 812.0}, ...]}
//! ]}
//! ```
//!
//! Element ids are dense integers starting at 1, assigned in ascending edge
//! order; they are unrelated to the `merged_*` way ids.  Every point carries
//! an altitude: missing ones are looked up per edge in one batch call, and a
//! failed lookup becomes `0.0`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tn_core::{Bounds, GeoPoint};
use tn_elevation::{ElevationPolicy, ElevationProvider};

use crate::graph::{Edge, TrailGraph};
use crate::{config_error, MergeResult};

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_PREFIX: &str = "merged_trail_network";

// ── Output records ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevatedPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkElement {
    pub id:       u64,
    pub bounds:   Bounds,
    pub geometry: Vec<ElevatedPoint>,
}

/// Contents of one output file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkChunk {
    pub elements: Vec<NetworkElement>,
}

#[derive(Serialize)]
struct ChunkRef<'a> {
    elements: &'a [NetworkElement],
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializeStats {
    pub elements:            usize,
    pub chunks:              usize,
    pub elevation_fallbacks: usize,
}

// ── Element construction ──────────────────────────────────────────────────────

/// Turn every live edge of `graph` into an output element.
///
/// Returns the elements and the number of altitudes that fell back to 0.
pub fn build_elements<P>(graph: &TrailGraph, provider: &P) -> (Vec<NetworkElement>, usize)
where
    P: ElevationProvider + ?Sized,
{
    let edges: Vec<&Edge> = graph
        .edges()
        .filter_map(|(id, e)| {
            if e.geometry.is_empty() {
                log::warn!("serialize: edge {id} ({}) has no geometry, skipping", e.way);
                None
            } else {
                Some(e)
            }
        })
        .collect();

    let built: Vec<(NetworkElement, usize)> = edges
        .par_iter()
        .enumerate()
        .filter_map(|(i, edge)| element(i as u64 + 1, edge, provider))
        .collect();

    let fallbacks = built.iter().map(|(_, f)| f).sum();
    (built.into_iter().map(|(e, _)| e).collect(), fallbacks)
}

fn element<P>(id: u64, edge: &Edge, provider: &P) -> Option<(NetworkElement, usize)>
where
    P: ElevationProvider + ?Sized,
{
    let bounds = Bounds::from_points(edge.geometry.iter().map(|p| p.pos()))?;

    let missing: Vec<GeoPoint> = edge
        .geometry
        .iter()
        .filter(|p| p.alt.is_none())
        .map(|p| p.pos())
        .collect();
    let mut resolved = provider.elevations(&missing).into_iter();

    let fallback = ElevationPolicy::FALLBACK_M;
    let mut fallbacks = 0;
    let geometry = edge
        .geometry
        .iter()
        .map(|p| {
            let alt = match p.alt {
                Some(a) => a,
                None => match resolved.next() {
                    Some(Ok(a)) => a,
                    Some(Err(e)) => {
                        log::debug!("serialize: {} at {}: {e}", edge.way, p.pos());
                        fallbacks += 1;
                        fallback
                    }
                    None => {
                        fallbacks += 1;
                        fallback
                    }
                },
            };
            ElevatedPoint { lat: p.lat, lon: p.lon, alt }
        })
        .collect();

    Some((NetworkElement { id, bounds, geometry }, fallbacks))
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Writes elements as numbered chunk files into one directory.
#[derive(Clone, Debug)]
pub struct NetworkWriter {
    dir:        PathBuf,
    chunk_size: usize,
    prefix:     String,
}

impl NetworkWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:        dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            prefix:     DEFAULT_PREFIX.to_owned(),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of chunk `n` (1-based).
    pub fn chunk_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}_{n}.json", self.prefix))
    }

    /// Delete every `{prefix}_*.json` left by an earlier run.  Other files in
    /// the directory are not touched.  Returns the number removed.
    pub fn clear_previous(&self) -> MergeResult<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let head = format!("{}_", self.prefix);
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_chunk = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&head) && n.ends_with(".json"));
            if is_chunk {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("serialize: removed {removed} stale chunks from {}", self.dir.display());
        }
        Ok(removed)
    }

    /// Replace any previous output with `elements`.  Returns the number of
    /// chunk files written.
    pub fn write(&self, elements: &[NetworkElement]) -> MergeResult<usize> {
        if self.chunk_size == 0 {
            return Err(config_error("chunk_size must be positive".into()));
        }
        std::fs::create_dir_all(&self.dir)?;
        self.clear_previous()?;

        let mut chunks = 0;
        for (i, chunk) in elements.chunks(self.chunk_size).enumerate() {
            let path = self.chunk_path(i + 1);
            let mut out = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut out, &ChunkRef { elements: chunk })?;
            out.flush()?;
            chunks += 1;
        }
        log::info!(
            "serialize: wrote {} elements in {} chunks to {}",
            elements.len(),
            chunks,
            self.dir.display(),
        );
        Ok(chunks)
    }
}

/// Build the elements of `graph` and write them with `writer`.
pub fn serialize_network<P>(
    graph: &TrailGraph,
    provider: &P,
    writer: &NetworkWriter,
) -> MergeResult<SerializeStats>
where
    P: ElevationProvider + ?Sized,
{
    let (elements, elevation_fallbacks) = build_elements(graph, provider);
    if elevation_fallbacks > 0 {
        log::warn!("serialize: {elevation_fallbacks} altitudes defaulted to 0");
    }
    let chunks = writer.write(&elements)?;
    Ok(SerializeStats { elements: elements.len(), chunks, elevation_fallbacks })
}
