//! Way loader.
//!
//! # Input format
//!
//! Each `*.json` file in the input directory is either an Overpass-style
//! document or a bare array of elements:
//!
//! ```json
//! {"elements": [
//!   {"type": "way", "id": 123, "nodes": [1, 2],
//!    "geometry": [{"lat": 35.1, "lon": 138.2}, {"lat": 35.2, "lon": 138.3}],
//!    "tags": {"highway": "path"}}
//! ]}
//! ```
//!
//! Elements with a `type` other than `"way"` are ignored; elements without a
//! `type` are treated as ways.  A way needs an `id` (integer or string) and at
//! least two geometry points; anything else is logged and skipped.
//!
//! # Parallelism
//!
//! Files are parsed on the Rayon pool.  Their results are merged afterwards
//! by a single owner, in file-name order, so the outcome is independent of
//! scheduling.  Elevation lookups go through the shared provider, which is
//! expected to memoize (see [`tn_elevation::MemoizedElevation`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tn_core::{Bounds, TrailPoint, WayEnd, WayId};
use tn_elevation::{ElevationPolicy, ElevationProvider};

use crate::cache::LoadCache;
use crate::way::{Endpoint, Way, WaySet};
use crate::{MergeError, MergeResult};

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Counters for one load (a single file or a whole directory).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub files:               usize,
    pub files_failed:        usize,
    pub cache_hits:          usize,
    pub ways:                usize,
    pub skipped_invalid:     usize,
    pub skipped_elevation:   usize,
    pub elevation_fallbacks: usize,
    pub duplicates:          usize,
    pub non_way_elements:    usize,
}

impl LoadStats {
    fn absorb(&mut self, other: &LoadStats) {
        self.files               += other.files;
        self.files_failed        += other.files_failed;
        self.cache_hits          += other.cache_hits;
        self.skipped_invalid     += other.skipped_invalid;
        self.skipped_elevation   += other.skipped_elevation;
        self.elevation_fallbacks += other.elevation_fallbacks;
        self.non_way_elements    += other.non_way_elements;
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Ways and endpoints extracted from one source file.
///
/// `endpoints[2 * i]` and `endpoints[2 * i + 1]` are the start and end of
/// `ways[i]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileLoad {
    pub ways:      Vec<Way>,
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub stats:     LoadStats,
}

/// Everything loaded from an input directory.
#[derive(Clone, Debug, Default)]
pub struct LoadedWays {
    pub ways:      WaySet,
    pub endpoints: Vec<Endpoint>,
    pub stats:     LoadStats,
}

impl LoadedWays {
    /// Merge one file's result.  Ways already present are counted as
    /// duplicates and dropped together with their endpoints.
    pub fn absorb(&mut self, load: FileLoad) {
        self.stats.absorb(&load.stats);
        let mut ends = load.endpoints.into_iter();
        for way in load.ways {
            let (Some(start), Some(end)) = (ends.next(), ends.next()) else {
                log::warn!("way {} has no endpoint records, skipping", way.id);
                self.stats.skipped_invalid += 1;
                continue;
            };
            if self.ways.insert(way) {
                self.endpoints.push(start);
                self.endpoints.push(end);
                self.stats.ways += 1;
            } else {
                self.stats.duplicates += 1;
            }
        }
    }
}

// ── Raw JSON shapes ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceDocument {
    Elements { elements: Vec<Value> },
    Bare(Vec<Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for WayId {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Int(n)  => WayId::from(n),
            RawId::Text(s) => WayId(s),
        }
    }
}

#[derive(Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
    #[serde(default)]
    alt: Option<f64>,
}

#[derive(Deserialize)]
struct RawWay {
    id:       RawId,
    #[serde(default)]
    geometry: Option<Vec<RawPoint>>,
    #[serde(default)]
    bounds:   Option<Bounds>,
    #[serde(default)]
    nodes:    Vec<i64>,
    #[serde(default)]
    tags:     BTreeMap<String, Value>,
}

fn tag_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Reads way records and resolves their endpoint elevations.
pub struct WayLoader<'a, P: ?Sized> {
    provider: &'a P,
    policy:   ElevationPolicy,
    cache:    Option<LoadCache>,
}

impl<'a, P: ElevationProvider + ?Sized> WayLoader<'a, P> {
    pub fn new(provider: &'a P, policy: ElevationPolicy) -> Self {
        Self { provider, policy, cache: None }
    }

    /// Persist per-file results in `cache` and reuse them on later runs.
    pub fn with_cache(mut self, cache: LoadCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load every `*.json` file in `dir`.
    ///
    /// A file that cannot be read or parsed is logged and counted in
    /// `files_failed`; it never aborts the load.
    pub fn load_dir(&self, dir: &Path) -> MergeResult<LoadedWays> {
        let files = list_json_files(dir)?;
        if files.is_empty() {
            log::warn!("no JSON files found in {}", dir.display());
        }

        let results: Vec<(PathBuf, MergeResult<FileLoad>)> = files
            .into_par_iter()
            .map(|path| {
                let r = self.load_file(&path);
                (path, r)
            })
            .collect();

        let mut loaded = LoadedWays::default();
        for (path, result) in results {
            match result {
                Ok(load) => loaded.absorb(load),
                Err(e) => {
                    log::error!("failed to load {}: {e}", path.display());
                    loaded.stats.files += 1;
                    loaded.stats.files_failed += 1;
                }
            }
        }

        log::info!(
            "loaded {} ways ({} endpoints) from {} files: {} invalid, {} elevation failures, {} duplicates, {} cache hits",
            loaded.stats.ways,
            loaded.endpoints.len(),
            loaded.stats.files,
            loaded.stats.skipped_invalid,
            loaded.stats.skipped_elevation,
            loaded.stats.duplicates,
            loaded.stats.cache_hits,
        );
        Ok(loaded)
    }

    /// Load one file, going through the cache when one is configured.
    pub fn load_file(&self, path: &Path) -> MergeResult<FileLoad> {
        let bytes = std::fs::read(path)?;
        let label = path.display().to_string();

        let key = self.cache.as_ref().map(|_| LoadCache::key_for(&bytes, &self.cache_tag()));
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            if let Some(mut hit) = cache.get(path, key) {
                log::debug!("{label}: served {} ways from cache", hit.ways.len());
                hit.stats.cache_hits = 1;
                return Ok(hit);
            }
        }

        let load = self.parse(&bytes, &label)?;

        // Any failed lookup, skipped or defaulted, keeps the file out of the
        // cache: the provider may succeed next time.
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            if load.stats.skipped_elevation == 0 && load.stats.elevation_fallbacks == 0 {
                cache.put(path, key, &load);
            }
        }
        Ok(load)
    }

    fn cache_tag(&self) -> String {
        format!("{}|{:?}", self.provider.source_tag(), self.policy)
    }

    /// Parse one document's bytes.  `label` names the source in log lines.
    pub fn parse(&self, bytes: &[u8], label: &str) -> MergeResult<FileLoad> {
        let elements = match serde_json::from_slice::<SourceDocument>(bytes) {
            Ok(SourceDocument::Elements { elements }) => elements,
            Ok(SourceDocument::Bare(elements)) => elements,
            Err(e) if e.is_data() => return Err(MergeError::Layout(label.to_owned())),
            Err(e) => return Err(e.into()),
        };

        let mut load = FileLoad {
            stats: LoadStats { files: 1, ..LoadStats::default() },
            ..FileLoad::default()
        };
        for element in elements {
            self.extract(element, label, &mut load);
        }
        Ok(load)
    }

    fn extract(&self, element: Value, label: &str, load: &mut FileLoad) {
        match element.get("type").and_then(Value::as_str) {
            Some("way") | None => {}
            Some(_) => {
                load.stats.non_way_elements += 1;
                return;
            }
        }

        let raw: RawWay = match serde_json::from_value(element) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("{label}: skipping malformed way: {e}");
                load.stats.skipped_invalid += 1;
                return;
            }
        };
        let id = WayId::from(raw.id);

        let geometry: Vec<TrailPoint> = raw
            .geometry
            .unwrap_or_default()
            .into_iter()
            .map(|p| TrailPoint { lat: p.lat, lon: p.lon, alt: p.alt })
            .collect();
        if geometry.len() < 2 {
            log::warn!("{label}: skipping way {id}: invalid geometry ({} points)", geometry.len());
            load.stats.skipped_invalid += 1;
            return;
        }

        let mut way = Way {
            id,
            geometry,
            nodes:  raw.nodes,
            tags:   raw.tags.into_iter().map(|(k, v)| (k, tag_string(v))).collect(),
            bounds: raw.bounds,
        };

        let last = way.geometry.len() - 1;
        let Some(start_alt) = self.endpoint_alt(&way, 0, label, &mut load.stats) else {
            return;
        };
        let Some(end_alt) = self.endpoint_alt(&way, last, label, &mut load.stats) else {
            return;
        };
        way.geometry[0].alt = Some(start_alt);
        way.geometry[last].alt = Some(end_alt);

        load.endpoints.push(Endpoint::new(&way.id, WayEnd::Start, &way.geometry[0], start_alt));
        load.endpoints.push(Endpoint::new(&way.id, WayEnd::End, &way.geometry[last], end_alt));
        load.ways.push(way);
    }

    /// Elevation of `way.geometry[i]`: the input's own altitude if present,
    /// otherwise the provider's, with the failure policy applied.  `None`
    /// means the way must be skipped.
    fn endpoint_alt(&self, way: &Way, i: usize, label: &str, stats: &mut LoadStats) -> Option<f64> {
        let point = &way.geometry[i];
        if let Some(alt) = point.alt {
            return Some(alt);
        }
        match self.provider.elevation(point.pos()) {
            Ok(alt) => Some(alt),
            Err(e) => match self.policy.fallback() {
                Some(alt) => {
                    stats.elevation_fallbacks += 1;
                    Some(alt)
                }
                None => {
                    if stats.skipped_elevation == 0 || log::log_enabled!(log::Level::Debug) {
                        log::warn!("{label}: skipping way {}: {e}", way.id);
                    }
                    stats.skipped_elevation += 1;
                    None
                }
            },
        }
    }
}

/// `*.json` files directly inside `dir`, sorted by name.
pub fn list_json_files(dir: &Path) -> MergeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
