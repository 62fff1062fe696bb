//! End-to-end merge run.
//!
//! ```text
//! load ─▶ filter? ─▶ cluster ─▶ build graph ─▶ simplify ─▶ serialize
//! ```
//!
//! Every stage logs its own summary; [`PipelineReport`] collects them so a
//! caller can inspect or print the whole run at once.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tn_elevation::{ElevationPolicy, ElevationProvider, MemoizedElevation};

use crate::cache::LoadCache;
use crate::cluster::{cluster_endpoints, ClusterConfig, ClusterMap, ClusterStats};
use crate::filter::{filter_segments, FilterConfig, FilterStats};
use crate::graph::{BuildStats, TrailGraph};
use crate::loader::{LoadStats, LoadedWays, WayLoader};
use crate::serialize::{serialize_network, NetworkWriter, SerializeStats, DEFAULT_CHUNK_SIZE, DEFAULT_PREFIX};
use crate::simplify::{simplify, SimplifyStats};
use crate::{config_error, MergeResult};

// ── Config ────────────────────────────────────────────────────────────────────

/// Full configuration of one merge run.  Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub input_dir:        PathBuf,
    pub output_dir:       PathBuf,
    /// Per-file load cache; disabled when `None`.
    pub cache_dir:        Option<PathBuf>,
    pub cluster:          ClusterConfig,
    /// Segment filter; disabled when `None`.
    pub filter:           Option<FilterConfig>,
    pub chunk_size:       usize,
    pub output_prefix:    String,
    /// Policy for failed endpoint lookups while loading.
    pub elevation_policy: ElevationPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_dir:        PathBuf::from("datas/paths"),
            output_dir:       PathBuf::from("datas/paths_merged"),
            cache_dir:        None,
            cluster:          ClusterConfig::default(),
            filter:           None,
            chunk_size:       DEFAULT_CHUNK_SIZE,
            output_prefix:    DEFAULT_PREFIX.to_owned(),
            elevation_policy: ElevationPolicy::Strict,
        }
    }
}

impl MergeConfig {
    /// Read a JSON config file.  The result is validated.
    pub fn from_json_file(path: &Path) -> MergeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: MergeConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> MergeResult<()> {
        self.cluster.validate()?;
        if let Some(f) = &self.filter {
            f.validate()?;
        }
        if self.chunk_size == 0 {
            return Err(config_error("chunk_size must be positive".into()));
        }
        if self.output_prefix.is_empty() {
            return Err(config_error("output_prefix must not be empty".into()));
        }
        if self.input_dir == self.output_dir {
            return Err(config_error(format!(
                "input and output directories are both {}",
                self.input_dir.display()
            )));
        }
        Ok(())
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Aggregate counts of one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineReport {
    pub load:              LoadStats,
    pub filter:            Option<FilterStats>,
    pub cluster:           ClusterStats,
    pub build:             BuildStats,
    pub simplify:          SimplifyStats,
    pub serialize:         SerializeStats,
    pub elevation_lookups: u64,
    pub elevation_hits:    u64,
}

impl PipelineReport {
    /// Units skipped or failed anywhere in the run.
    pub fn skipped(&self) -> usize {
        self.load.files_failed
            + self.load.skipped_invalid
            + self.load.skipped_elevation
            + self.build.skipped_unmapped
            + self.simplify.skipped_missing
    }

    pub fn log(&self) {
        log::info!(
            "merge finished: {} ways in, {} elements out in {} chunks",
            self.load.ways,
            self.serialize.elements,
            self.serialize.chunks,
        );
        log::info!(
            "  load: {} files ({} failed, {} cached), {} invalid, {} elevation failures, {} duplicates",
            self.load.files,
            self.load.files_failed,
            self.load.cache_hits,
            self.load.skipped_invalid,
            self.load.skipped_elevation,
            self.load.duplicates,
        );
        if let Some(f) = &self.filter {
            log::info!("  filter: {} kept, {} dropped", f.kept, f.dropped);
        }
        log::info!(
            "  cluster: {} endpoints → {} junctions",
            self.cluster.endpoints,
            self.cluster.clusters,
        );
        log::info!(
            "  graph: {} nodes, {} edges, {} self-loops, {} unmapped ways",
            self.build.nodes,
            self.build.edges,
            self.build.self_loops,
            self.build.skipped_unmapped,
        );
        log::info!(
            "  simplify: {} contracted in {} passes, {} loops kept",
            self.simplify.contracted,
            self.simplify.passes,
            self.simplify.skipped_loops,
        );
        log::info!(
            "  elevation: {} lookups, {} memo hits, {} output fallbacks",
            self.elevation_lookups,
            self.elevation_hits,
            self.serialize.elevation_fallbacks,
        );
        if self.skipped() > 0 {
            log::warn!("merge skipped {} units; see warnings above", self.skipped());
        }
    }
}

/// Simplified network before serialization.
#[derive(Clone, Debug, Default)]
pub struct MergedNetwork {
    pub graph:    TrailGraph,
    pub clusters: ClusterMap,
    pub report:   PipelineReport,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Runs every stage against one memoized elevation provider.
pub struct MergePipeline<P> {
    config:    MergeConfig,
    elevation: MemoizedElevation<P>,
}

impl<P: ElevationProvider> MergePipeline<P> {
    pub fn new(config: MergeConfig, provider: P) -> MergeResult<Self> {
        config.validate()?;
        Ok(Self { config, elevation: MemoizedElevation::new(provider) })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn elevation(&self) -> &MemoizedElevation<P> {
        &self.elevation
    }

    /// Load ways from the configured input directory.
    pub fn load(&self) -> MergeResult<LoadedWays> {
        let mut loader = WayLoader::new(&self.elevation, self.config.elevation_policy);
        if let Some(dir) = &self.config.cache_dir {
            loader = loader.with_cache(LoadCache::open(dir)?);
        }
        loader.load_dir(&self.config.input_dir)
    }

    /// Filter, cluster, build and simplify already loaded ways.
    pub fn process(&self, loaded: LoadedWays) -> MergeResult<MergedNetwork> {
        let mut report = PipelineReport { load: loaded.stats, ..PipelineReport::default() };

        let (ways, endpoints) = match &self.config.filter {
            Some(cfg) => {
                let (w, e, stats) = filter_segments(loaded.ways, loaded.endpoints, cfg);
                report.filter = Some(stats);
                (w, e)
            }
            None => (loaded.ways, loaded.endpoints),
        };

        let (mut clusters, cluster_stats) = cluster_endpoints(&endpoints, &self.config.cluster)?;
        report.cluster = cluster_stats;

        let (mut graph, build_stats) = TrailGraph::build(&ways, &clusters);
        report.build = build_stats;

        report.simplify = simplify(&mut graph, &mut clusters);
        Ok(MergedNetwork { graph, clusters, report })
    }

    /// The whole run: load, process, write.
    pub fn run(&self) -> MergeResult<PipelineReport> {
        let loaded = self.load()?;
        let MergedNetwork { graph, mut report, .. } = self.process(loaded)?;

        let writer = NetworkWriter::new(&self.config.output_dir)
            .with_chunk_size(self.config.chunk_size)
            .with_prefix(self.config.output_prefix.clone());
        report.serialize = serialize_network(&graph, &self.elevation, &writer)?;

        report.elevation_lookups = self.elevation.lookups();
        report.elevation_hits = self.elevation.hits();
        report.log();
        Ok(report)
    }
}
