//! `trail-merge` — batch front end for the trail network pipeline.
//!
//! ```text
//! trail-merge merge  --input datas/paths --output datas/paths_merged [--dem tiles/]
//! trail-merge import --input datas/paths_merged --db paths.db
//! trail-merge route  --db paths.db --from 12 --to 480
//! ```
//!
//! Logging goes through `env_logger` at `info` unless `RUST_LOG` says
//! otherwise.

mod chunks;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tn_core::GeometryId;
use tn_elevation::{ConstantElevation, DemTileDirectory, ElevationPolicy, ElevationProvider};
use tn_merge::{MergeConfig, MergePipeline};
use tn_route::{RouteError, RouteFinder, SqlitePathStore, DEFAULT_SNAP_M};

#[derive(Parser)]
#[command(name = "trail-merge")]
#[command(about = "Merge collected trail ways into a simplified network and route over it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, cluster, simplify and write the merged network
    Merge(MergeArgs),

    /// Store merged chunks as paths in a SQLite database
    Import {
        /// Directory holding the merged chunks
        #[arg(long)]
        input: PathBuf,

        /// Database file, created if missing and overwritten otherwise
        #[arg(long)]
        db: PathBuf,

        /// Chunk file prefix
        #[arg(long, default_value = tn_merge::serialize::DEFAULT_PREFIX)]
        prefix: String,

        /// Path ends closer than this share one geometry
        #[arg(long, default_value_t = DEFAULT_SNAP_M)]
        snap_m: f64,
    },

    /// Shortest route between two stored geometry ids
    Route {
        #[arg(long)]
        db: PathBuf,

        #[arg(long)]
        from: u64,

        #[arg(long)]
        to: u64,
    },
}

#[derive(clap::Args)]
struct MergeArgs {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    /// Per-file load cache directory
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Junction radius in metres
    #[arg(long)]
    horizontal_m: Option<f64>,

    /// Altitude difference that keeps endpoints apart
    #[arg(long)]
    vertical_m: Option<f64>,

    /// Drop short, flat ways before clustering
    #[arg(long)]
    filter: bool,

    #[arg(long)]
    min_length_m: Option<f64>,

    #[arg(long)]
    min_elevation_diff_m: Option<f64>,

    /// Elements per output file
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Directory of DEM text tiles; without it every altitude is 0
    #[arg(long)]
    dem: Option<PathBuf>,

    /// Default failed endpoint elevations to 0 instead of skipping the way
    #[arg(long)]
    permissive: bool,
}

impl MergeArgs {
    fn into_config(self) -> Result<MergeConfig> {
        let mut cfg = match &self.config {
            Some(path) => MergeConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => MergeConfig::default(),
        };
        if let Some(v) = self.input {
            cfg.input_dir = v;
        }
        if let Some(v) = self.output {
            cfg.output_dir = v;
        }
        if let Some(v) = self.cache {
            cfg.cache_dir = Some(v);
        }
        if let Some(v) = self.horizontal_m {
            cfg.cluster.horizontal_m = v;
        }
        if let Some(v) = self.vertical_m {
            cfg.cluster.vertical_m = v;
        }
        if let Some(v) = self.chunk_size {
            cfg.chunk_size = v;
        }
        if self.permissive {
            cfg.elevation_policy = ElevationPolicy::Permissive;
        }

        let filter_flags = self.min_length_m.is_some() || self.min_elevation_diff_m.is_some();
        if self.filter || filter_flags {
            let mut f = cfg.filter.take().unwrap_or_default();
            if let Some(v) = self.min_length_m {
                f.min_length_m = v;
            }
            if let Some(v) = self.min_elevation_diff_m {
                f.min_elevation_diff_m = v;
            }
            cfg.filter = Some(f);
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Merge(args) => run_merge(args),
        Commands::Import { input, db, prefix, snap_m } => run_import(input, db, &prefix, snap_m),
        Commands::Route { db, from, to } => run_route(db, GeometryId(from), GeometryId(to)),
    }
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let provider: Box<dyn ElevationProvider> = match &args.dem {
        Some(dir) => {
            log::info!("elevation from DEM tiles in {}", dir.display());
            Box::new(DemTileDirectory::new(dir))
        }
        None => {
            log::info!("no DEM directory given, all altitudes are 0");
            Box::new(ConstantElevation(0.0))
        }
    };
    let config = args.into_config()?;
    if let Some(f) = &config.filter {
        log::info!(
            "segment filter on: keep ways of {} m or {} m rise",
            f.min_length_m,
            f.min_elevation_diff_m,
        );
    }

    let t0 = Instant::now();
    let report = MergePipeline::new(config, provider)?.run()?;
    println!(
        "{} ways → {} elements in {} chunks ({} skipped) in {:.2}s",
        report.load.ways,
        report.serialize.elements,
        report.serialize.chunks,
        report.skipped(),
        t0.elapsed().as_secs_f64(),
    );
    Ok(())
}

fn run_import(input: PathBuf, db: PathBuf, prefix: &str, snap_m: f64) -> Result<()> {
    let elements = chunks::read_chunks(&input, prefix)?;
    if elements.is_empty() {
        log::warn!("no {prefix}_*.json chunks in {}", input.display());
    }
    let (sequences, stats) = chunks::import_elements(&elements, snap_m);

    let store = SqlitePathStore::open(&db).with_context(|| format!("opening {}", db.display()))?;
    store.clear()?;
    store.insert_sequences(&sequences)?;
    println!(
        "{} paths, {} geometries ({} shared ends) written to {}",
        stats.paths,
        stats.geometries,
        stats.snapped,
        db.display(),
    );
    Ok(())
}

fn run_route(db: PathBuf, from: GeometryId, to: GeometryId) -> Result<()> {
    let store = SqlitePathStore::open(&db).with_context(|| format!("opening {}", db.display()))?;
    let finder = RouteFinder::new(store)?;

    match finder.find(from, to) {
        Ok(route) if route.is_empty() => println!("no route from {from} to {to}"),
        Ok(route) => {
            let ids: Vec<String> = route.paths.iter().map(|p| p.0.to_string()).collect();
            println!("{} m via paths [{}]", route.distance_m, ids.join(", "));
        }
        Err(RouteError::GeometryNotFound(g)) => println!("not found: {g}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
