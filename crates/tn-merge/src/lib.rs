//! `tn-merge` — turns raw trail ways into a simplified junction graph.
//!
//! # Stages
//!
//! | Module         | Stage                                                         |
//! |----------------|---------------------------------------------------------------|
//! | [`loader`]     | Parse way files, resolve endpoint elevations (`WayLoader`)    |
//! | [`cache`]      | Content-keyed per-file load cache (`LoadCache`)               |
//! | [`filter`]     | Drop short, flat ways (`filter_segments`)                     |
//! | [`cluster`]    | Group endpoints into junctions (`cluster_endpoints`)          |
//! | [`graph`]      | Arena multigraph of junctions and ways (`TrailGraph`)         |
//! | [`simplify`]   | Contract degree-2 junctions (`simplify`)                      |
//! | [`serialize`]  | Chunked JSON output (`NetworkWriter`)                         |
//! | [`pipeline`]   | All of the above in order (`MergePipeline`)                   |
//!
//! Supporting modules: [`way`] (records), [`union_find`], [`error`].
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tn_elevation::ConstantElevation;
//! use tn_merge::{MergeConfig, MergePipeline};
//!
//! let config = MergeConfig::from_json_file("merge.json".as_ref())?;
//! let report = MergePipeline::new(config, ConstantElevation(0.0))?.run()?;
//! println!("{} elements written", report.serialize.elements);
//! ```

pub mod cache;
pub mod cluster;
pub mod error;
pub mod filter;
pub mod graph;
pub mod loader;
pub mod pipeline;
pub mod serialize;
pub mod simplify;
pub mod union_find;
pub mod way;


pub(crate) use error::config_error;
pub use error::{MergeError, MergeResult};

pub use cache::LoadCache;
pub use cluster::{cluster_endpoints, ClusterConfig, ClusterMap, ClusterStats};
pub use filter::{filter_segments, FilterConfig, FilterStats};
pub use graph::{BuildStats, Edge, Node, TrailGraph};
pub use loader::{FileLoad, LoadStats, LoadedWays, WayLoader};
pub use pipeline::{MergeConfig, MergePipeline, MergedNetwork, PipelineReport};
pub use serialize::{
    build_elements, serialize_network, ElevatedPoint, NetworkChunk, NetworkElement, NetworkWriter,
    SerializeStats,
};
pub use simplify::{simplify, SimplifyStats};
pub use union_find::UnionFind;
pub use way::{Endpoint, Way, WaySet};
