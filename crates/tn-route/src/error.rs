//! Route-finder error type.
//!
//! A disconnected query is not an error: it yields an empty [`Route`].
//!
//! [`Route`]: crate::Route

use thiserror::Error;

use tn_core::{GeometryId, NodeId, PathId};

/// Errors produced by `tn-route`.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("geometry {0} not found in path store")]
    GeometryNotFound(GeometryId),

    #[error("node {0} is not in the routing network")]
    UnknownNode(NodeId),

    #[error("path {path} references unknown geometry {geometry}")]
    DanglingOrder { path: PathId, geometry: GeometryId },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type RouteResult<T> = Result<T, RouteError>;
