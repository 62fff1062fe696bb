//! `tn-route` — shortest paths over the persisted trail network.
//!
//! The merge pipeline writes simplified trails; once imported, each trail is
//! a stored path over shared geometry points.  This crate rebuilds a routing
//! graph from those records and answers queries between geometry ids.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`store`]   | `PathStore` trait, `PathSequence`, `MemoryPathStore`        |
//! | [`import`]  | `PathImporter` (merged elements → shared-end sequences)     |
//! | [`network`] | `RoutingNetwork` (CSR + R-tree), `RoutingNetworkBuilder`    |
//! | [`router`]  | `Router` trait, `DijkstraRouter`, `Route`, `RouteFinder`    |
//! | [`sqlite`]  | `SqlitePathStore` (feature = `"sqlite"` only)               |
//! | [`error`]   | `RouteError`, `RouteResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag     | Effect                                                      |
//! |----------|-------------------------------------------------------------|
//! | `sqlite` | Enables `SqlitePathStore` via `rusqlite`.                   |
//! | `serde`  | Derives `Serialize`/`Deserialize` on public records.        |

pub mod error;
pub mod import;
pub mod network;
pub mod router;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use error::{RouteError, RouteResult};
pub use import::{ImportStats, PathImporter, DEFAULT_SNAP_M};
pub use network::{RoutingNetwork, RoutingNetworkBuilder};
pub use router::{DijkstraRouter, Route, RouteFinder, Router};
pub use store::{GeometryNode, MemoryPathStore, PathSequence, PathStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePathStore;
