//! `tn-core` — foundational types for the trail network pipeline.
//!
//! Every other `tn-*` crate depends on this one.  It has no `tn-*`
//! dependencies and only `thiserror` plus optional `serde`.
//!
//! # What lives here
//!
//! | Module    | Contents                                                    |
//! |-----------|-------------------------------------------------------------|
//! | [`ids`]   | `WayId`, `EndpointId`, `ClusterId`, `NodeId`, `EdgeId`, `GeometryId`, `PathId` |
//! | [`geo`]   | `GeoPoint`, `TrailPoint`, `Bounds`, haversine helpers       |
//! | [`error`] | `TnError`, `TnResult`                                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{TnError, TnResult};
pub use geo::{path_length_m, Bounds, GeoPoint, TrailPoint, EARTH_RADIUS_M};
pub use ids::{ClusterId, EdgeId, EndpointId, GeometryId, NodeId, PathId, WayEnd, WayId};
