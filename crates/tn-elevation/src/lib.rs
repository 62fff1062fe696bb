//! `tn-elevation` — elevation lookup behind a pluggable provider trait.
//!
//! The merge pipeline treats elevation as a pure function
//! `elevation(lat, lon) -> metres`.  How the numbers are produced (DEM tiles,
//! a remote service, a constant) is the provider's concern.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`provider`] | `ElevationProvider` trait, `ElevationPolicy`, simple providers |
//! | [`memo`]     | `MemoizedElevation`, concurrent per-coordinate memo       |
//! | [`dem`]      | `DemTileDirectory`, GSI-style text tiles on local disk    |
//! | [`error`]    | `ElevationError`, `ElevationResult<T>`                    |

pub mod dem;
pub mod error;
pub mod memo;
pub mod provider;

#[cfg(test)]
mod tests;

pub use dem::{DemTileDirectory, TileKey, DEFAULT_ZOOM};
pub use error::{ElevationError, ElevationResult};
pub use memo::MemoizedElevation;
pub use provider::{ConstantElevation, ElevationPolicy, ElevationProvider, FnElevation};
