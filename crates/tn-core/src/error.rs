//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `TnError` as one variant
//! where they need it.

use thiserror::Error;

/// The base error type for `tn-core` and a common variant for sub-crates.
#[derive(Debug, Error)]
pub enum TnError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `tn-*` crates.
pub type TnResult<T> = Result<T, TnError>;
