//! Merge-pipeline error type.
//!
//! Only failures that stop a whole stage surface here.  Per-unit defects
//! (a malformed way, a failed elevation lookup, an unmapped endpoint) are
//! logged, counted in the stage's stats, and skipped.

use thiserror::Error;

use tn_core::TnError;

/// Errors produced by `tn-merge`.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognised document layout in {0}: expected an `elements` array or a bare array")]
    Layout(String),

    /// Configuration errors surface as `TnError::Config`.
    #[error(transparent)]
    Core(#[from] TnError),
}

pub type MergeResult<T> = Result<T, MergeError>;

pub(crate) fn config_error(msg: String) -> MergeError {
    TnError::Config(msg).into()
}
