//! Typed error enum for the pipeline crate.

use thiserror::Error;
use vecsync_core::SpecError;

/// Errors that abort a run before any row is processed.
///
/// Everything that happens after admission (provider failures, lost
/// connections, vanished rows) is scoped to a row or a table and lands in
/// the run report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid run configuration (unknown table, bad spec).
    #[error(transparent)]
    Spec(#[from] SpecError),
}
