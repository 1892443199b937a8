//! Typed error enum for the record source layer.
//!
//! Callers match on specific failure modes instead of downcasting opaque
//! boxes; the pipeline uses [`StorageError::is_row_scoped`] to decide whether
//! a failure stays on its row or aborts the whole table run.

use thiserror::Error;

/// Record-source error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Persist target row vanished between fetch and write.
    #[error("not found: {table} row {id}")]
    NotFound { table: String, id: String },

    /// The id matched more than one row; the write was rolled back.
    #[error("non-unique id in {table}: {id} matched {matched} rows")]
    NonUniqueId { table: String, id: String, matched: u64 },

    /// SQL / connection / timeout failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Whether the failure is scoped to a single row (the run continues)
    /// rather than a connection-level fault (the table run aborts).
    #[must_use]
    pub fn is_row_scoped(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::NonUniqueId { .. } => true,
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Database(_)
                    | sqlx::Error::RowNotFound
                    | sqlx::Error::Decode(_)
                    | sqlx::Error::ColumnDecode { .. }
                    | sqlx::Error::ColumnNotFound(_)
            ),
        }
    }
}
