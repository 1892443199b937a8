//! Boundary trait between the pipeline and the backing store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vecsync_core::{EmbeddingVector, Record, SyncMode, TableSpec};

use crate::error::StorageError;

/// Embedding coverage counters for one table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TableStats {
    pub total: i64,
    pub missing: i64,
}

/// Read/write access to the rows whose embedding columns this tool maintains.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Rows of `spec`'s table that need a (re)computed embedding under
    /// `mode`, ordered by id.
    async fn fetch_candidates(
        &self,
        spec: &TableSpec,
        mode: SyncMode,
    ) -> Result<Vec<Record>, StorageError>;

    /// Write `vectors` to their target columns on the row with `id`.
    ///
    /// Updates exactly one row. The write is atomic: the row keeps its
    /// previous value unless every target column is set.
    async fn persist_embedding(
        &self,
        spec: &TableSpec,
        id: &str,
        vectors: &[(String, EmbeddingVector)],
    ) -> Result<(), StorageError>;

    /// Total rows and rows still missing an embedding in `spec`'s table.
    async fn embedding_stats(&self, spec: &TableSpec) -> Result<TableStats, StorageError>;
}
