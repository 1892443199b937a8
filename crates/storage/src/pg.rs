//! PostgreSQL record source using sqlx.
//!
//! Table and column names come from the validated spec registry, never from
//! user input; they are interpolated quoted while all values are bound.
//! Vectors bind in pgvector text form `[v1,v2,...]` cast via `::vector`.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use vecsync_core::{EmbeddingVector, Record, SyncMode, TableSpec, env_parse_with_default};

use crate::error::StorageError;
use crate::source::{RecordSource, TableStats};

const POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;
const POOL_IDLE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Clone, Debug)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    /// Connect with a pool sized by `VECSYNC_DB_POOL_SIZE` (default 8).
    ///
    /// # Errors
    /// Returns an error when the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let max_connections: u32 =
            env_parse_with_default("VECSYNC_DB_POOL_SIZE", DEFAULT_POOL_SIZE);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        tracing::info!(max_connections, "record source connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn fetch_candidates(
        &self,
        spec: &TableSpec,
        mode: SyncMode,
    ) -> Result<Vec<Record>, StorageError> {
        let sql = candidate_query(spec, mode);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_record(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(table = %spec.table, error = %e, "skipping undecodable row");
                },
            }
        }
        Ok(records)
    }

    async fn persist_embedding(
        &self,
        spec: &TableSpec,
        id: &str,
        vectors: &[(String, EmbeddingVector)],
    ) -> Result<(), StorageError> {
        let targets: Vec<&str> = vectors.iter().map(|(column, _)| column.as_str()).collect();
        let sql = update_query(spec, &targets);
        let mut query = sqlx::query(&sql);
        for (_, vector) in vectors {
            query = query.bind(vector_literal(vector));
        }
        let query = query.bind(id);

        let mut tx = self.pool.begin().await?;
        let done = query.execute(&mut *tx).await?;
        match done.rows_affected() {
            0 => Err(StorageError::NotFound { table: spec.table.clone(), id: id.to_owned() }),
            1 => {
                tx.commit().await?;
                Ok(())
            },
            matched => {
                tx.rollback().await?;
                Err(StorageError::NonUniqueId {
                    table: spec.table.clone(),
                    id: id.to_owned(),
                    matched,
                })
            },
        }
    }

    async fn embedding_stats(&self, spec: &TableSpec) -> Result<TableStats, StorageError> {
        let sql = stats_query(spec);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(TableStats { total: row.try_get("total")?, missing: row.try_get("missing")? })
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<Record, StorageError> {
    let id: String = row.try_get("id")?;
    let fields: serde_json::Value = row.try_get("fields")?;
    // jsonb_build_object always yields an object
    let fields = fields.as_object().cloned().unwrap_or_default();
    Ok(Record::new(id, fields))
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Candidate selection for one table. The id casts to text so uuid, integer
/// and text keys all come back the same way; text fields land in one jsonb
/// object so nulls and array columns decode uniformly.
fn candidate_query(spec: &TableSpec, mode: SyncMode) -> String {
    let pairs: Vec<String> = spec
        .text_fields
        .iter()
        .map(|f| format!("'{}', t.{}", f.replace('\'', "''"), quote_ident(f)))
        .collect();
    let mut sql = format!(
        "SELECT t.{id}::text AS id, jsonb_build_object({pairs}) AS fields FROM {table} t",
        id = quote_ident(&spec.id_column),
        pairs = pairs.join(", "),
        table = quote_ident(&spec.table),
    );
    if mode == SyncMode::FillMissing {
        let null_checks: Vec<String> = spec
            .embedding_targets
            .iter()
            .map(|c| format!("t.{} IS NULL", quote_ident(c)))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&null_checks.join(" OR "));
    }
    sql.push_str(" ORDER BY t.");
    sql.push_str(&quote_ident(&spec.id_column));
    sql
}

fn update_query(spec: &TableSpec, targets: &[&str]) -> String {
    let sets: Vec<String> = targets
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}::vector", quote_ident(column), i + 1))
        .collect();
    format!(
        "UPDATE {table} SET {sets} WHERE {id}::text = ${n}",
        table = quote_ident(&spec.table),
        sets = sets.join(", "),
        id = quote_ident(&spec.id_column),
        n = targets.len() + 1,
    )
}

fn stats_query(spec: &TableSpec) -> String {
    let null_checks: Vec<String> = spec
        .embedding_targets
        .iter()
        .map(|c| format!("t.{} IS NULL", quote_ident(c)))
        .collect();
    format!(
        "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE {checks}) AS missing FROM {table} t",
        checks = null_checks.join(" OR "),
        table = quote_ident(&spec.table),
    )
}

fn vector_literal(embedding: &[f32]) -> String {
    format!("[{}]", embedding.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(","))
}
