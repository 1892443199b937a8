//! Sync orchestrator: drives candidate rows through embed and persist.
//!
//! Failure scoping, narrowest first: a provider or persist error stays on
//! its row; a connection-level fault aborts its table while other tables
//! still run; only invalid configuration aborts before work starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use vecsync_core::{
    EmbeddingVector, Record, RowOutcome, RowStatus, RunReport, RunSummary, SkipReason, SyncMode,
    TableRun, TableSpec, embedding_text, resolve_tables,
};
use vecsync_provider::EmbeddingProvider;
use vecsync_storage::RecordSource;

use crate::error::SyncError;
use crate::retry::{RetryPolicy, embed_with_retry};

/// Options for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// Table subset; empty selects every registered table.
    pub tables: Vec<String>,
    /// Maximum rows in flight per table; 1 processes strictly in id order.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Assemble text and count candidates without calling the provider or
    /// writing anything.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: SyncMode::FillMissing,
            tables: Vec::new(),
            concurrency: 1,
            retry: RetryPolicy::default(),
            dry_run: false,
        }
    }
}

/// Drives rows of registered tables through text assembly, embedding and
/// persistence.
pub struct SyncRunner {
    source: Arc<dyn RecordSource>,
    provider: Arc<dyn EmbeddingProvider>,
    stop: Arc<AtomicBool>,
}

impl SyncRunner {
    #[must_use]
    pub fn new(source: Arc<dyn RecordSource>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { source, provider, stop: Arc::new(AtomicBool::new(false)) }
    }

    /// Flag polled between row operations. Set it from a signal handler to
    /// let in-flight rows finish while no new rows are admitted.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run one pass over `specs`, filtered by `options.tables`.
    ///
    /// Table order follows the registry. A fatal error inside one table is
    /// recorded on its slice of the report and the next table still runs.
    ///
    /// # Errors
    /// Returns an error only for invalid configuration, before any row is
    /// touched.
    pub async fn run(
        &self,
        specs: &[TableSpec],
        options: &SyncOptions,
    ) -> Result<RunReport, SyncError> {
        let selected = resolve_tables(specs, &options.tables)?;
        let started_at = Utc::now();
        tracing::info!(
            mode = options.mode.as_str(),
            tables = selected.len(),
            concurrency = options.concurrency,
            dry_run = options.dry_run,
            model = self.provider.model_id(),
            "sync run starting"
        );

        let mut tables = Vec::with_capacity(selected.len());
        for spec in &selected {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!(
                    table = %spec.table,
                    "stop requested, leaving remaining tables untouched"
                );
                break;
            }
            tables.push(self.run_table(spec, options).await);
        }

        let report = RunReport { mode: options.mode, started_at, finished_at: Utc::now(), tables };
        tracing::info!(
            tables = report.tables.len(),
            failed_rows = report.total_failed(),
            success = report.is_success(),
            "sync run finished"
        );
        Ok(report)
    }

    async fn run_table(&self, spec: &TableSpec, options: &SyncOptions) -> TableRun {
        let mut summary = RunSummary::new(&spec.table);

        let candidates = match self.source.fetch_candidates(spec, options.mode).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(table = %spec.table, error = %e, "candidate fetch failed, skipping table");
                return TableRun { summary, fatal: Some(e.to_string()) };
            },
        };
        tracing::info!(table = %spec.table, candidates = candidates.len(), "table sync starting");

        let abort = AtomicBool::new(false);
        let mut fatal: Option<String> = None;

        let mut outcomes = stream::iter(candidates)
            .map(|record| {
                let abort = &abort;
                async move {
                    if abort.load(Ordering::Relaxed) || self.stop.load(Ordering::Relaxed) {
                        return None;
                    }
                    Some(self.process_row(spec, record, options).await)
                }
            })
            .buffer_unordered(options.concurrency.max(1));

        // Single consumer: counters mutate here and nowhere else.
        while let Some(item) = outcomes.next().await {
            let Some((outcome, escalation)) = item else { continue };
            summary.record(&outcome.status);
            match &outcome.status {
                RowStatus::Updated => {
                    tracing::debug!(table = %spec.table, id = %outcome.id, "row updated");
                },
                RowStatus::Skipped(reason) => {
                    tracing::debug!(
                        table = %spec.table,
                        id = %outcome.id,
                        reason = reason.as_str(),
                        "row skipped"
                    );
                },
                RowStatus::Failed { error } => {
                    tracing::error!(table = %spec.table, id = %outcome.id, error = %error, "row failed");
                },
            }
            if let Some(message) = escalation {
                if fatal.is_none() {
                    tracing::error!(
                        table = %spec.table,
                        error = %message,
                        "fatal error, draining in-flight rows"
                    );
                    fatal = Some(message);
                }
                abort.store(true, Ordering::Relaxed);
            }
        }

        tracing::info!(
            table = %spec.table,
            processed = summary.processed,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "table sync finished"
        );
        TableRun { summary, fatal }
    }

    /// One row, never touching its siblings. The second element escalates
    /// connection-level failures so the table stops admitting work.
    async fn process_row(
        &self,
        spec: &TableSpec,
        record: Record,
        options: &SyncOptions,
    ) -> (RowOutcome, Option<String>) {
        let id = record.id.clone();
        let text = embedding_text(spec, &record);
        if text.is_empty() {
            return (RowOutcome { id, status: RowStatus::Skipped(SkipReason::EmptyText) }, None);
        }
        if options.dry_run {
            return (RowOutcome { id, status: RowStatus::Skipped(SkipReason::DryRun) }, None);
        }

        let vector = match embed_with_retry(
            self.provider.as_ref(),
            &options.retry,
            &spec.table,
            &id,
            &text,
        )
        .await
        {
            Ok(vector) => vector,
            Err(e) => {
                let escalation = e.is_unreachable().then(|| e.to_string());
                let status = RowStatus::Failed { error: e.to_string() };
                return (RowOutcome { id, status }, escalation);
            },
        };

        let writes: Vec<(String, EmbeddingVector)> = spec
            .embedding_targets
            .iter()
            .map(|target| (target.clone(), vector.clone()))
            .collect();
        match self.source.persist_embedding(spec, &id, &writes).await {
            Ok(()) => (RowOutcome { id, status: RowStatus::Updated }, None),
            Err(e) => {
                let escalation = (!e.is_row_scoped()).then(|| e.to_string());
                let status = RowStatus::Failed { error: e.to_string() };
                (RowOutcome { id, status }, escalation)
            },
        }
    }
}
