use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SyncMode;

/// Why a row was left untouched without an embedding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Every text field rendered empty.
    EmptyText,
    /// Dry run: candidate selection and text assembly only.
    DryRun,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty text",
            Self::DryRun => "dry run",
        }
    }
}

/// Terminal state of one processed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    /// Embedding computed and persisted.
    Updated,
    /// Row intentionally left as it was.
    Skipped(SkipReason),
    /// Row kept its previous value after an unrecoverable error.
    Failed { error: String },
}

/// Outcome of processing one candidate row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub id: String,
    pub status: RowStatus,
}

/// Per-table counters; `processed` always equals the sum of the other three.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub table: String,
    pub processed: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl RunSummary {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), processed: 0, updated: 0, skipped: 0, failed: 0 }
    }

    /// Fold one row outcome into the counters.
    pub fn record(&mut self, status: &RowStatus) {
        self.processed += 1;
        match status {
            RowStatus::Updated => self.updated += 1,
            RowStatus::Skipped(_) => self.skipped += 1,
            RowStatus::Failed { .. } => self.failed += 1,
        }
    }
}

/// One table's slice of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRun {
    pub summary: RunSummary,
    /// Set when the table aborted before draining every candidate
    /// (connection loss, provider endpoint down).
    pub fatal: Option<String>,
}

/// Aggregate report for one pass over the selected tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableRun>,
}

impl RunReport {
    /// True when every table drained and no row failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.tables.iter().all(|t| t.fatal.is_none() && t.summary.failed == 0)
    }

    /// Total rows that kept their previous value after an error.
    #[must_use]
    pub fn total_failed(&self) -> u64 {
        self.tables.iter().map(|t| t.summary.failed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(tables: Vec<TableRun>) -> RunReport {
        let now = Utc::now();
        RunReport { mode: SyncMode::FillMissing, started_at: now, finished_at: now, tables }
    }

    #[test]
    fn summary_counters_track_outcomes() {
        let mut summary = RunSummary::new("schools");
        summary.record(&RowStatus::Updated);
        summary.record(&RowStatus::Skipped(SkipReason::EmptyText));
        summary.record(&RowStatus::Failed { error: "boom".to_owned() });
        summary.record(&RowStatus::Updated);
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn clean_report_is_success() {
        let mut summary = RunSummary::new("schools");
        summary.record(&RowStatus::Updated);
        summary.record(&RowStatus::Skipped(SkipReason::EmptyText));
        let report = report(vec![TableRun { summary, fatal: None }]);
        assert!(report.is_success());
        assert_eq!(report.total_failed(), 0);
    }

    #[test]
    fn failed_row_fails_the_report() {
        let mut summary = RunSummary::new("schools");
        summary.record(&RowStatus::Failed { error: "boom".to_owned() });
        let report = report(vec![TableRun { summary, fatal: None }]);
        assert!(!report.is_success());
        assert_eq!(report.total_failed(), 1);
    }

    #[test]
    fn fatal_table_fails_the_report() {
        let report = report(vec![TableRun {
            summary: RunSummary::new("schools"),
            fatal: Some("connection refused".to_owned()),
        }]);
        assert!(!report.is_success());
    }
}
