//! Sync pipeline for vecsync
//!
//! Drives each registered table through candidate selection, text assembly,
//! embedding and persistence, aggregating per-row outcomes into a run report.

mod error;
mod retry;
mod runner;

pub use error::SyncError;
pub use retry::RetryPolicy;
pub use runner::{SyncOptions, SyncRunner};
