//! Record source layer for vecsync
//!
//! PostgreSQL-backed reads of candidate rows and atomic writes of computed
//! embedding vectors.

mod error;
mod pg;
mod source;

pub use error::StorageError;
pub use pg::PgRecordSource;
pub use source::{RecordSource, TableStats};
