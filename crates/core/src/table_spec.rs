use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id column assumed when a spec does not name one.
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Errors raised while building or resolving table specs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("table spec has an empty table name")]
    EmptyTableName,

    #[error("table spec for {0:?} has no text fields")]
    NoTextFields(String),

    #[error("table spec for {0:?} has no embedding target columns")]
    NoEmbeddingTargets(String),

    #[error("table spec for {table:?} has a blank {what} column")]
    BlankColumn { table: String, what: &'static str },

    #[error("unknown table {name:?}, known tables: {known}")]
    UnknownTable { name: String, known: String },
}

/// How candidate rows are selected for a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Only rows whose embedding target column(s) are NULL.
    #[default]
    FillMissing,
    /// Every row, recomputing embeddings that already exist.
    RefreshAll,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FillMissing => "fill-missing",
            Self::RefreshAll => "refresh-all",
        }
    }
}

/// Rejected sync mode string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sync mode {0:?}, expected \"fill-missing\" or \"refresh-all\"")]
pub struct ParseSyncModeError(String);

impl std::str::FromStr for SyncMode {
    type Err = ParseSyncModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fill-missing" => Ok(Self::FillMissing),
            "refresh-all" => Ok(Self::RefreshAll),
            _ => Err(ParseSyncModeError(s.to_owned())),
        }
    }
}

/// Column layout of one table whose embedding column(s) this tool maintains.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name in the backing store.
    pub table: String,
    /// Primary key column, read back as text.
    pub id_column: String,
    /// Columns concatenated, in this order, into the text to embed.
    pub text_fields: Vec<String>,
    /// Column(s) the computed vector is written to.
    pub embedding_targets: Vec<String>,
}

impl TableSpec {
    #[must_use]
    pub fn builder(table: impl Into<String>) -> TableSpecBuilder {
        TableSpecBuilder {
            table: table.into(),
            id_column: None,
            text_fields: Vec::new(),
            embedding_targets: Vec::new(),
        }
    }
}

/// Builder validating a [`TableSpec`] before it can reach the pipeline.
#[derive(Debug)]
pub struct TableSpecBuilder {
    table: String,
    id_column: Option<String>,
    text_fields: Vec<String>,
    embedding_targets: Vec<String>,
}

impl TableSpecBuilder {
    #[must_use]
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn text_field(mut self, column: impl Into<String>) -> Self {
        self.text_fields.push(column.into());
        self
    }

    #[must_use]
    pub fn text_fields<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_fields.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn embedding_target(mut self, column: impl Into<String>) -> Self {
        self.embedding_targets.push(column.into());
        self
    }

    /// # Errors
    /// Returns an error when the table name is blank, no text fields or
    /// embedding targets were given, or any column name is blank.
    pub fn build(self) -> Result<TableSpec, SpecError> {
        if self.table.trim().is_empty() {
            return Err(SpecError::EmptyTableName);
        }
        let id_column = self.id_column.unwrap_or_else(|| DEFAULT_ID_COLUMN.to_owned());
        if id_column.trim().is_empty() {
            return Err(SpecError::BlankColumn { table: self.table, what: "id" });
        }
        if self.text_fields.is_empty() {
            return Err(SpecError::NoTextFields(self.table));
        }
        if self.text_fields.iter().any(|c| c.trim().is_empty()) {
            return Err(SpecError::BlankColumn { table: self.table, what: "text" });
        }
        if self.embedding_targets.is_empty() {
            return Err(SpecError::NoEmbeddingTargets(self.table));
        }
        if self.embedding_targets.iter().any(|c| c.trim().is_empty()) {
            return Err(SpecError::BlankColumn { table: self.table, what: "target" });
        }
        Ok(TableSpec {
            table: self.table,
            id_column,
            text_fields: self.text_fields,
            embedding_targets: self.embedding_targets,
        })
    }
}

/// Tables maintained by a full run, in processing order.
///
/// Column sets mirror the deployed directory schema; the searchable text of
/// each listing feeds a single `vector_embedding` column.
#[must_use]
pub fn builtin_specs() -> Vec<TableSpec> {
    vec![
        TableSpec::builder("health_specialists")
            .text_fields(["name", "specialty", "location", "services", "bio"])
            .embedding_target("vector_embedding")
            .build()
            .expect("BUG: builtin health_specialists spec must be valid"),
        TableSpec::builder("schools")
            .text_fields(["name", "location", "programs", "description"])
            .embedding_target("vector_embedding")
            .build()
            .expect("BUG: builtin schools spec must be valid"),
        TableSpec::builder("outdoor_clubs")
            .text_fields(["name", "location", "activities", "description"])
            .embedding_target("vector_embedding")
            .build()
            .expect("BUG: builtin outdoor_clubs spec must be valid"),
    ]
}

/// Resolve a requested table subset against `specs`, preserving spec order.
///
/// An empty request selects every spec. Unknown names fail the whole run
/// before any row is processed.
///
/// # Errors
/// Returns [`SpecError::UnknownTable`] for a name absent from `specs`.
pub fn resolve_tables(
    specs: &[TableSpec],
    requested: &[String],
) -> Result<Vec<TableSpec>, SpecError> {
    if requested.is_empty() {
        return Ok(specs.to_vec());
    }
    for name in requested {
        if !specs.iter().any(|s| s.table == *name) {
            return Err(SpecError::UnknownTable {
                name: name.clone(),
                known: specs.iter().map(|s| s.table.as_str()).collect::<Vec<_>>().join(", "),
            });
        }
    }
    Ok(specs.iter().filter(|s| requested.contains(&s.table)).cloned().collect())
}
