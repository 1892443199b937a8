//! Typed error enum for the provider crate.

use thiserror::Error;

/// Errors from embedding API operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response: no embedding data returned")]
    EmptyResponse,
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl ProviderError {
    /// Whether this error is transient and should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Whether the endpoint itself looks unreachable (connect or DNS level),
    /// as opposed to failing on this particular input.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::HttpRequest(e) if e.is_connect())
    }
}
