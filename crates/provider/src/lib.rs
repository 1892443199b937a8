//! Embedding provider layer for vecsync
//!
//! One trait, one OpenAI-compatible HTTP implementation. `embed` performs a
//! single attempt; retry policy belongs to the pipeline, which classifies
//! failures via [`ProviderError::is_transient`].

use async_trait::async_trait;
use vecsync_core::EmbeddingVector;

mod error;
mod openai;

pub use error::ProviderError;
pub use openai::{DEFAULT_EMBED_DIMENSIONS, DEFAULT_EMBED_MODEL, OpenAiEmbeddings};

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one non-empty text.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success HTTP status, an
    /// unparseable or empty response, or a vector of the wrong length.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError>;

    /// Output vector length, constant for this instance.
    fn dimensions(&self) -> usize;

    /// Model identifier for logs and reports.
    fn model_id(&self) -> &str;
}
