//! Retry policy for transient provider failures.

use std::time::Duration;

use vecsync_core::EmbeddingVector;
use vecsync_provider::{EmbeddingProvider, ProviderError};

/// Exponential backoff bounds for transient provider errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per row, including the first (at least 1).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after `attempt` (1-based) failed:
    /// `base_delay * 2^(attempt - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(10);
        self.base_delay.saturating_mul(1u32 << exp).min(self.max_delay)
    }
}

/// Calls `provider.embed`, retrying transient failures until the policy is
/// exhausted. Permanent failures return immediately.
pub(crate) async fn embed_with_retry(
    provider: &dyn EmbeddingProvider,
    policy: &RetryPolicy,
    table: &str,
    id: &str,
    text: &str,
) -> Result<EmbeddingVector, ProviderError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match provider.embed(text).await {
            Ok(vector) => return Ok(vector),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    table,
                    id,
                    attempt,
                    max_attempts,
                    error = %e,
                    "transient embedding failure, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            Err(e) => return Err(e),
        }
    }
}
