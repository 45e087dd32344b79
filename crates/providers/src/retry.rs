//! Resilient upstream calling — per-attempt timeout, bounded
//! exponential backoff, degraded-service floor.
//!
//! The reply pipeline must always produce user-visible text, so
//! `complete_text` never surfaces an error: after the configured
//! attempts are exhausted it returns a fixed apology instead.

use heron_core::error::ProviderError;
use heron_core::prompt::Prompt;
use heron_core::provider::{CompletionRequest, Provider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fixed degraded-service reply used when every attempt fails.
pub const DEGRADED_REPLY: &str =
    "Sorry, I'm having trouble reaching my language model right now. Please try again in a moment.";

/// Backoff policy injected as configuration so the retry loop is
/// testable with a paused clock.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts (1 = no retry).
    pub max_attempts: u32,
    /// First backoff delay; doubles per attempt.
    pub base_delay: Duration,
    /// Hard timeout applied to each attempt; cancels that attempt only.
    pub per_attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            per_attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt after `attempt_index`: `base * 2^i`.
    fn backoff_delay(&self, attempt_index: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt_index.min(16))
    }
}

/// Invokes the language-model backend with timeout + bounded retry.
pub struct UpstreamCaller {
    provider: Arc<dyn Provider>,
    policy: RetryPolicy,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl UpstreamCaller {
    pub fn new(
        provider: Arc<dyn Provider>,
        policy: RetryPolicy,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            policy,
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Generate a reply for `prompt`. Always returns text: on success
    /// the model's output, after exhausted retries the fixed degraded
    /// message.
    pub async fn complete_text(&self, prompt: Prompt) -> String {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: prompt,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        };

        for attempt in 0..self.policy.max_attempts {
            let outcome = tokio::time::timeout(
                self.policy.per_attempt_timeout,
                self.provider.complete(request.clone()),
            )
            .await;

            let failure = match outcome {
                Ok(Ok(response)) => {
                    info!(
                        provider = %self.provider.name(),
                        model = %response.model,
                        attempt = attempt + 1,
                        "Upstream completion succeeded"
                    );
                    return response.content;
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "attempt exceeded {}s",
                    self.policy.per_attempt_timeout.as_secs()
                )),
            };

            warn!(
                provider = %self.provider.name(),
                attempt = attempt + 1,
                total = self.policy.max_attempts,
                kind = failure.kind(),
                error = %failure,
                "Upstream attempt failed"
            );

            if attempt + 1 < self.policy.max_attempts {
                tokio::time::sleep(self.policy.backoff_delay(attempt)).await;
            }
        }

        warn!(
            provider = %self.provider.name(),
            attempts = self.policy.max_attempts,
            "Upstream attempts exhausted, returning degraded reply"
        );
        DEGRADED_REPLY.to_string()
    }
}
