//! Language-model boundary.
//!
//! The debate core only needs `prompt -> text`. Network clients live in the
//! runner crate; this module holds the trait, its error taxonomy, a scripted
//! client for deterministic runs, and an opt-in retry wrapper.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// The model service failed to produce a completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Connection-level failure talking to the provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the client's deadline.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// The provider asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider answered with a non-success status.
    #[error("provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    /// The provider answered but the payload had no usable completion.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A scripted client ran out of responses.
    #[error("scripted client exhausted after {0} calls")]
    Exhausted(usize),
}

impl GenerationError {
    /// Whether a retry wrapper may try the same prompt again.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::RateLimited(_)
        )
    }
}

/// Text-completion service: fully rendered prompt in, response text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Replays a fixed sequence of responses in call order and records every prompt.
///
/// Returns [`GenerationError::Exhausted`] once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue another successful response.
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.responses).push_back(Ok(response.into()));
    }

    /// Queue a failure; it is returned in order like any other response.
    pub fn push_error(&self, error: GenerationError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let calls = {
            let mut prompts = lock(&self.prompts);
            prompts.push(prompt.to_string());
            prompts.len()
        };
        lock(&self.responses)
            .pop_front()
            .unwrap_or(Err(GenerationError::Exhausted(calls - 1)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Retry policy for [`RetryingClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure (0 = no retries).
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Wraps a client and retries retriable failures with exponential backoff.
///
/// Non-retriable errors (provider rejections, bad payloads) are returned at once.
pub struct RetryingClient {
    inner: Arc<dyn LanguageModelClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LanguageModelClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LanguageModelClient for RetryingClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retriable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying generation"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
