//! Command-line runner for arena debates.
//!
//! Resolves configuration, builds the model client, and renders the
//! transcript. The debate itself lives in the `arena` crate.

pub mod client;
pub mod config;
pub mod report;

use std::sync::Arc;

use arena::{GenerationError, LanguageModelClient, RetryPolicy, RetryingClient, ScriptedClient};

use crate::client::OpenAiCompatClient;
use crate::config::LlmSettings;

/// HTTP client for `settings`, wrapped in retries when `max_retries > 0`.
pub fn build_client(
    settings: &LlmSettings,
) -> Result<Arc<dyn LanguageModelClient>, GenerationError> {
    let http: Arc<dyn LanguageModelClient> = Arc::new(OpenAiCompatClient::new(settings)?);
    if settings.max_retries == 0 {
        return Ok(http);
    }
    let policy = RetryPolicy {
        max_retries: settings.max_retries,
        ..RetryPolicy::default()
    };
    Ok(Arc::new(RetryingClient::new(http, policy)))
}

/// Canned responses for `rounds` rounds; lets the full loop run offline.
pub fn dry_run_client(rounds: u32) -> ScriptedClient {
    let client = ScriptedClient::default();
    for round in 1..=rounds {
        client.push_response(format!("[dry-run] Advocate1 defense, round {round}."));
        client.push_response(format!("[dry-run] Advocate2 defense, round {round}."));
        client.push_response(format!("[dry-run] Judge feedback, round {round}."));
        let first = 10 + (round % 5) as u8;
        let second = 10 + ((round + 2) % 5) as u8;
        client.push_response(format!("({first}, {second})"));
    }
    client
}
