//! Arena: structured LLM debates.
//!
//! This library provides:
//! - Per-agent append-only memories and the message model
//! - Prompt templates for defense, feedback, and scoring turns
//! - Strict parsing of scorer output into a score ledger
//! - A round-based orchestrator driving two advocates, a judge, and a scorer
//!   against any [`LanguageModelClient`]
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use arena::{run_debate, DebateConfig, ScriptedClient};
//!
//! # async fn demo() -> Result<(), arena::DebateError> {
//! let client = Arc::new(ScriptedClient::new(["defense a", "defense b", "feedback", "(12, 9)"]));
//! let config = DebateConfig { round_count: 1, ..Default::default() };
//! let outcome = run_debate(config, client).await?;
//! println!("{}", outcome.score_ledger.render());
//! # Ok(())
//! # }
//! ```

pub mod debate;
pub mod error;
pub mod llm;
pub mod memory;
pub mod prompts;
pub mod score;

pub use debate::{
    run_debate, DebateConfig, DebateObserver, DebateOrchestrator, DebateOutcome, DebatePhase,
    RoundRecord,
};
pub use error::DebateError;
pub use llm::{GenerationError, LanguageModelClient, RetryPolicy, RetryingClient, ScriptedClient};
pub use memory::{ActionKind, AgentMemory, Message, Role};
pub use score::{parse_score_pair, Leader, ScoreLedger, ScorePair};
