//! Error taxonomy surfaced by the debate orchestrator.
//!
//! All kinds propagate to the caller unrecovered. Waiting turns are not errors.

use thiserror::Error;

use crate::debate::state::TransitionError;
use crate::llm::GenerationError;
use crate::memory::Role;
use crate::prompts::TemplateError;
use crate::score::ScoreParseError;

#[derive(Debug, Error)]
pub enum DebateError {
    /// A prompt was rendered without one of its parameters.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The model service failed or timed out; the round did not complete.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The scorer's output was not a valid in-range pair; the ledger was not touched.
    #[error("score parse failed: {0}")]
    ScoreParse(#[from] ScoreParseError),

    /// The orchestrator was driven through an illegal phase change.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// The run was cancelled while round `round` was in progress.
    #[error("debate cancelled during round {round}")]
    Cancelled { round: u32 },

    /// Only advocate messages can be routed as defenses.
    #[error("cannot route a {role} message as a defense")]
    Unroutable { role: Role },

    /// The debate configuration cannot be run.
    #[error("invalid debate configuration: {0}")]
    InvalidConfig(String),
}

impl DebateError {
    /// Whether re-running the halted round could succeed without code changes.
    pub fn is_resumable(&self) -> bool {
        match self {
            Self::Generation(_) | Self::ScoreParse(_) | Self::Cancelled { .. } => true,
            Self::Template(_)
            | Self::Transition(_)
            | Self::Unroutable { .. }
            | Self::InvalidConfig(_) => false,
        }
    }
}
