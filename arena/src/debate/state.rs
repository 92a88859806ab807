//! Debate state machine: phases, transitions, and session tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Phase of a debate run.
///
/// ```text
/// NotStarted → RoundInProgress(1) → RoundComplete(1) → RoundInProgress(2) → … → Finished
///                    │                                       │
///                    └──── error / cancel ──→ Halted(i) ──── resume ──→ RoundInProgress(i)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "round", rename_all = "snake_case")]
pub enum DebatePhase {
    /// Built, seeded, no turn taken yet.
    NotStarted,
    /// Turns of round `i` are being played.
    RoundInProgress(u32),
    /// Round `i` finished and its scores are in the ledger.
    RoundComplete(u32),
    /// Round `i` failed or was cancelled; resumable.
    Halted(u32),
    /// All rounds played.
    Finished,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The round this phase refers to, if any.
    pub fn round(self) -> Option<u32> {
        match self {
            Self::RoundInProgress(i) | Self::RoundComplete(i) | Self::Halted(i) => Some(i),
            Self::NotStarted | Self::Finished => None,
        }
    }

    /// Whether `self → to` is a legal edge for a debate of `round_count` rounds.
    pub fn can_transition_to(self, to: DebatePhase, round_count: u32) -> bool {
        match (self, to) {
            (Self::NotStarted, Self::RoundInProgress(1)) => true,
            (Self::RoundInProgress(i), Self::RoundComplete(j))
            | (Self::RoundInProgress(i), Self::Halted(j)) => i == j,
            (Self::RoundComplete(i), Self::RoundInProgress(j)) => j == i + 1 && j <= round_count,
            (Self::RoundComplete(i), Self::Finished) => i == round_count,
            (Self::Halted(i), Self::RoundInProgress(j)) => i == j,
            _ => false,
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::RoundInProgress(i) => write!(f, "round_in_progress({})", i),
            Self::RoundComplete(i) => write!(f, "round_complete({})", i),
            Self::Halted(i) => write!(f, "halted({})", i),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Previous phase.
    pub from: DebatePhase,
    /// New phase.
    pub to: DebatePhase,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition {from} → {to}: {reason}")]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub reason: String,
}

/// Phase and transition history of one debate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Unique run identifier.
    pub id: String,
    /// Current phase.
    pub phase: DebatePhase,
    /// Rounds this debate plays.
    pub round_count: u32,
    /// Transition history.
    pub transitions: Vec<PhaseTransition>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl DebateSession {
    pub fn new(round_count: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phase: DebatePhase::NotStarted,
            round_count,
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.can_transition_to(to, self.round_count) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!("not a valid transition for {} rounds", self.round_count),
            });
        }

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Enter the next round to play and return its 1-indexed number.
    ///
    /// From `Halted(i)` this re-enters round `i`.
    pub fn begin_round(&mut self) -> Result<u32, TransitionError> {
        let (next, reason) = match self.phase {
            DebatePhase::NotStarted => (1, "debate started"),
            DebatePhase::RoundComplete(i) => (i + 1, "next round"),
            DebatePhase::Halted(i) => (i, "resumed after halt"),
            phase => {
                return Err(TransitionError {
                    from: phase,
                    to: DebatePhase::RoundInProgress(phase.round().unwrap_or(0) + 1),
                    reason: "no round can begin from this phase".to_string(),
                })
            }
        };
        self.transition(DebatePhase::RoundInProgress(next), reason)?;
        Ok(next)
    }

    /// Mark `round` complete and finish the debate if it was the last one.
    pub fn complete_round(&mut self, round: u32) -> Result<(), TransitionError> {
        self.transition(DebatePhase::RoundComplete(round), "round scored")?;
        if round == self.round_count {
            self.transition(DebatePhase::Finished, "all rounds played")?;
        }
        Ok(())
    }

    /// Halt the round in progress.
    pub fn halt(&mut self, round: u32, reason: &str) -> Result<(), TransitionError> {
        self.transition(DebatePhase::Halted(round), reason)
    }

    /// Whether the debate has ended.
    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Number of fully completed rounds.
    pub fn rounds_completed(&self) -> u32 {
        match self.phase {
            DebatePhase::NotStarted => 0,
            DebatePhase::RoundInProgress(i) | DebatePhase::Halted(i) => i - 1,
            DebatePhase::RoundComplete(i) => i,
            DebatePhase::Finished => self.round_count,
        }
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] {}/{} rounds complete | {} transitions | id={}",
            self.phase,
            self.rounds_completed(),
            self.round_count,
            self.transitions.len(),
            self.id
        )
    }
}
