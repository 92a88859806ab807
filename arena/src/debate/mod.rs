//! Debate Orchestration: Advocate/Judge/Scorer Round Loop
//!
//! Two advocates defend opposing answers to one question. After each pair of
//! defenses a judge writes feedback for both and a scorer emits a `(a, b)`
//! score pair that is appended to the ledger.
//!
//! # Round Flow
//!
//! ```text
//! Advocate1 ──defense──→ Advocate2 (as "opponent"), Judge, Scorer
//!     │
//! Advocate2 ──defense──→ Advocate1 (as "opponent"), Judge, Scorer
//!     │
//! Judge ─────feedback──→ Advocate1, Advocate2
//!     │
//! Scorer ────(a, b)────→ ScoreLedger
//!     │
//!     ├─ rounds left → next round
//!     └─ last round  → Finished
//! ```

pub mod agents;
pub mod orchestrator;
pub mod state;

pub use agents::{Advocate, Agent, Judge, Scorer, TurnContext, WAITING_CONTENT};
pub use orchestrator::{
    run_debate, DebateConfig, DebateObserver, DebateOrchestrator, DebateOutcome, NoopObserver,
    RoundRecord,
};
pub use state::{DebatePhase, DebateSession, PhaseTransition, TransitionError};
