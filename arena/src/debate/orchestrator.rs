//! Debate orchestrator: drives the advocate → advocate → judge → scorer loop.
//!
//! Owns all four agents and is the only place messages cross between their
//! memories. Each round is strictly sequential: a turn never starts before the
//! previous one has returned and its message has been routed.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DebateError;
use crate::llm::LanguageModelClient;
use crate::memory::{ActionKind, Message, Role};
use crate::prompts::PROMPT_VERSION;
use crate::score::{parse_score_pair, Leader, ScoreLedger, ScorePair};

use super::agents::{Advocate, Agent, Judge, Scorer, TurnContext};
use super::state::{DebatePhase, DebateSession, PhaseTransition};

/// What is being debated and for how long. Immutable for the life of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateConfig {
    pub question: String,
    /// Defended by Advocate1.
    pub answer_a: String,
    /// Defended by Advocate2.
    pub answer_b: String,
    /// Rounds to play (at least 1).
    pub round_count: u32,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            question: "Should AI be regulated?".to_string(),
            answer_a: "Yes, it should".to_string(),
            answer_b: "No, no need for regulation".to_string(),
            round_count: 3,
        }
    }
}

impl DebateConfig {
    pub fn new(
        question: impl Into<String>,
        answer_a: impl Into<String>,
        answer_b: impl Into<String>,
        round_count: u32,
    ) -> Self {
        Self {
            question: question.into(),
            answer_a: answer_a.into(),
            answer_b: answer_b.into(),
            round_count,
        }
    }

    pub fn validate(&self) -> Result<(), DebateError> {
        if self.round_count == 0 {
            return Err(DebateError::InvalidConfig(
                "round_count must be at least 1".to_string(),
            ));
        }
        for (field, value) in [
            ("question", &self.question),
            ("answer_a", &self.answer_a),
            ("answer_b", &self.answer_b),
        ] {
            if value.trim().is_empty() {
                return Err(DebateError::InvalidConfig(format!("{field} is empty")));
            }
        }
        Ok(())
    }
}

/// Transcript entry for one completed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (1-indexed).
    pub round: u32,
    pub advocate1: String,
    pub advocate2: String,
    pub feedback: String,
    /// Scorer output exactly as the model returned it.
    pub raw_score: String,
    pub scores: ScorePair,
    /// When this round started.
    pub started_at: DateTime<Utc>,
    /// Round duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of a finished debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateOutcome {
    pub debate_id: String,
    pub config: DebateConfig,
    pub transcript: Vec<RoundRecord>,
    pub score_ledger: ScoreLedger,
    pub transitions: Vec<PhaseTransition>,
}

impl DebateOutcome {
    /// Raw scorer outputs, one per round, in round order.
    pub fn raw_scores(&self) -> Vec<&str> {
        self.transcript.iter().map(|r| r.raw_score.as_str()).collect()
    }

    pub fn totals(&self) -> (u32, u32) {
        self.score_ledger.totals()
    }

    pub fn leader(&self) -> Leader {
        self.score_ledger.leader()
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        let (a, b) = self.totals();
        format!(
            "[{:?}] {} rounds | Advocate1 {} - Advocate2 {} | id={}",
            self.leader(),
            self.transcript.len(),
            a,
            b,
            self.debate_id
        )
    }
}

/// Turns of one round that have been played and routed.
#[derive(Debug)]
struct RoundProgress {
    round: u32,
    started_at: DateTime<Utc>,
    clock: Instant,
    defense1: Option<String>,
    defense2: Option<String>,
    feedback: Option<String>,
}

impl RoundProgress {
    fn new(round: u32) -> Self {
        Self {
            round,
            started_at: Utc::now(),
            clock: Instant::now(),
            defense1: None,
            defense2: None,
            feedback: None,
        }
    }

    /// Role whose turn comes next.
    fn next_turn(&self) -> Role {
        if self.defense1.is_none() {
            Role::Advocate1
        } else if self.defense2.is_none() {
            Role::Advocate2
        } else if self.feedback.is_none() {
            Role::Judge
        } else {
            Role::Scorer
        }
    }
}

/// Hooks for presentation layers. Every method defaults to a no-op.
pub trait DebateObserver: Send + Sync {
    fn on_debate_start(&self, _config: &DebateConfig) {}

    /// A round is about to play its first turn. Not repeated on resume.
    fn on_round_start(&self, _round: u32) {}

    fn on_turn(&self, _round: u32, _message: &Message) {}

    fn on_round_complete(&self, _record: &RoundRecord) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl DebateObserver for NoopObserver {}

/// Drives a debate from `NotStarted` to `Finished`.
///
/// Usage:
/// 1. Create with `new()`, optionally attach a cancellation token and observer
/// 2. Call `run()` to play every remaining round, or `run_round()` for one
/// 3. After an error the phase is `Halted(i)`; calling `run()` again
///    continues round `i` at the turn that failed
pub struct DebateOrchestrator {
    config: Arc<DebateConfig>,
    session: DebateSession,
    advocate1: Advocate,
    advocate2: Advocate,
    judge: Judge,
    scorer: Scorer,
    ledger: ScoreLedger,
    transcript: Vec<RoundRecord>,
    cancel: CancellationToken,
    observer: Box<dyn DebateObserver>,
    announced: bool,
    /// Turns already played in a halted round.
    pending: Option<RoundProgress>,
}

impl DebateOrchestrator {
    /// Build the four agents and seed the opening question into Advocate1's memory.
    pub fn new(
        config: DebateConfig,
        client: Arc<dyn LanguageModelClient>,
    ) -> Result<Self, DebateError> {
        config.validate()?;
        let config = Arc::new(config);

        let mut advocate1 = Advocate::first(config.clone(), client.clone());
        let advocate2 = Advocate::second(config.clone(), client.clone());
        let judge = Judge::new(config.clone(), client.clone());
        let scorer = Scorer::new(config.clone(), client);

        // No template reads this seed; it stays for parity with the message log.
        advocate1.receive(Message::new(
            config.question.clone(),
            Role::Human,
            ActionKind::Defend,
        ));

        Ok(Self {
            session: DebateSession::new(config.round_count),
            config,
            advocate1,
            advocate2,
            judge,
            scorer,
            ledger: ScoreLedger::new(),
            transcript: Vec::new(),
            cancel: CancellationToken::new(),
            observer: Box::new(NoopObserver),
            announced: false,
            pending: None,
        })
    }

    /// Abort in-flight turns when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn DebateObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Play every remaining round and return the outcome.
    pub async fn run(&mut self) -> Result<DebateOutcome, DebateError> {
        while !self.session.is_complete() {
            self.run_round().await?;
        }
        info!(
            id = %self.session.id,
            rounds = self.transcript.len(),
            ledger = %self.ledger.render(),
            "Debate finished"
        );
        Ok(self.snapshot())
    }

    /// Play exactly one round: the next one, or the rest of the halted one.
    ///
    /// On failure the phase becomes `Halted(i)`, the ledger keeps only
    /// completed rounds, and turns already played stay recorded. The next
    /// call resumes at the turn that failed; no turn is generated or routed
    /// twice.
    pub async fn run_round(&mut self) -> Result<RoundRecord, DebateError> {
        self.announce();
        let round = self.session.begin_round()?;

        let mut progress = match self.pending.take() {
            Some(progress) if progress.round == round => {
                info!(round, next_turn = %progress.next_turn(), "Round resumed");
                progress
            }
            _ => {
                info!(round, total = self.config.round_count, "Round started");
                self.observer.on_round_start(round);
                RoundProgress::new(round)
            }
        };

        match self.play_round(&mut progress).await {
            Ok(record) => {
                self.session.complete_round(round)?;
                self.transcript.push(record.clone());
                self.observer.on_round_complete(&record);
                info!(
                    round,
                    scores = %record.scores,
                    duration_ms = record.duration_ms,
                    "Round complete"
                );
                Ok(record)
            }
            Err(err) => {
                warn!(round, next_turn = %progress.next_turn(), error = %err, "Round halted");
                self.pending = Some(progress);
                if let Err(transition) = self.session.halt(round, &err.to_string()) {
                    warn!(error = %transition, "Could not record halt");
                }
                Err(err)
            }
        }
    }

    fn announce(&mut self) {
        if self.announced {
            return;
        }
        self.announced = true;
        info!(
            id = %self.session.id,
            question = %self.config.question,
            rounds = self.config.round_count,
            prompt_version = PROMPT_VERSION,
            "Debate starting"
        );
        self.observer.on_debate_start(&self.config);
    }

    /// Play the turns of `progress.round` that have not happened yet.
    ///
    /// Each turn is recorded in `progress` as soon as its message is routed,
    /// so an error leaves exactly the finished turns behind.
    async fn play_round(
        &mut self,
        progress: &mut RoundProgress,
    ) -> Result<RoundRecord, DebateError> {
        let round = progress.round;
        let total_rounds = self.config.round_count;

        // 1. Advocate1
        let defense1 = match progress.defense1.clone() {
            Some(content) => content,
            None => {
                let ctx = TurnContext {
                    current_round: round,
                    total_rounds,
                    previous_scores: &self.ledger,
                };
                let msg = guarded(&self.cancel, round, self.advocate1.produce_turn(&ctx)).await?;
                self.observer.on_turn(round, &msg);
                self.route_defense(&msg)?;
                progress.defense1 = Some(msg.content.clone());
                msg.content
            }
        };

        // 2. Advocate2
        let defense2 = match progress.defense2.clone() {
            Some(content) => content,
            None => {
                let ctx = TurnContext {
                    current_round: round,
                    total_rounds,
                    previous_scores: &self.ledger,
                };
                let msg = guarded(&self.cancel, round, self.advocate2.produce_turn(&ctx)).await?;
                self.observer.on_turn(round, &msg);
                self.route_defense(&msg)?;
                progress.defense2 = Some(msg.content.clone());
                msg.content
            }
        };

        // 3. Judge
        let feedback = match progress.feedback.clone() {
            Some(content) => content,
            None => {
                let ctx = TurnContext {
                    current_round: round,
                    total_rounds,
                    previous_scores: &self.ledger,
                };
                let msg = guarded(&self.cancel, round, self.judge.produce_turn(&ctx)).await?;
                self.observer.on_turn(round, &msg);
                self.advocate1.receive(msg.clone());
                self.advocate2.receive(msg.clone());
                debug!(round, "Feedback routed to both advocates");
                progress.feedback = Some(msg.content.clone());
                msg.content
            }
        };

        // 4. Scorer (a rejected score is not kept, so a resume asks again)
        let ctx = TurnContext {
            current_round: round,
            total_rounds,
            previous_scores: &self.ledger,
        };
        let score = guarded(&self.cancel, round, self.scorer.produce_turn(&ctx)).await?;
        self.observer.on_turn(round, &score);
        let scores = parse_score_pair(&score.content)?;
        self.ledger.push(scores);

        Ok(RoundRecord {
            round,
            advocate1: defense1,
            advocate2: defense2,
            feedback,
            raw_score: score.content,
            scores,
            started_at: progress.started_at,
            duration_ms: progress.clock.elapsed().as_millis() as u64,
        })
    }

    /// Copy a defense to the opponent (relabeled), the judge, and the scorer.
    fn route_defense(&mut self, defense: &Message) -> Result<(), DebateError> {
        let (opponent, tag) = match (defense.role, defense.role.opponent_view()) {
            (Role::Advocate1, Some(tag)) => (&mut self.advocate2, tag),
            (Role::Advocate2, Some(tag)) => (&mut self.advocate1, tag),
            (role, _) => return Err(DebateError::Unroutable { role }),
        };
        opponent.receive(defense.relabeled(tag));
        self.judge.receive(defense.clone());
        self.scorer.receive(defense.clone());
        debug!(from = %defense.role, "Defense routed to opponent, judge, scorer");
        Ok(())
    }

    /// Outcome snapshot; `None` until the debate has finished.
    pub fn outcome(&self) -> Option<DebateOutcome> {
        self.session.is_complete().then(|| self.snapshot())
    }

    fn snapshot(&self) -> DebateOutcome {
        DebateOutcome {
            debate_id: self.session.id.clone(),
            config: (*self.config).clone(),
            transcript: self.transcript.clone(),
            score_ledger: self.ledger.clone(),
            transitions: self.session.transitions.clone(),
        }
    }

    pub fn phase(&self) -> DebatePhase {
        self.session.phase
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn transcript(&self) -> &[RoundRecord] {
        &self.transcript
    }

    pub fn advocate1(&self) -> &Advocate {
        &self.advocate1
    }

    pub fn advocate2(&self) -> &Advocate {
        &self.advocate2
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn status_line(&self) -> String {
        format!(
            "{} | ledger={} | leader={:?}",
            self.session.status_line(),
            self.ledger.render(),
            self.ledger.leader()
        )
    }
}

/// Race a turn against cancellation.
async fn guarded<F>(
    cancel: &CancellationToken,
    round: u32,
    turn: F,
) -> Result<Message, DebateError>
where
    F: Future<Output = Result<Message, DebateError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DebateError::Cancelled { round }),
        result = turn => result,
    }
}

/// Run a full debate with `config.round_count` rounds.
pub async fn run_debate(
    config: DebateConfig,
    client: Arc<dyn LanguageModelClient>,
) -> Result<DebateOutcome, DebateError> {
    DebateOrchestrator::new(config, client)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedClient;

    fn one_round_script(score: &str) -> Vec<String> {
        vec![
            "a1".to_string(),
            "b1".to_string(),
            "feedback 1".to_string(),
            score.to_string(),
        ]
    }

    #[test]
    fn test_config_validation() {
        assert!(DebateConfig::default().validate().is_ok());
        let zero = DebateConfig {
            round_count: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(DebateError::InvalidConfig(_))));
        let blank = DebateConfig::new("  ", "yes", "no", 1);
        assert!(matches!(blank.validate(), Err(DebateError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_seeds_question_into_advocate1_only() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));
        let orch = DebateOrchestrator::new(DebateConfig::default(), client).unwrap();

        let seeded = orch.advocate1().memory().by_role(Role::Human);
        assert_eq!(seeded.len(), 1);
        assert_eq!(seeded[0].content, "Should AI be regulated?");
        assert!(orch.advocate2().memory().is_empty());
        assert!(orch.judge().memory().is_empty());
        assert!(orch.scorer().memory().is_empty());
        assert_eq!(orch.phase(), DebatePhase::NotStarted);
        assert!(orch.outcome().is_none());
    }

    #[tokio::test]
    async fn test_single_round_routes_messages() {
        let client = Arc::new(ScriptedClient::new(one_round_script("(18, 9)")));
        let config = DebateConfig {
            round_count: 1,
            ..Default::default()
        };
        let mut orch = DebateOrchestrator::new(config, client).unwrap();
        let record = orch.run_round().await.unwrap();

        assert_eq!(record.scores, ScorePair::new(18, 9).unwrap());
        assert_eq!(orch.phase(), DebatePhase::Finished);

        let a1 = orch.advocate1().memory();
        assert_eq!(a1.last_by_role(Role::OpponentOfAdvocate1).unwrap().content, "b1");
        assert_eq!(a1.last_by_role(Role::Judge).unwrap().content, "feedback 1");
        let a2 = orch.advocate2().memory();
        assert_eq!(a2.last_by_role(Role::OpponentOfAdvocate2).unwrap().content, "a1");
        assert!(a2.by_role(Role::Advocate1).is_empty());

        let judged: Vec<&str> = orch
            .judge()
            .memory()
            .iter()
            .filter(|m| m.role.is_advocate())
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(judged, vec!["a1", "b1"]);
    }

    #[tokio::test]
    async fn test_score_parse_failure_halts_without_ledger_entry() {
        let client = Arc::new(ScriptedClient::new(one_round_script("not a tuple")));
        let mut orch = DebateOrchestrator::new(DebateConfig::default(), client).unwrap();

        let err = orch.run_round().await.unwrap_err();
        assert!(matches!(err, DebateError::ScoreParse(_)));
        assert!(orch.ledger().is_empty());
        assert!(orch.transcript().is_empty());
        assert_eq!(orch.phase(), DebatePhase::Halted(1));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_turn() {
        let client = Arc::new(ScriptedClient::new(one_round_script("(10, 10)")));
        let token = CancellationToken::new();
        token.cancel();
        let mut orch = DebateOrchestrator::new(DebateConfig::default(), client.clone())
            .unwrap()
            .with_cancellation(token);

        let err = orch.run().await.unwrap_err();
        assert!(matches!(err, DebateError::Cancelled { round: 1 }));
        assert_eq!(orch.phase(), DebatePhase::Halted(1));
        assert_eq!(client.call_count(), 0);
        assert!(orch.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_run_round_after_finished_is_transition_error() {
        let client = Arc::new(ScriptedClient::new(one_round_script("(5, 6)")));
        let config = DebateConfig {
            round_count: 1,
            ..Default::default()
        };
        let mut orch = DebateOrchestrator::new(config, client).unwrap();
        let outcome = orch.run().await.unwrap();
        assert_eq!(outcome.raw_scores(), vec!["(5, 6)"]);
        assert_eq!(outcome.leader(), Leader::Advocate2);

        let err = orch.run_round().await.unwrap_err();
        assert!(matches!(err, DebateError::Transition(_)));
        assert_eq!(orch.phase(), DebatePhase::Finished);
    }

    #[test]
    fn test_routing_a_non_advocate_message_is_an_error() {
        let client = Arc::new(ScriptedClient::default());
        let mut orch = DebateOrchestrator::new(DebateConfig::default(), client).unwrap();
        let feedback = Message::new("be concrete", Role::Judge, ActionKind::Feedback);

        let err = orch.route_defense(&feedback).unwrap_err();
        assert!(matches!(err, DebateError::Unroutable { role: Role::Judge }));
        assert!(orch.advocate2().memory().is_empty());
        assert!(orch.judge().memory().is_empty());
        assert!(orch.scorer().memory().is_empty());
    }

    #[test]
    fn test_outcome_summary_line() {
        let mut ledger = ScoreLedger::new();
        ledger.push(ScorePair::new(12, 8).unwrap());
        let outcome = DebateOutcome {
            debate_id: "d-1".to_string(),
            config: DebateConfig::default(),
            transcript: Vec::new(),
            score_ledger: ledger,
            transitions: Vec::new(),
        };
        let line = outcome.summary_line();
        assert!(line.contains("Advocate1 12 - Advocate2 8"));
        assert!(line.contains("id=d-1"));
    }
}
