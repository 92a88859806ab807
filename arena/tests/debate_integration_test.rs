//! Scripted debate integration test: drives the full round loop through
//! `DebateOrchestrator` with a deterministic client (no network calls).
//!
//! Covers: routing ↔ prompts ↔ score parsing ↔ phase transitions ↔ resume.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use arena::debate::{Agent, DebateObserver, RoundRecord};
use arena::{
    run_debate, DebateConfig, DebateError, DebateOrchestrator, DebatePhase, GenerationError,
    LanguageModelClient, Leader, Message, Role, ScorePair, ScriptedClient,
};

fn two_round_config() -> DebateConfig {
    DebateConfig {
        round_count: 2,
        ..Default::default()
    }
}

fn two_round_script() -> ScriptedClient {
    ScriptedClient::new([
        "AI needs guardrails",
        "Markets self-correct",
        "Both need evidence",
        "(18, 9)",
        "Regulation enables trust",
        "Innovation dies under rules",
        "Address costs",
        "(12, 15)",
    ])
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_round_debate_end_to_end() {
    let client = Arc::new(two_round_script());
    let outcome = run_debate(two_round_config(), client.clone()).await.unwrap();

    assert_eq!(outcome.transcript.len(), 2);
    assert_eq!(
        outcome.score_ledger.as_slice(),
        &[ScorePair::new(18, 9).unwrap(), ScorePair::new(12, 15).unwrap()]
    );
    assert_eq!(outcome.raw_scores(), vec!["(18, 9)", "(12, 15)"]);
    assert_eq!(outcome.totals(), (30, 24));
    assert_eq!(outcome.leader(), Leader::Advocate1);
    assert_eq!(outcome.transcript[1].feedback, "Address costs");

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 8);
    assert!(prompts[2].contains("Previous scores: []"));
    assert!(prompts[6].contains("Previous scores: [(18, 9)]"));
    assert!(prompts[7].contains("Current round: 2"));
    assert!(prompts[7].contains("Total rounds: 2"));
}

#[tokio::test]
async fn test_model_call_order_per_round() {
    let client = Arc::new(two_round_script());
    run_debate(two_round_config(), client.clone()).await.unwrap();

    let prompts = client.prompts();
    for round in prompts.chunks(4) {
        assert!(round[0].contains("defending this answer: Yes, it should"));
        assert!(round[1].contains("defending this answer: No, no need for regulation"));
        assert!(round[2].contains("Give your feedback"));
        assert!(round[3].contains("Your scores:"));
    }
}

#[tokio::test]
async fn test_round_two_prompts_carry_round_one_context() {
    let client = Arc::new(two_round_script());
    run_debate(two_round_config(), client.clone()).await.unwrap();

    let prompts = client.prompts();
    // Advocate1 in round 2 sees Advocate2's round-1 defense and the judge's feedback.
    assert!(prompts[4].contains("Opponent's last argument: Markets self-correct"));
    assert!(prompts[4].contains("Latest feedback: Both need evidence"));
    // Advocate2 sees Advocate1's defense from the same round.
    assert!(prompts[5].contains("Opponent's last argument: Regulation enables trust"));
    // Judge and scorer read only this round's pair.
    assert!(prompts[6].contains("Defense for 1st answer: Regulation enables trust"));
    assert!(prompts[6].contains("Defense for 2nd answer: Innovation dies under rules"));
    assert!(!prompts[7].contains("AI needs guardrails"));
}

// ── Memory isolation ───────────────────────────────────────────────

#[tokio::test]
async fn test_memories_hold_relabeled_copies() {
    let client = Arc::new(two_round_script());
    let mut orch = DebateOrchestrator::new(two_round_config(), client).unwrap();
    orch.run().await.unwrap();

    let adv1 = orch.advocate1().memory();
    let own: Vec<&str> = adv1
        .by_role(Role::Advocate1)
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    let seen: Vec<&str> = adv1
        .by_role(Role::OpponentOfAdvocate1)
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(own, vec!["AI needs guardrails", "Regulation enables trust"]);
    assert_eq!(seen, vec!["Markets self-correct", "Innovation dies under rules"]);
    assert!(adv1.by_role(Role::Advocate2).is_empty());
    assert_eq!(adv1.by_role(Role::Human).len(), 1);

    let adv2 = orch.advocate2().memory();
    assert!(adv2.by_role(Role::Advocate1).is_empty());
    assert_eq!(adv2.by_role(Role::OpponentOfAdvocate2).len(), 2);
    assert_eq!(adv2.by_role(Role::Judge).len(), 2);
    assert!(adv2.by_role(Role::Human).is_empty());

    // Judge sees defense, defense, own feedback per round.
    let judge_roles: Vec<Role> = orch.judge().memory().iter().map(|m| m.role).collect();
    assert_eq!(
        judge_roles,
        vec![
            Role::Advocate1,
            Role::Advocate2,
            Role::Judge,
            Role::Advocate1,
            Role::Advocate2,
            Role::Judge,
        ]
    );
    let scorer_roles: Vec<Role> = orch.scorer().memory().iter().map(|m| m.role).collect();
    assert_eq!(scorer_roles[2], Role::Scorer);
    assert_eq!(scorer_roles.len(), 6);
}

// ── Failure and resume ─────────────────────────────────────────────

#[tokio::test]
async fn test_malformed_score_halts_round() {
    let client = Arc::new(ScriptedClient::new(["a", "b", "feedback", "not a tuple"]));
    let mut orch = DebateOrchestrator::new(two_round_config(), client).unwrap();

    let err = orch.run().await.unwrap_err();
    assert!(matches!(err, DebateError::ScoreParse(_)));
    assert!(orch.ledger().is_empty());
    assert_eq!(orch.phase(), DebatePhase::Halted(1));
    assert!(orch.outcome().is_none());
    assert!(orch.status_line().contains("[halted(1)]"));
}

#[tokio::test]
async fn test_unbracketed_score_is_rejected() {
    let client = Arc::new(ScriptedClient::new(["a", "b", "feedback", "18, 9"]));
    let err = run_debate(two_round_config(), client).await.unwrap_err();
    assert!(matches!(err, DebateError::ScoreParse(_)));
}

fn contents(messages: Vec<&Message>) -> Vec<&str> {
    messages.into_iter().map(|m| m.content.as_str()).collect()
}

fn advocate_roles(orch: &DebateOrchestrator, panel: Role) -> Vec<Role> {
    let memory = match panel {
        Role::Judge => orch.judge().memory(),
        _ => orch.scorer().memory(),
    };
    memory
        .iter()
        .map(|m| m.role)
        .filter(|role| role.is_advocate())
        .collect()
}

#[tokio::test]
async fn test_resume_after_generation_failure() {
    let client = Arc::new(ScriptedClient::new(["a1", "b1"]));
    client.push_error(GenerationError::Transport("connection reset".into()));
    for response in ["feedback", "(10, 12)"] {
        client.push_response(response);
    }
    let config = DebateConfig {
        round_count: 1,
        ..Default::default()
    };
    let mut orch = DebateOrchestrator::new(config, client.clone()).unwrap();

    let err = orch.run().await.unwrap_err();
    assert!(err.is_resumable());
    assert_eq!(orch.phase(), DebatePhase::Halted(1));

    let outcome = orch.run().await.unwrap();
    assert_eq!(orch.phase(), DebatePhase::Finished);
    assert_eq!(outcome.transcript.len(), 1);
    assert_eq!(outcome.transcript[0].advocate1, "a1");
    assert_eq!(outcome.transcript[0].feedback, "feedback");
    assert_eq!(outcome.score_ledger.len(), 1);

    // Resume picks up at the judge; the defenses are not asked for again.
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 5);
    assert!(prompts[3].contains("Give your feedback"));
    assert!(prompts[3].contains("Defense for 1st answer: a1"));
    assert!(prompts[3].contains("Defense for 2nd answer: b1"));
    assert!(outcome
        .transitions
        .iter()
        .any(|t| t.to == DebatePhase::Halted(1)));
}

#[tokio::test]
async fn test_resume_keeps_opponent_views_and_alternation() {
    let client = Arc::new(ScriptedClient::new(["a1"]));
    client.push_error(GenerationError::Transport("connection reset".into()));
    for response in ["b1", "feedback 1", "(15, 11)", "a2", "b2", "feedback 2", "(9, 14)"] {
        client.push_response(response);
    }
    let mut orch = DebateOrchestrator::new(two_round_config(), client.clone()).unwrap();

    assert!(orch.run().await.is_err());
    assert_eq!(orch.phase(), DebatePhase::Halted(1));
    let outcome = orch.run().await.unwrap();
    assert_eq!(outcome.score_ledger.len(), 2);

    // The failed Advocate2 turn is the one retried.
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 9);
    assert!(prompts[2].contains("defending this answer: No, no need for regulation"));
    assert!(prompts[2].contains("Opponent's last argument: a1"));

    assert_eq!(
        contents(orch.advocate2().memory().by_role(Role::OpponentOfAdvocate2)),
        vec!["a1", "a2"]
    );
    assert_eq!(
        contents(orch.advocate1().memory().by_role(Role::OpponentOfAdvocate1)),
        vec!["b1", "b2"]
    );

    let alternating = vec![
        Role::Advocate1,
        Role::Advocate2,
        Role::Advocate1,
        Role::Advocate2,
    ];
    assert_eq!(advocate_roles(&orch, Role::Judge), alternating);
    assert_eq!(advocate_roles(&orch, Role::Scorer), alternating);
}

#[tokio::test]
async fn test_resume_after_bad_score_asks_only_the_scorer() {
    let client = Arc::new(ScriptedClient::new([
        "a1",
        "b1",
        "feedback 1",
        "not a tuple",
        "(13, 8)",
        "a2",
        "b2",
        "feedback 2",
        "(10, 10)",
    ]));
    let mut orch = DebateOrchestrator::new(two_round_config(), client.clone()).unwrap();

    let err = orch.run().await.unwrap_err();
    assert!(matches!(err, DebateError::ScoreParse(_)));
    let outcome = orch.run().await.unwrap();
    assert_eq!(outcome.raw_scores(), vec!["(13, 8)", "(10, 10)"]);

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 9);
    assert!(prompts[4].contains("Your scores:"));
    assert!(prompts[4].contains("Last defense for 1st answer: a1"));
    assert!(prompts[4].contains("Last defense for 2nd answer: b1"));
    // Round 2 opens with round 1's single feedback message.
    assert!(prompts[5].contains("Latest feedback: feedback 1"));

    assert_eq!(orch.advocate1().memory().by_role(Role::Judge).len(), 2);
    assert_eq!(orch.advocate2().memory().by_role(Role::Judge).len(), 2);
    let scorer_roles: Vec<Role> = orch.scorer().memory().iter().map(|m| m.role).collect();
    assert_eq!(
        scorer_roles,
        vec![
            Role::Advocate1,
            Role::Advocate2,
            Role::Scorer,
            Role::Advocate1,
            Role::Advocate2,
            Role::Scorer,
        ]
    );
}

/// Never answers; used to hold a turn open until cancellation.
struct StalledClient;

#[async_trait]
impl LanguageModelClient for StalledClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_in_flight_turn() {
    let token = CancellationToken::new();
    let mut orch = DebateOrchestrator::new(two_round_config(), Arc::new(StalledClient))
        .unwrap()
        .with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();
    });

    let err = orch.run().await.unwrap_err();
    canceller.await.unwrap();
    assert!(matches!(err, DebateError::Cancelled { round: 1 }));
    assert_eq!(orch.phase(), DebatePhase::Halted(1));
    assert!(orch.advocate1().memory().by_role(Role::Advocate1).is_empty());
}

#[test]
fn test_zero_rounds_rejected() {
    let config = DebateConfig {
        round_count: 0,
        ..Default::default()
    };
    let result = DebateOrchestrator::new(config, Arc::new(ScriptedClient::default()));
    assert!(matches!(result, Err(DebateError::InvalidConfig(_))));
}

// ── Observer ───────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl DebateObserver for Recorder {
    fn on_debate_start(&self, config: &DebateConfig) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {}", config.round_count));
    }

    fn on_round_start(&self, round: u32) {
        self.events.lock().unwrap().push(format!("begin {round}"));
    }

    fn on_turn(&self, round: u32, message: &Message) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{round} {}", message.role));
    }

    fn on_round_complete(&self, record: &RoundRecord) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {} {}", record.round, record.scores));
    }
}

#[tokio::test]
async fn test_observer_sees_every_turn_in_order() {
    let recorder = Recorder::default();
    let events = recorder.events.clone();
    let mut orch = DebateOrchestrator::new(two_round_config(), Arc::new(two_round_script()))
        .unwrap()
        .with_observer(Box::new(recorder));
    orch.run().await.unwrap();

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 2",
            "begin 1",
            "1 Advocate1",
            "1 Advocate2",
            "1 Judge",
            "1 Scorer",
            "done 1 (18, 9)",
            "begin 2",
            "2 Advocate1",
            "2 Advocate2",
            "2 Judge",
            "2 Scorer",
            "done 2 (12, 15)",
        ]
    );
}

#[tokio::test]
async fn test_outcome_serializes_to_json() {
    let outcome = run_debate(two_round_config(), Arc::new(two_round_script()))
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["score_ledger"][0]["first"], 18);
    assert_eq!(json["transcript"][1]["raw_score"], "(12, 15)");
    assert_eq!(json["config"]["question"], "Should AI be regulated?");
}
