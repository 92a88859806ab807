//! Debate participants: two advocates, a judge, and a scorer.
//!
//! Every participant implements [`Agent`]. An agent only ever reads its own
//! memory; inbound messages arrive through [`Agent::receive`] as copies the
//! orchestrator routed to it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::DebateError;
use crate::llm::LanguageModelClient;
use crate::memory::{ActionKind, AgentMemory, Message, Role};
use crate::prompts::{DefensePrompt, RoundPrompt, Template};
use crate::score::{parse_score_pair, ScoreLedger};

use super::orchestrator::DebateConfig;

/// Content of the sentinel returned when a judge or scorer has nothing to evaluate.
pub const WAITING_CONTENT: &str = "Waiting for more arguments.";

/// Round context handed to every turn. Advocates ignore it.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// 1-indexed round being played.
    pub current_round: u32,
    pub total_rounds: u32,
    /// Scores of every round completed before this one.
    pub previous_scores: &'a ScoreLedger,
}

/// A debate participant that produces one message per turn.
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> Role;

    fn memory(&self) -> &AgentMemory;

    /// Append a message routed to this agent.
    fn receive(&mut self, message: Message);

    /// Take one turn.
    ///
    /// # Errors
    ///
    /// Template and generation failures propagate unchanged; there are no
    /// retries at this layer.
    async fn produce_turn(&mut self, ctx: &TurnContext<'_>) -> Result<Message, DebateError>;
}

/// Argues for one answer against the other.
pub struct Advocate {
    role: Role,
    config: Arc<DebateConfig>,
    client: Arc<dyn LanguageModelClient>,
    memory: AgentMemory,
}

impl Advocate {
    /// Advocate1, defending `answer_a`.
    pub fn first(config: Arc<DebateConfig>, client: Arc<dyn LanguageModelClient>) -> Self {
        Self::with_role(Role::Advocate1, config, client)
    }

    /// Advocate2, defending `answer_b`.
    pub fn second(config: Arc<DebateConfig>, client: Arc<dyn LanguageModelClient>) -> Self {
        Self::with_role(Role::Advocate2, config, client)
    }

    fn with_role(
        role: Role,
        config: Arc<DebateConfig>,
        client: Arc<dyn LanguageModelClient>,
    ) -> Self {
        Self {
            role,
            config,
            client,
            memory: AgentMemory::new(),
        }
    }

    /// The answer this advocate defends.
    pub fn answer(&self) -> &str {
        match self.role {
            Role::Advocate2 => &self.config.answer_b,
            _ => &self.config.answer_a,
        }
    }

    pub fn opponent_answer(&self) -> &str {
        match self.role {
            Role::Advocate2 => &self.config.answer_a,
            _ => &self.config.answer_b,
        }
    }

    /// The opponent's latest defense as seen from this memory, or `""`.
    fn opponent_argument(&self) -> &str {
        self.role
            .opponent_tag()
            .and_then(|tag| self.memory.last_by_role(tag))
            .map_or("", |m| m.content.as_str())
    }

    fn latest_feedback(&self) -> &str {
        self.memory
            .last_by_role(Role::Judge)
            .map_or("", |m| m.content.as_str())
    }
}

#[async_trait]
impl Agent for Advocate {
    fn role(&self) -> Role {
        self.role
    }

    fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    fn receive(&mut self, message: Message) {
        self.memory.append(message);
    }

    async fn produce_turn(&mut self, _ctx: &TurnContext<'_>) -> Result<Message, DebateError> {
        info!(role = %self.role, "Preparing argument");
        let prompt = DefensePrompt {
            question: &self.config.question,
            answer: self.answer(),
            opponent_answer: self.opponent_answer(),
            opponent_argument: self.opponent_argument(),
            feedback: self.latest_feedback(),
        }
        .render()?;
        debug!(role = %self.role, prompt_chars = prompt.len(), "Defense prompt rendered");

        let defense = self.client.generate(&prompt).await?;
        let message = Message::new(defense, self.role, ActionKind::Defend);
        self.memory.append(message.clone());
        Ok(message)
    }
}

/// Shared body of the judge and the scorer: both read the two most recent
/// entries of their memory as `(defense1, defense2)` and render a round prompt.
struct Panelist {
    role: Role,
    template: Template,
    cause: ActionKind,
    config: Arc<DebateConfig>,
    client: Arc<dyn LanguageModelClient>,
    memory: AgentMemory,
}

impl Panelist {
    fn new(
        role: Role,
        template: Template,
        cause: ActionKind,
        config: Arc<DebateConfig>,
        client: Arc<dyn LanguageModelClient>,
    ) -> Self {
        Self {
            role,
            template,
            cause,
            config,
            client,
            memory: AgentMemory::new(),
        }
    }

    /// Precondition: the last two entries are Advocate1's then Advocate2's
    /// defense for the current round. The orchestrator establishes this by
    /// appending both immediately before invoking the panelist.
    ///
    /// `accept` vets the model's text; rejected text is returned as an error
    /// and never enters memory.
    async fn evaluate<F>(
        &mut self,
        ctx: &TurnContext<'_>,
        accept: F,
    ) -> Result<Message, DebateError>
    where
        F: FnOnce(&str) -> Result<(), DebateError> + Send,
    {
        let latest = self.memory.last_k(2);
        let [first, second] = latest else {
            debug!(role = %self.role, entries = latest.len(), "Not enough arguments yet");
            return Ok(Message::new(WAITING_CONTENT, self.role, ActionKind::Wait));
        };

        let prompt = RoundPrompt {
            question: &self.config.question,
            answer1: &self.config.answer_a,
            answer2: &self.config.answer_b,
            defense1: &first.content,
            defense2: &second.content,
            current_round: ctx.current_round,
            total_rounds: ctx.total_rounds,
            previous_scores: ctx.previous_scores,
        }
        .render(self.template)?;
        debug!(
            role = %self.role,
            template = %self.template,
            prompt_chars = prompt.len(),
            "Round prompt rendered"
        );

        let content = self.client.generate(&prompt).await?;
        accept(&content)?;
        let message = Message::new(content, self.role, self.cause);
        self.memory.append(message.clone());
        Ok(message)
    }
}

/// Gives both advocates feedback after each pair of defenses.
pub struct Judge(Panelist);

impl Judge {
    pub fn new(config: Arc<DebateConfig>, client: Arc<dyn LanguageModelClient>) -> Self {
        Self(Panelist::new(
            Role::Judge,
            Template::Feedback,
            ActionKind::Feedback,
            config,
            client,
        ))
    }
}

#[async_trait]
impl Agent for Judge {
    fn role(&self) -> Role {
        self.0.role
    }

    fn memory(&self) -> &AgentMemory {
        &self.0.memory
    }

    fn receive(&mut self, message: Message) {
        self.0.memory.append(message);
    }

    async fn produce_turn(&mut self, ctx: &TurnContext<'_>) -> Result<Message, DebateError> {
        info!(round = ctx.current_round, "Judge: Evaluating arguments");
        self.0.evaluate(ctx, |_| Ok(())).await
    }
}

/// Scores both defenses each round.
///
/// Output that is not a valid score pair fails the turn and is not remembered.
/// The orchestrator parses the accepted text again before touching the ledger.
pub struct Scorer(Panelist);

impl Scorer {
    pub fn new(config: Arc<DebateConfig>, client: Arc<dyn LanguageModelClient>) -> Self {
        Self(Panelist::new(
            Role::Scorer,
            Template::Scoring,
            ActionKind::Score,
            config,
            client,
        ))
    }
}

#[async_trait]
impl Agent for Scorer {
    fn role(&self) -> Role {
        self.0.role
    }

    fn memory(&self) -> &AgentMemory {
        &self.0.memory
    }

    fn receive(&mut self, message: Message) {
        self.0.memory.append(message);
    }

    async fn produce_turn(&mut self, ctx: &TurnContext<'_>) -> Result<Message, DebateError> {
        info!(round = ctx.current_round, "Scorer: Scoring arguments");
        self.0
            .evaluate(ctx, |raw| {
                parse_score_pair(raw)?;
                Ok(())
            })
            .await
    }
}
