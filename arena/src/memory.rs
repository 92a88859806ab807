//! Message model and per-agent append-only memory.
//!
//! Every agent owns exactly one [`AgentMemory`]. Messages move between agents
//! only by explicit copy (see `DebateOrchestrator`), never by sharing a log.

use serde::{Deserialize, Serialize};

/// Who a message is attributed to inside a particular memory.
///
/// The `OpponentOf*` variants exist only as relabel tags: an advocate's memory
/// stores its opponent's defenses under "opponent of me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Advocate1,
    Advocate2,
    OpponentOfAdvocate1,
    OpponentOfAdvocate2,
    Judge,
    Scorer,
    Human,
}

impl Role {
    /// The tag under which this advocate's defenses appear in its opponent's memory.
    ///
    /// Returns `None` for non-advocate roles.
    pub fn opponent_view(self) -> Option<Role> {
        match self {
            Self::Advocate1 => Some(Self::OpponentOfAdvocate2),
            Self::Advocate2 => Some(Self::OpponentOfAdvocate1),
            _ => None,
        }
    }

    /// The tag this advocate reads its opponent's defenses from.
    pub fn opponent_tag(self) -> Option<Role> {
        match self {
            Self::Advocate1 => Some(Self::OpponentOfAdvocate1),
            Self::Advocate2 => Some(Self::OpponentOfAdvocate2),
            _ => None,
        }
    }

    pub fn is_advocate(self) -> bool {
        matches!(self, Self::Advocate1 | Self::Advocate2)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Advocate1 => write!(f, "Advocate1"),
            Self::Advocate2 => write!(f, "Advocate2"),
            Self::OpponentOfAdvocate1 => write!(f, "Opponent of Advocate1"),
            Self::OpponentOfAdvocate2 => write!(f, "Opponent of Advocate2"),
            Self::Judge => write!(f, "Judge"),
            Self::Scorer => write!(f, "Scorer"),
            Self::Human => write!(f, "Human"),
        }
    }
}

/// The action that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// An advocate defense (also the cause tag of the seeded opening question).
    Defend,
    /// Judge feedback.
    Feedback,
    /// Scorer output.
    Score,
    /// Sentinel from a judge or scorer that had too little context to act.
    Wait,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defend => write!(f, "defend"),
            Self::Feedback => write!(f, "feedback"),
            Self::Score => write!(f, "score"),
            Self::Wait => write!(f, "wait"),
        }
    }
}

/// One agent output. Identity is its position in a memory, not an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub role: Role,
    pub cause: ActionKind,
}

impl Message {
    pub fn new(content: impl Into<String>, role: Role, cause: ActionKind) -> Self {
        Self {
            content: content.into(),
            role,
            cause,
        }
    }

    /// An independent copy attributed to `role`.
    pub fn relabeled(&self, role: Role) -> Self {
        Self {
            content: self.content.clone(),
            role,
            cause: self.cause,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.cause == ActionKind::Wait
    }
}

/// Append-only message log owned by a single agent.
///
/// Insertion order is arrival order; entries are never reordered or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMemory {
    entries: Vec<Message>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    /// All messages attributed to `role`, oldest first.
    pub fn by_role(&self, role: Role) -> Vec<&Message> {
        self.entries.iter().filter(|m| m.role == role).collect()
    }

    /// The most recent message attributed to `role`.
    pub fn last_by_role(&self, role: Role) -> Option<&Message> {
        self.entries.iter().rev().find(|m| m.role == role)
    }

    /// The `k` most recently appended messages regardless of role, oldest first.
    ///
    /// Returns fewer than `k` when the memory is shorter.
    pub fn last_k(&self, k: usize) -> &[Message] {
        let start = self.entries.len().saturating_sub(k);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }
}
