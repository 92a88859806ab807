//! Score pairs, the per-debate score ledger, and strict parsing of scorer output.
//!
//! The scorer is the one place free-form model text becomes structured data.
//! Its output must match `(a, b)` exactly, with both values integers in
//! `[1, 20]`. Anything else is rejected; there is no fallback pair.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest score a side can receive.
pub const MIN_SCORE: u8 = 1;
/// Highest score a side can receive.
pub const MAX_SCORE: u8 = 20;

static SCORE_TUPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\(\s*(\d{1,2})\s*,\s*(\d{1,2})\s*\)\s*$").expect("score pattern is valid")
});

/// Scorer output that could not be turned into a valid pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreParseError {
    #[error("scorer output is not a `(a, b)` tuple: {raw:?}")]
    Malformed { raw: String },
    #[error("score {value} outside [1, 20] in {raw:?}")]
    OutOfRange { value: u8, raw: String },
}

/// One round's scores: `first` for Advocate1, `second` for Advocate2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScorePair {
    pub first: u8,
    pub second: u8,
}

impl ScorePair {
    /// Build a pair, validating both values are in range.
    pub fn new(first: u8, second: u8) -> Result<Self, ScoreParseError> {
        for value in [first, second] {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(ScoreParseError::OutOfRange {
                    value,
                    raw: format!("({first}, {second})"),
                });
            }
        }
        Ok(Self { first, second })
    }

    /// Absolute difference between the two sides.
    pub fn margin(&self) -> u8 {
        self.first.abs_diff(self.second)
    }
}

impl std::fmt::Display for ScorePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Parse scorer output into a [`ScorePair`].
///
/// Grammar: optional whitespace, `(`, 1-2 digits, `,`, 1-2 digits, `)`,
/// optional whitespace. `18, 9` without parentheses is rejected.
pub fn parse_score_pair(raw: &str) -> Result<ScorePair, ScoreParseError> {
    let malformed = || ScoreParseError::Malformed {
        raw: raw.to_string(),
    };
    let caps = SCORE_TUPLE.captures(raw).ok_or_else(malformed)?;
    let first: u8 = caps[1].parse().map_err(|_| malformed())?;
    let second: u8 = caps[2].parse().map_err(|_| malformed())?;

    for value in [first, second] {
        if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(ScoreParseError::OutOfRange {
                value,
                raw: raw.to_string(),
            });
        }
    }
    Ok(ScorePair { first, second })
}

/// Which side leads on accumulated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leader {
    Advocate1,
    Advocate2,
    Tie,
}

/// Append-only sequence of per-round score pairs for one debate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreLedger {
    rounds: Vec<ScorePair>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: ScorePair) {
        self.rounds.push(pair);
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn last(&self) -> Option<&ScorePair> {
        self.rounds.last()
    }

    pub fn as_slice(&self) -> &[ScorePair] {
        &self.rounds
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScorePair> {
        self.rounds.iter()
    }

    /// Summed scores `(advocate1, advocate2)` across all rounds.
    pub fn totals(&self) -> (u32, u32) {
        self.rounds.iter().fold((0, 0), |(a, b), p| {
            (a + u32::from(p.first), b + u32::from(p.second))
        })
    }

    pub fn leader(&self) -> Leader {
        let (a, b) = self.totals();
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Leader::Advocate1,
            std::cmp::Ordering::Less => Leader::Advocate2,
            std::cmp::Ordering::Equal => Leader::Tie,
        }
    }

    /// Prompt rendering: `[(18, 9), (12, 15)]`, or `[]` when empty.
    pub fn render(&self) -> String {
        let pairs: Vec<String> = self.rounds.iter().map(ToString::to_string).collect();
        format!("[{}]", pairs.join(", "))
    }
}
