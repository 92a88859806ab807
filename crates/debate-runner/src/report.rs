//! Console presentation: live transcript and final score table.

use arena::debate::{DebateObserver, RoundRecord};
use arena::{DebateConfig, DebateOutcome, Leader, Message};

/// Prints each turn to stdout as it happens.
pub struct ConsolePrinter;

impl DebateObserver for ConsolePrinter {
    fn on_debate_start(&self, config: &DebateConfig) {
        println!("{}", banner(config));
    }

    fn on_round_start(&self, round: u32) {
        println!("{}", round_header(round));
    }

    fn on_turn(&self, _round: u32, message: &Message) {
        println!("{}", format_turn(message));
    }

    fn on_round_complete(&self, _record: &RoundRecord) {
        println!();
    }
}

pub fn banner(config: &DebateConfig) -> String {
    format!(
        "Question: {}\nAdvocate1 defends: {}\nAdvocate2 defends: {}\nRounds: {}\n",
        config.question, config.answer_a, config.answer_b, config.round_count
    )
}

pub fn round_header(round: u32) -> String {
    format!("Round {round}:")
}

pub fn format_turn(message: &Message) -> String {
    format!("{}: {}", message.role, message.content)
}

/// `Final Scores:`, one `Round N: Advocate1 - a, Advocate2 - b` line per
/// round, then totals.
pub fn score_table(outcome: &DebateOutcome) -> String {
    let mut out = String::from("Final Scores:\n");
    for (i, pair) in outcome.score_ledger.iter().enumerate() {
        out.push_str(&format!(
            "Round {}: Advocate1 - {}, Advocate2 - {}\n",
            i + 1,
            pair.first,
            pair.second
        ));
    }
    let (a, b) = outcome.totals();
    let verdict = match outcome.leader() {
        Leader::Advocate1 => "Advocate1 leads",
        Leader::Advocate2 => "Advocate2 leads",
        Leader::Tie => "Tie",
    };
    out.push_str(&format!("Total: Advocate1 - {a}, Advocate2 - {b} ({verdict})\n"));
    out
}
