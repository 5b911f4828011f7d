//! Plain-text rendering of transcript state
//!
//! Stateless: everything here is a function of a snapshot.

use crate::transcript::{Author, Turn, TurnStatus};

pub fn format_turn(turn: &Turn) -> String {
    match (turn.author, turn.status) {
        (Author::User, _) => format!("you > {}", turn.text),
        (Author::Agent, TurnStatus::Pending) => "bot > ...".to_string(),
        (Author::Agent, TurnStatus::Complete) => format!("bot > {}", turn.text),
        (Author::Agent, TurnStatus::Failed) => format!("bot ! {}", turn.text),
    }
}

pub fn format_transcript(turns: &[Turn]) -> String {
    turns.iter().map(format_turn).collect::<Vec<_>>().join("\n")
}

/// Status line shown while answers are outstanding
pub fn format_pending(pending: usize) -> Option<String> {
    match pending {
        0 => None,
        1 => Some("(waiting for 1 answer)".to_string()),
        n => Some(format!("(waiting for {n} answers)")),
    }
}

pub fn snapshot_json(turns: &[Turn]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(turns)
}
