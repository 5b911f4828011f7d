//! Conversation transcript
//!
//! Ordered log of user and agent turns. Pure data, no I/O.

mod store;
mod turn;

#[cfg(test)]
mod proptests;

pub use store::{TranscriptError, TranscriptStore};
pub use turn::{Author, CorrelationId, Turn, TurnId, TurnStatus};
