//! Events broadcast to the presentation layer

use crate::transcript::Turn;

/// Transcript changes, in the order they were applied
#[derive(Debug, Clone)]
pub enum SessionEvent {
    TurnAppended(Turn),
    /// An agent turn reached a terminal status
    TurnSettled(Turn),
    Reset,
}
