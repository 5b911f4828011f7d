//! In-memory transcript store

use super::turn::{Author, CorrelationId, Turn, TurnId, TurnStatus};
use chrono::Utc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Turn not found: {0}")]
    NotFound(TurnId),
    #[error("Turn already settled: {0}")]
    AlreadySettled(TurnId),
    #[error("Cannot settle turn {0} to a non-terminal status")]
    NotTerminal(TurnId),
    #[error("Cannot reopen settled turn {0}")]
    Reopened(TurnId),
}

pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Ordered log of turns with an incrementally maintained pending counter.
///
/// Turns are only ever appended; ids are assigned from a counter that is
/// never rewound, so a position is stable for the lifetime of the store.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    turns: Vec<Turn>,
    next_id: u64,
    pending: usize,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end and return its id
    pub fn append(
        &mut self,
        author: Author,
        text: impl Into<String>,
        status: TurnStatus,
        correlation_id: Option<CorrelationId>,
    ) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        if status == TurnStatus::Pending {
            self.pending += 1;
        }
        self.turns.push(Turn {
            id,
            author,
            text: text.into(),
            status,
            correlation_id,
            created_at: Utc::now(),
        });
        id
    }

    /// Apply a mutation to a turn.
    ///
    /// The mutator works on a copy that is only committed if it does not move
    /// a settled turn back to pending; on error the turn is left untouched.
    pub fn update<F>(&mut self, id: TurnId, mutator: F) -> TranscriptResult<()>
    where
        F: FnOnce(&mut Turn),
    {
        let turn = self.find_mut(id)?;
        let mut next = turn.clone();
        mutator(&mut next);
        next.id = id;

        if turn.status.is_terminal() && !next.status.is_terminal() {
            return Err(TranscriptError::Reopened(id));
        }
        let settled = turn.is_pending() && !next.is_pending();
        *turn = next;

        if settled {
            self.pending -= 1;
        }
        Ok(())
    }

    /// Move a pending turn to a terminal status with its final text
    pub fn settle(
        &mut self,
        id: TurnId,
        status: TurnStatus,
        text: impl Into<String>,
    ) -> TranscriptResult<()> {
        if !status.is_terminal() {
            return Err(TranscriptError::NotTerminal(id));
        }
        if self.find_mut(id)?.status.is_terminal() {
            return Err(TranscriptError::AlreadySettled(id));
        }
        let text = text.into();
        self.update(id, |turn| {
            turn.status = status;
            turn.text = text;
        })
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.position(id).map(|idx| &self.turns[idx])
    }

    /// Owned, order-preserving copy of all turns
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Drop every turn. Ids keep counting from where they were.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.pending = 0;
    }

    /// Full-scan pending count, used to cross-check the maintained counter
    #[cfg(test)]
    pub fn recount_pending(&self) -> usize {
        self.turns.iter().filter(|t| t.is_pending()).count()
    }

    fn find_mut(&mut self, id: TurnId) -> TranscriptResult<&mut Turn> {
        let idx = self.position(id).ok_or(TranscriptError::NotFound(id))?;
        Ok(&mut self.turns[idx])
    }

    // Ids are strictly increasing in insertion order, so the log is sorted by id.
    fn position(&self, id: TurnId) -> Option<usize> {
        self.turns.binary_search_by_key(&id, |t| t.id).ok()
    }
}
