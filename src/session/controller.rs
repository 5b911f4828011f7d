//! Submission pipeline
//!
//! `submit` places both turns in the transcript before anything is awaited,
//! so the transcript order is fixed by submission order no matter when the
//! replies arrive. Each request is keyed by a correlation id; the first
//! settlement for an id wins and every later one is dropped.

use super::event::SessionEvent;
use crate::answer::{AnswerError, AnswerService, AskRequest, AskResponse};
use crate::transcript::{Author, CorrelationId, TranscriptStore, Turn, TurnId, TurnStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Text shown on an agent turn whose request failed or timed out
pub const FAILURE_MARKER: &str = "There was an error processing your request.";
/// Text shown on an agent turn the user cancelled
pub const CANCELLED_MARKER: &str = "Request cancelled.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Nothing to send")]
    EmptyInput,
}

/// What `reconcile` did with a settled request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Applied(TurnId),
    /// The correlation id was already settled, cancelled or reset away
    Duplicate,
    /// The correlation id pointed at a turn the transcript cannot settle
    InvariantViolation(TurnId),
}

/// Returned by `submit`; identifies the turns it created
#[derive(Debug)]
pub struct SubmissionHandle {
    pub user_turn: TurnId,
    pub agent_turn: TurnId,
    pub correlation_id: CorrelationId,
    task: JoinHandle<()>,
}

impl SubmissionHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the request task has finished
    pub async fn settled(self) {
        if let Err(e) = self.task.await {
            tracing::error!(
                correlation_id = %self.correlation_id,
                error = %e,
                "Request task aborted"
            );
        }
    }
}

struct InFlight {
    turn_id: TurnId,
    cancel: CancellationToken,
    issued_at: DateTime<Utc>,
}

/// Everything that must change together lives behind one lock
#[derive(Default)]
struct SessionState {
    transcript: TranscriptStore,
    in_flight: HashMap<CorrelationId, InFlight>,
}

struct Shared {
    state: Mutex<SessionState>,
    service: Arc<dyn AnswerService>,
    request_timeout: Duration,
    events: broadcast::Sender<SessionEvent>,
}

/// Handle to a conversation session. Cheap to clone.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(
        service: Arc<dyn AnswerService>,
        request_timeout: Duration,
        event_buffer: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                service,
                request_timeout,
                events,
            }),
        }
    }

    /// Submit user text. Must be called from within a tokio runtime.
    ///
    /// Blank input is rejected without touching the transcript. Anything
    /// else is stored and sent exactly as typed.
    pub fn submit(&self, text: &str) -> Result<SubmissionHandle, SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        // The request owns its own copy of the text from here on.
        let correlation_id = CorrelationId::new();
        let request = AskRequest::new(correlation_id, text.to_string());
        let cancel = CancellationToken::new();

        let (user_turn, agent_turn) = {
            let mut state = self.lock();
            let user_turn = state
                .transcript
                .append(Author::User, text, TurnStatus::Complete, None);
            let agent_turn = state.transcript.append(
                Author::Agent,
                String::new(),
                TurnStatus::Pending,
                Some(correlation_id),
            );
            state.in_flight.insert(
                correlation_id,
                InFlight {
                    turn_id: agent_turn,
                    cancel: cancel.clone(),
                    issued_at: request.issued_at,
                },
            );
            self.emit_appended(&state, user_turn);
            self.emit_appended(&state, agent_turn);
            (user_turn, agent_turn)
        };

        tracing::debug!(%correlation_id, %agent_turn, "Submitted question");

        let task = tokio::spawn(self.clone().run_request(request, cancel));

        Ok(SubmissionHandle {
            user_turn,
            agent_turn,
            correlation_id,
            task,
        })
    }

    async fn run_request(self, request: AskRequest, cancel: CancellationToken) {
        let request_timeout = self.shared.request_timeout;
        let outcome = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(correlation_id = %request.correlation_id, "Request detached");
                return;
            }
            result = tokio::time::timeout(request_timeout, self.shared.service.ask(&request)) => {
                result.unwrap_or_else(|_| {
                    Err(AnswerError::timeout(format!(
                        "No answer within {}ms",
                        request_timeout.as_millis()
                    )))
                })
            }
        };

        match self.reconcile(request.correlation_id, outcome) {
            Reconciliation::Applied(turn_id) | Reconciliation::InvariantViolation(turn_id) => {
                tracing::trace!(
                    correlation_id = %request.correlation_id,
                    %turn_id,
                    "Request finished"
                );
            }
            Reconciliation::Duplicate => {}
        }
    }

    /// Apply a settled request to its agent turn.
    ///
    /// Only the first call for a correlation id has any effect.
    pub fn reconcile(
        &self,
        correlation_id: CorrelationId,
        outcome: Result<AskResponse, AnswerError>,
    ) -> Reconciliation {
        let mut state = self.lock();
        let Some(in_flight) = state.in_flight.remove(&correlation_id) else {
            tracing::debug!(%correlation_id, "Ignoring result for settled request");
            return Reconciliation::Duplicate;
        };

        let (status, text) = match outcome {
            Ok(response) => (TurnStatus::Complete, response.answer),
            Err(e) => {
                tracing::warn!(
                    %correlation_id,
                    turn_id = %in_flight.turn_id,
                    kind = ?e.kind,
                    timeout = e.kind.is_timeout(),
                    error = %e.message,
                    "Question failed"
                );
                (TurnStatus::Failed, FAILURE_MARKER.to_string())
            }
        };

        self.settle_locked(&mut state, correlation_id, &in_flight, status, text)
    }

    /// Fail a pending request with the cancellation marker and detach from
    /// its network result. Returns false if it had already settled.
    pub fn cancel(&self, correlation_id: CorrelationId) -> bool {
        let mut state = self.lock();
        let Some(in_flight) = state.in_flight.remove(&correlation_id) else {
            return false;
        };
        in_flight.cancel.cancel();
        tracing::info!(%correlation_id, turn_id = %in_flight.turn_id, "Request cancelled");

        matches!(
            self.settle_locked(
                &mut state,
                correlation_id,
                &in_flight,
                TurnStatus::Failed,
                CANCELLED_MARKER.to_string(),
            ),
            Reconciliation::Applied(_)
        )
    }

    /// Cancel the most recently submitted request that is still pending
    pub fn cancel_latest(&self) -> Option<CorrelationId> {
        let latest = self
            .lock()
            .in_flight
            .iter()
            .max_by_key(|(_, f)| f.turn_id)
            .map(|(id, _)| *id)?;
        self.cancel(latest).then_some(latest)
    }

    /// Clear the transcript and detach every in-flight request
    pub fn reset(&self) {
        let mut state = self.lock();
        let detached = state.in_flight.len();
        for (_, in_flight) in state.in_flight.drain() {
            in_flight.cancel.cancel();
        }
        state.transcript.clear();
        let _ = self.shared.events.send(SessionEvent::Reset);
        tracing::info!(detached, "Session reset");
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.lock().transcript.snapshot()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().transcript.pending_count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    fn settle_locked(
        &self,
        state: &mut SessionState,
        correlation_id: CorrelationId,
        in_flight: &InFlight,
        status: TurnStatus,
        text: String,
    ) -> Reconciliation {
        let turn_id = in_flight.turn_id;

        if let Err(e) = state.transcript.settle(turn_id, status, text) {
            tracing::error!(
                %correlation_id,
                %turn_id,
                error = %e,
                "Transcript invariant violated during reconciliation"
            );
            // Never leave a turn pending without a request behind it.
            let _ = state.transcript.update(turn_id, |turn| {
                if turn.is_pending() {
                    turn.status = TurnStatus::Failed;
                    turn.text = FAILURE_MARKER.to_string();
                }
            });
            return Reconciliation::InvariantViolation(turn_id);
        }

        let elapsed_ms = (Utc::now() - in_flight.issued_at).num_milliseconds();
        tracing::info!(%correlation_id, %turn_id, ?status, elapsed_ms, "Turn settled");

        if let Some(turn) = state.transcript.get(turn_id) {
            let _ = self.shared.events.send(SessionEvent::TurnSettled(turn.clone()));
        }
        Reconciliation::Applied(turn_id)
    }

    fn emit_appended(&self, state: &SessionState, turn_id: TurnId) {
        if let Some(turn) = state.transcript.get(turn_id) {
            let _ = self.shared.events.send(SessionEvent::TurnAppended(turn.clone()));
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
