//! Mock answering services for testing
//!
//! These mocks let tests control when and how each question settles.

use crate::answer::{AnswerError, AnswerService, AskRequest, AskResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

pub type Reply = Result<AskResponse, AnswerError>;

// ============================================================================
// Scripted Answer Service
// ============================================================================

/// How the scripted service reacts to a question
#[derive(Debug, Clone)]
pub enum Script {
    Answer(String),
    Fail(AnswerError),
    /// Never settles; only a timeout or cancellation ends the request
    Hang,
}

impl Script {
    pub fn answer(text: impl Into<String>) -> Self {
        Script::Answer(text.into())
    }
}

/// Answers immediately from a fixed question -> script table
pub struct ScriptedAnswerService {
    scripts: HashMap<String, Script>,
    /// Record of all requests made
    pub requests: Mutex<Vec<AskRequest>>,
}

impl ScriptedAnswerService {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, question: &str, script: Script) -> Self {
        self.scripts.insert(question.to_string(), script);
        self
    }

    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedAnswerService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerService for ScriptedAnswerService {
    async fn ask(&self, request: &AskRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        match self.scripts.get(&request.query_text) {
            Some(Script::Answer(text)) => Ok(AskResponse::new(text.clone())),
            Some(Script::Fail(error)) => Err(error.clone()),
            Some(Script::Hang) => std::future::pending().await,
            None => Err(AnswerError::transport("No scripted reply")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Gated Answer Service (for ordering tests)
// ============================================================================

/// Each question waits until the test sends its reply through a gate.
///
/// Gates must be opened before the question is submitted.
pub struct GatedAnswerService {
    gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<AskRequest>>,
}

impl GatedAnswerService {
    pub fn new() -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Register a gate for `question` and return the sender that releases it
    pub fn gate(&self, question: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(question.to_string(), rx);
        tx
    }

    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for GatedAnswerService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerService for GatedAnswerService {
    async fn ask(&self, request: &AskRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.gates.lock().unwrap().remove(&request.query_text);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(AnswerError::transport("Gate dropped"))),
            None => Err(AnswerError::transport("No gate for question")),
        }
    }

    fn name(&self) -> &str {
        "gated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerErrorKind;
    use crate::transcript::CorrelationId;

    fn request(question: &str) -> AskRequest {
        AskRequest::new(CorrelationId::new(), question.to_string())
    }

    #[tokio::test]
    async fn test_scripted_service() {
        let service = ScriptedAnswerService::new()
            .with("hours", Script::answer("9-5"))
            .with("broken", Script::Fail(AnswerError::status("HTTP 500")));

        assert_eq!(service.ask(&request("hours")).await.unwrap().answer, "9-5");
        assert_eq!(
            service.ask(&request("broken")).await.unwrap_err().kind,
            AnswerErrorKind::Status
        );
        assert!(service.ask(&request("other")).await.is_err());
        assert_eq!(service.recorded_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_gated_service_waits_for_release() {
        let service = std::sync::Arc::new(GatedAnswerService::new());
        let gate = service.gate("q");

        let svc = service.clone();
        let pending = tokio::spawn(async move { svc.ask(&request("q")).await });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.send(Ok(AskResponse::new("a"))).unwrap();
        assert_eq!(pending.await.unwrap().unwrap().answer, "a");
    }
}
