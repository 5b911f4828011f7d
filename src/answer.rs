//! Answering service abstraction
//!
//! The remote service takes a question and returns a single answer.

mod error;
mod http;
mod types;

pub use error::{AnswerError, AnswerErrorKind};
pub use http::HttpAnswerService;
pub use types::{AskRequest, AskResponse};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for answering services
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Ask a question and wait for the answer
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AnswerError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Logging wrapper for answering services
pub struct LoggingService {
    inner: Arc<dyn AnswerService>,
    name: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn AnswerService>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl AnswerService for LoggingService {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AnswerError> {
        let start = std::time::Instant::now();
        let result = self.inner.ask(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    service = %self.name,
                    correlation_id = %request.correlation_id,
                    duration_ms = %duration.as_millis(),
                    answer_len = response.answer.len(),
                    "Answer received"
                );
            }
            Err(e) => {
                tracing::warn!(
                    service = %self.name,
                    correlation_id = %request.correlation_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Answer request failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
