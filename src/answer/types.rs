//! Request and response types for the answering service

use crate::transcript::CorrelationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound question. Owned by the request task until it settles.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub correlation_id: CorrelationId,
    pub query_text: String,
    pub issued_at: DateTime<Utc>,
}

impl AskRequest {
    pub fn new(correlation_id: CorrelationId, query_text: String) -> Self {
        Self {
            correlation_id,
            query_text,
            issued_at: Utc::now(),
        }
    }

    pub fn wire_body(&self) -> AskBody<'_> {
        AskBody {
            question: &self.query_text,
        }
    }
}

/// JSON body sent to the service
#[derive(Debug, Serialize)]
pub struct AskBody<'a> {
    pub question: &'a str,
}

/// Validated answer from the service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

impl AskResponse {
    #[cfg(test)]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}
