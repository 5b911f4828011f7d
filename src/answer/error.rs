//! Answering service error types

use thiserror::Error;

/// Answering service error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AnswerError {
    pub kind: AnswerErrorKind,
    pub message: String,
}

impl AnswerError {
    pub fn new(kind: AnswerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AnswerErrorKind::Transport, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(AnswerErrorKind::Status, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AnswerErrorKind::MalformedResponse, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AnswerErrorKind::Timeout, message)
    }
}

/// How a request to the answering service failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerErrorKind {
    /// Connection refused, reset, DNS, body read errors
    Transport,
    /// Non-2xx response
    Status,
    /// 2xx response whose body is not `{ "answer": string }`
    MalformedResponse,
    /// No response within the request bound
    Timeout,
}

impl AnswerErrorKind {
    pub fn is_timeout(self) -> bool {
        self == Self::Timeout
    }
}
