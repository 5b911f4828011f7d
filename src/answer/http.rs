//! HTTP answering service
//!
//! `POST { "question": ... }` to a single endpoint and expect
//! `{ "answer": ... }` back. The client keeps a cookie store so the server's
//! session cookie rides along on every later request.

use super::types::{AskRequest, AskResponse};
use super::{AnswerError, AnswerService};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpAnswerService {
    client: Client,
    url: String,
}

impl HttpAnswerService {
    pub fn new(url: impl Into<String>) -> Result<Self, AnswerError> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AnswerError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Validate a raw response at the boundary
fn parse_response(status: StatusCode, body: &str) -> Result<AskResponse, AnswerError> {
    if !status.is_success() {
        tracing::debug!(%status, body = %body, "Answering service returned error status");
        return Err(AnswerError::status(format!("HTTP {status}")));
    }

    serde_json::from_str::<AskResponse>(body)
        .map_err(|e| AnswerError::malformed(format!("Unexpected response body: {e}")))
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AnswerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&request.wire_body())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnswerError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AnswerError::transport(format!("Connection failed: {e}"))
                } else {
                    AnswerError::transport(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnswerError::transport(format!("Failed to read response: {e}")))?;

        parse_response(status, &body)
    }

    fn name(&self) -> &str {
        "http"
    }
}
