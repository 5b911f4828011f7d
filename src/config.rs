//! Client configuration from the environment

use std::time::Duration;

pub const DEFAULT_ANSWER_URL: &str = "http://localhost:8000/ask";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_EVENT_BUFFER: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint of the answering service
    pub answer_url: String,
    /// Bound on a single request before its turn is failed
    pub request_timeout: Duration,
    /// Capacity of the session event channel
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            answer_url: DEFAULT_ANSWER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let answer_url = lookup("CHAT_ANSWER_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.answer_url);

        let request_timeout = lookup("CHAT_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.request_timeout, Duration::from_secs);

        let event_buffer = lookup("CHAT_EVENT_BUFFER")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.event_buffer);

        Self {
            answer_url,
            request_timeout,
            event_buffer,
        }
    }
}
