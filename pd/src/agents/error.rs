//! Agent gateway error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while invoking a specialist agent
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent call timed out after {0:?}")]
    Timeout(Duration),

    #[error("agent API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid agent response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Whether a fresh attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Timeout(_) => false,
            AgentError::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            AgentError::Network(_) => true,
            AgentError::InvalidResponse(_) => false,
            AgentError::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(
            AgentError::Api {
                status: 503,
                message: "overloaded".to_string()
            }
            .is_retryable()
        );
        assert!(
            AgentError::Api {
                status: 429,
                message: "rate limited".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(
            !AgentError::Api {
                status: 400,
                message: "bad request".to_string()
            }
            .is_retryable()
        );
        assert!(!AgentError::InvalidResponse("garbage".to_string()).is_retryable());
        assert!(!AgentError::Timeout(Duration::from_secs(30)).is_retryable());
    }
}
