/*
[INPUT]:  Error sources (HTTP, API, serialization, WebSocket, hub protocol)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Taskdesk adapter
#[derive(Error, Debug)]
pub enum TaskdeskError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The requested resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Notification hub sent something we could not understand
    #[error("Hub protocol error: {0}")]
    Protocol(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request timed out
    #[error("Request timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl TaskdeskError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TaskdeskError::Http(_) | TaskdeskError::Timeout { .. } | TaskdeskError::WebSocket(_) => {
                true
            }
            TaskdeskError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskdeskError::NotFound(_))
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        TaskdeskError::Api {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Result type alias for Taskdesk operations
pub type Result<T> = std::result::Result<T, TaskdeskError>;
