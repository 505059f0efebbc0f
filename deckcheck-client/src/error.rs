//! Error types for the analysis client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the analysis server
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request could not be completed (connection refused, timeout, ...)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("API error (status {status}): {}", .message.as_deref().unwrap_or("no error message"))]
    Api {
        /// HTTP status code
        status: u16,
        /// The `error` field of the response body, if the body carried one
        message: Option<String>,
    },

    /// The response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The request could not be built from the given input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and optional server message
    pub fn api_error(status: u16, message: Option<String>) -> Self {
        Self::Api { status, message }
    }

    /// Check if the request never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Message reported by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
