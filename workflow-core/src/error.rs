//! Error types for the workflow API client.
//!
//! Every operation of the client contract returns [`ApiResult`]. The worker
//! never propagates these errors to its caller; it logs them and moves on.

use thiserror::Error;

/// Main error type for calls against the workflow API
#[derive(Debug, Error)]
pub enum WorkflowApiError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success status
    #[error("Status error: code={code}, message={message}")]
    Status { code: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl WorkflowApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Whether the error is a server-side failure (5xx) that an endpoint
    /// implementation may choose to retry
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { code, .. } if (500..600).contains(code))
    }
}

impl From<serde_json::Error> for WorkflowApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, WorkflowApiError>;
