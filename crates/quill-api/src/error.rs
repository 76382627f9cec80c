//! Error types for quill-api

use thiserror::Error;

/// Result type alias using quill-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the proposal backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connection refused, reset, timed out, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Server error: {status}")]
    Status { status: u16, body: String },

    /// Response body could not be parsed
    #[error("Failed to parse server response: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body was blank or JSON `null`
    #[error("Empty response from server")]
    EmptyResponse,

    /// Response parsed but lacks the fields the exchange requires
    #[error("{0}")]
    MalformedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Check if this error means the exchange completed but its body broke the contract
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Error::Json(_) | Error::EmptyResponse | Error::MalformedResponse(_)
        )
    }

    /// Check if the backend rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Status { status, .. } => *status == 401,
            Error::Http(e) => e.status().is_some_and(|s| s.as_u16() == 401),
            _ => false,
        }
    }
}
