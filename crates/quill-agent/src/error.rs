//! Error types for quill-agent

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using quill-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end an exchange with the backend
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the wire layer (transport, status, or body)
    #[error(transparent)]
    Api(#[from] quill_api::Error),

    /// The backend explicitly reported a failure in the reply body
    #[error("{0}")]
    ServerReported(String),

    /// No reply arrived within the configured request timeout
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl Error {
    /// Coarse classification shown to the user
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api(e) if e.is_protocol() => ErrorKind::Protocol,
            Error::Api(_) | Error::Timeout(_) => ErrorKind::Network,
            Error::ServerReported(_) => ErrorKind::ServerReported,
        }
    }

    /// Check if the backend rejected the session credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_unauthorized())
    }
}

/// Failure categories surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure, timeout, or non-success status
    Network,
    /// Reply body absent, unparsable, or missing required fields
    Protocol,
    /// Reply body carried an `error` field
    ServerReported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Protocol => "protocol",
            ErrorKind::ServerReported => "server",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The "last error" value, kept apart from the transcript so the UI can
/// show and dismiss it independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorReport {
    /// Text of the assistant turn recorded for a failed exchange
    pub fn marker(&self) -> String {
        format!("⚠️ {}. Please try again.", self.message)
    }
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
