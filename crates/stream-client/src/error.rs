//! Client error types and status translation

use crate::{signal::AbortReason, types::Operation};
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The stream is locked by another operation
    #[error("Stream locked{}", fmt_message(.message))]
    StreamLocked { message: Option<String> },

    /// The stream does not exist
    #[error("Stream not found{}", fmt_message(.message))]
    StreamNotFound { message: Option<String> },

    /// The server answered with a status this client does not interpret
    #[error("Unexpected status {status}{}", fmt_message(.message))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The call's cancellation signal fired
    #[error("Request aborted: {0}")]
    Aborted(AbortReason),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server or transport broke the protocol contract.
    ///
    /// This is not a recoverable failure mode: it means a successful response
    /// was malformed in a way the service never produces.
    #[error("Contract violation: {0}")]
    Contract(String),
}

impl ClientError {
    /// Check if this is a "stream locked" error
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::StreamLocked { .. })
    }

    /// Check if this is a "stream not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StreamNotFound { .. })
    }

    /// Check if the call was aborted, for any reason
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Check if the call was aborted by its timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Aborted(AbortReason::Timeout))
            || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::StreamLocked { .. } => Some(StatusCode::CONFLICT),
            Self::StreamNotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

fn fmt_message(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

/// Map a transport outcome onto the domain errors of `operation`.
///
/// 409 always becomes [`ClientError::StreamLocked`]. 404 becomes
/// [`ClientError::StreamNotFound`] for writes and reads only. Everything else,
/// success included, is returned as is.
pub fn translate<T>(outcome: Result<T>, operation: Operation) -> Result<T> {
    outcome.map_err(|err| match err {
        ClientError::Status { status, message } => match status {
            StatusCode::CONFLICT => ClientError::StreamLocked { message },
            StatusCode::NOT_FOUND if operation.maps_not_found() => {
                ClientError::StreamNotFound { message }
            }
            _ => ClientError::Status { status, message },
        },
        other => other,
    })
}
