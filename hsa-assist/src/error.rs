//! Error types for hsa-assist
//!
//! Remote-call failures fall into exactly one of five classes
//! (rejected, unavailable, transport, configuration, invalid response).
//! Local pre-flight checks fail with [`ValidationFailure`] and never reach
//! the network.

use thiserror::Error;

use crate::review::DraftError;

/// Pre-flight check failures; they block dispatch entirely
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("{0} must not be empty")]
    EmptyIdentity(&'static str),

    #[error("Message has neither text nor attachments")]
    EmptyMessage,

    #[error("{file}: unsupported file type {mime_type} (images and PDF only)")]
    UnsupportedMediaType { file: String, mime_type: String },

    #[error("{file}: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { file: String, size: u64, limit: u64 },

    #[error("{file}: {reason}")]
    Unreadable { file: String, reason: String },
}

/// Errors surfaced to callers of the assistant
#[derive(Debug, Error)]
pub enum AssistError {
    /// Service answered with a 4xx status
    #[error("Request rejected ({status}): {reason}")]
    RequestRejected { status: u16, reason: &'static str },

    /// Service answered with a 5xx (or otherwise unusable) status
    #[error("Service unavailable ({status}), please try again later")]
    ServiceUnavailable { status: u16 },

    /// No reply: connection, DNS or timeout
    #[error("Network error, please check your network connection: {0}")]
    TransportFailure(String),

    /// Request could not be built locally
    #[error("Request configuration error: {0}")]
    RequestConfiguration(String),

    /// Reply arrived but does not match the contract
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("No receipt is under review")]
    NoActiveDraft,

    #[error("Storage error: {0}")]
    Storage(#[from] hsa_common::Error),
}

impl AssistError {
    /// Map a non-success HTTP status to its error class
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => AssistError::RequestRejected {
                status,
                reason: rejection_reason(status),
            },
            _ => AssistError::ServiceUnavailable { status },
        }
    }

    /// Whether this failure came from the remote call path
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AssistError::RequestRejected { .. }
                | AssistError::ServiceUnavailable { .. }
                | AssistError::TransportFailure(_)
                | AssistError::RequestConfiguration(_)
                | AssistError::InvalidResponse(_)
        )
    }
}

fn rejection_reason(status: u16) -> &'static str {
    match status {
        400 => "malformed input",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not found",
        _ => "request rejected",
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            AssistError::RequestConfiguration(err.to_string())
        } else if err.is_decode() {
            AssistError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            AssistError::from_status(status.as_u16())
        } else {
            AssistError::TransportFailure(err.to_string())
        }
    }
}

/// Result type for assistant operations
pub type AssistResult<T> = Result<T, AssistError>;
