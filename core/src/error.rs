//! Error types for the books API client.
//!
//! # Design
//! Two failures matter to the user: the server answered with a non-2xx
//! status (`Status`), or no answer arrived at all (`Transport`). Both are
//! surfaced the same way; the split exists for logging and for hosts that
//! want to tell them apart. Encoding and decoding failures get their own
//! variants so the list body that failed to parse is not mistaken for a
//! server error.

use thiserror::Error;

/// Errors produced while building requests, executing them, or parsing
/// responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A response arrived but its status was outside 2xx.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request failed before any response arrived.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}
