use thiserror::Error;

use crate::registry::ConnectionId;

/// Invariant violations in the call table. Logged locally, never sent to clients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("connection {0} is already in a call")]
    AlreadyInCall(ConnectionId),

    #[error("connection {0} cannot be paired with itself")]
    SelfPairing(ConnectionId),
}

/// Boundary errors reported back to the originating connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("message could not be parsed")]
    Malformed,

    #[error("connection is already in a call")]
    AlreadyInCall,

    #[error("identity token rejected")]
    InvalidToken,

    #[error("identity verification is not configured")]
    IdentityUnavailable,

    #[error("no identified partner to rate")]
    FeedbackUnavailable,
}

impl ClientError {
    /// Stable code put on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Malformed => "MALFORMED_MESSAGE",
            ClientError::AlreadyInCall => "ALREADY_IN_CALL",
            ClientError::InvalidToken => "INVALID_TOKEN",
            ClientError::IdentityUnavailable => "IDENTITY_UNAVAILABLE",
            ClientError::FeedbackUnavailable => "FEEDBACK_UNAVAILABLE",
        }
    }
}
