use std::time::Duration;
use thiserror::Error;

/// Offer/answer exchange failed. The session goes to FAILED; nothing retries
/// inside `start()`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalingError {
    #[error("signaling endpoint answered with status {0}")]
    Status(u16),

    #[error("signaling request timed out after {0:?}")]
    Timeout(Duration),

    #[error("signaling request failed: {0}")]
    Request(String),

    #[error("signaling answer is not usable: {0}")]
    InvalidAnswer(String),
}

/// Media transport failure, before or after the session connected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to create media transport: {0}")]
    Create(String),

    #[error("media negotiation failed: {0}")]
    Negotiation(String),

    #[error("media connection lost: {0}")]
    ConnectionLost(String),

    #[error("previous media session could not be released: {0}")]
    Teardown(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("media session is closed")]
    Closed,
}

impl MediaError {
    /// Text shown in place of the video surface.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Signaling(_) => {
                "Failed to connect to camera stream. Please refresh to try again."
            }
            Self::Transport(TransportError::ConnectionLost(_)) => {
                "Connection lost. Please refresh to try again."
            }
            Self::Transport(_) => "Failed to set up the video connection.",
            Self::Closed => "The stream viewer has been closed.",
        }
    }
}

/// Input rejected locally, before any network effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("message must be at most {max} characters")]
    MessageTooLong { max: usize },

    #[error("chat is not connected")]
    NotConnected,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("already joined as `{0}`")]
    AlreadyJoined(String),

    #[error("no username has been committed")]
    NotJoined,

    #[error("failed to send chat message: {0}")]
    Send(String),

    #[error("chat controller has stopped")]
    Stopped,
}
