use crate::error::ValidationError;
use birbcast_core::ChatEvent;
use std::fmt;
use std::sync::Arc;

pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_MESSAGE_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Published on every chat change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub username: Option<String>,
    pub state: SocketState,
    pub events: Arc<Vec<ChatEvent>>,
    pub error: Option<String>,
    pub malformed_frames: u64,
}

/// Raised when the log gains entries, live or through a replay that brings
/// new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatActivity {
    pub appended: usize,
}

/// Trims the name and checks it fits.
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong {
            max: MAX_USERNAME_LEN,
        });
    }
    Ok(name.to_string())
}
