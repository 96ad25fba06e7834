use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Correlation id sent with every offer. A fresh one is minted per `start()`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a media session.
///
/// `Closed` is terminal: it is only entered through an explicit shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaState {
    #[default]
    Idle,
    Negotiating,
    Connected,
    Failed,
    Closed,
}

impl MediaState {
    /// A live session owns a transport that must be torn down before another
    /// one may be created.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Negotiating | Self::Connected)
    }
}

impl fmt::Display for MediaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Negotiating => "negotiating",
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Reference to a remote track bound as the session's live output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackHandle {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}
