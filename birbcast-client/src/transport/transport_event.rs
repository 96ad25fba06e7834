use birbcast_core::{SessionId, TrackHandle};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Events a media transport pushes into the session controller loop.
///
/// Every event names the session it belongs to; the controller ignores
/// events from sessions it has already torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(SessionId, PeerState),
    Track(SessionId, TrackHandle),
}

impl TransportEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::StateChanged(id, _) | Self::Track(id, _) => *id,
        }
    }
}
