use birbcast_core::{MediaState, SessionId, TrackHandle};

/// One negotiation attempt and, if it succeeds, its live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSession {
    pub id: SessionId,
    pub state: MediaState,
    pub local_offer: Option<String>,
    pub remote_answer: Option<String>,
    pub remote_track: Option<TrackHandle>,
}

impl MediaSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: MediaState::Negotiating,
            local_offer: None,
            remote_answer: None,
            remote_track: None,
        }
    }
}

/// What observers see of the media controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaStatus {
    pub state: MediaState,
    pub session_id: Option<SessionId>,
    pub track: Option<TrackHandle>,
    /// User-facing text, set while the state is `Failed`.
    pub error: Option<String>,
}
