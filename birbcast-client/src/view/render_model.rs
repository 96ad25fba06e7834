use birbcast_core::TrackHandle;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionIndicator {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("🟢 Connected"),
            Self::Disconnected => f.write_str("🔴 Disconnected"),
        }
    }
}

/// What fills the video surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Track(TrackHandle),
    /// `data:image/jpeg;base64,...` of the latest relay frame.
    Frame { data_uri: String, fps: Option<u32> },
    Error(String),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    System,
    Me,
    User,
}

impl MessageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Me => "me",
            Self::User => "user",
        }
    }
}

/// One chat row. Text fields are already escaped for html.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub class: MessageClass,
    pub time_label: Option<String>,
    pub username: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModel {
    pub indicator: ConnectionIndicator,
    pub error: Option<String>,
    pub video: VideoSource,
    pub messages: Vec<RenderedMessage>,
    pub chat_error: Option<String>,
    pub chat_visible: bool,
    pub unseen_badge: bool,
    pub viewers: u64,
}
