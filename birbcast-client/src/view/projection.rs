use crate::chat::{ChatSnapshot, SocketState};
use crate::notification::NotificationState;
use crate::presence::PresenceSnapshot;
use crate::relay::FrameFeedSnapshot;
use crate::session::MediaStatus;
use crate::view::render_model::{
    ConnectionIndicator, MessageClass, RenderModel, RenderedMessage, VideoSource,
};
use birbcast_core::utils::{DayClock, sanitize_html};
use birbcast_core::{ChatEvent, MediaState};

const MEDIA_FAILED_FALLBACK: &str = "Failed to connect to camera stream.";

/// Snapshots of every controller at one instant.
#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    pub media: Option<&'a MediaStatus>,
    pub frames: Option<&'a FrameFeedSnapshot>,
    pub chat: Option<&'a ChatSnapshot>,
    pub presence: &'a PresenceSnapshot,
    pub notification: NotificationState,
    pub clock: DayClock,
}

pub fn project(inputs: &ViewInputs<'_>) -> RenderModel {
    let (indicator, error, video) = match (inputs.media, inputs.frames) {
        (Some(media), _) => project_media(media),
        (None, Some(frames)) => project_frames(frames),
        (None, None) => (ConnectionIndicator::Disconnected, None, VideoSource::Nothing),
    };

    let (messages, chat_error) = match inputs.chat {
        Some(chat) => project_chat(chat, inputs.clock),
        None => (Vec::new(), None),
    };

    let viewers = match inputs.frames.and_then(|f| f.frame.as_ref()) {
        Some(frame) if !inputs.presence.connected => {
            frame.viewers.unwrap_or(inputs.presence.count)
        }
        _ => inputs.presence.count,
    };

    RenderModel {
        indicator,
        error,
        video,
        messages,
        chat_error,
        chat_visible: inputs.notification.pane_visible(),
        unseen_badge: inputs.notification.has_unseen(),
        viewers,
    }
}

fn project_media(media: &MediaStatus) -> (ConnectionIndicator, Option<String>, VideoSource) {
    match media.state {
        MediaState::Failed => {
            let text = media
                .error
                .clone()
                .unwrap_or_else(|| MEDIA_FAILED_FALLBACK.to_string());
            (
                ConnectionIndicator::Disconnected,
                Some(text.clone()),
                VideoSource::Error(text),
            )
        }
        MediaState::Connected => {
            let video = media
                .track
                .clone()
                .map_or(VideoSource::Nothing, VideoSource::Track);
            (ConnectionIndicator::Connected, None, video)
        }
        _ => {
            let video = media
                .track
                .clone()
                .map_or(VideoSource::Nothing, VideoSource::Track);
            (ConnectionIndicator::Disconnected, None, video)
        }
    }
}

fn project_frames(frames: &FrameFeedSnapshot) -> (ConnectionIndicator, Option<String>, VideoSource) {
    let indicator = if frames.connected {
        ConnectionIndicator::Connected
    } else {
        ConnectionIndicator::Disconnected
    };
    let video = match &frames.frame {
        Some(frame) => VideoSource::Frame {
            data_uri: frame.data_uri(),
            fps: frame.fps,
        },
        None => VideoSource::Nothing,
    };
    (indicator, None, video)
}

fn project_chat(chat: &ChatSnapshot, clock: DayClock) -> (Vec<RenderedMessage>, Option<String>) {
    if chat.state == SocketState::Closed {
        if let Some(error) = &chat.error {
            return (Vec::new(), Some(error.clone()));
        }
    }

    let me = chat.username.as_deref();
    let messages = chat
        .events
        .iter()
        .map(|event| match event {
            ChatEvent::Message {
                username,
                text,
                timestamp_ms,
            } => RenderedMessage {
                class: if Some(username.as_str()) == me {
                    MessageClass::Me
                } else {
                    MessageClass::User
                },
                time_label: clock.time_label(*timestamp_ms),
                username: Some(sanitize_html(username)),
                text: sanitize_html(text),
            },
            ChatEvent::SystemNotice { text, .. } | ChatEvent::DateSeparator { label: text, .. } => {
                RenderedMessage {
                    class: MessageClass::System,
                    time_label: None,
                    username: None,
                    text: sanitize_html(text),
                }
            }
        })
        .collect();

    (messages, None)
}
