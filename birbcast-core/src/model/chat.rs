use crate::error::PayloadError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the visible chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message {
        username: String,
        text: String,
        timestamp_ms: i64,
    },
    SystemNotice {
        text: String,
        timestamp_ms: i64,
    },
    /// Synthesized locally before the first event of a new calendar day.
    DateSeparator { label: String, timestamp_ms: i64 },
}

impl ChatEvent {
    pub fn timestamp_ms(&self) -> i64 {
        match self {
            Self::Message { timestamp_ms, .. }
            | Self::SystemNotice { timestamp_ms, .. }
            | Self::DateSeparator { timestamp_ms, .. } => *timestamp_ms,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message { .. })
    }
}

/// Inbound timestamp as sent by the server.
///
/// Older servers send epoch milliseconds, newer ones ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

impl Timestamp {
    pub fn to_millis(&self) -> Result<i64, PayloadError> {
        match self {
            Self::Millis(ms) => Ok(*ms),
            Self::Fractional(ms) if ms.is_finite() => Ok(ms.round() as i64),
            Self::Fractional(ms) => Err(PayloadError::Timestamp(ms.to_string())),
            Self::Text(text) => parse_text_timestamp(text),
        }
    }
}

fn parse_text_timestamp(text: &str) -> Result<i64, PayloadError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp_millis());
    }

    // Zone-less ISO strings are read as UTC.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }

    text.parse::<i64>()
        .map_err(|_| PayloadError::Timestamp(text.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawFrame {
    History {
        messages: Vec<serde_json::Value>,
    },
    Message {
        username: String,
        text: String,
        timestamp: Timestamp,
    },
    System {
        text: String,
        timestamp: Timestamp,
    },
}

/// A decoded inbound chat frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFrame {
    /// Full log replay. Entries that failed to decode are counted in
    /// `skipped` and left out.
    History {
        events: Vec<ChatEvent>,
        skipped: usize,
    },
    Message(ChatEvent),
    System(ChatEvent),
}

impl ChatFrame {
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let raw: RawFrame = serde_json::from_str(text)?;

        match raw {
            RawFrame::History { messages } => {
                let total = messages.len();
                let events: Vec<ChatEvent> = messages
                    .into_iter()
                    .filter_map(|value| {
                        serde_json::from_value::<RawFrame>(value)
                            .map_err(PayloadError::from)
                            .and_then(entry_to_event)
                            .ok()
                    })
                    .collect();
                let skipped = total - events.len();

                Ok(Self::History { events, skipped })
            }
            entry @ RawFrame::Message { .. } => entry_to_event(entry).map(Self::Message),
            entry @ RawFrame::System { .. } => entry_to_event(entry).map(Self::System),
        }
    }
}

fn entry_to_event(raw: RawFrame) -> Result<ChatEvent, PayloadError> {
    match raw {
        RawFrame::Message {
            username,
            text,
            timestamp,
        } => Ok(ChatEvent::Message {
            username,
            text,
            timestamp_ms: timestamp.to_millis()?,
        }),
        RawFrame::System { text, timestamp } => Ok(ChatEvent::SystemNotice {
            text,
            timestamp_ms: timestamp.to_millis()?,
        }),
        RawFrame::History { .. } => Err(PayloadError::UnexpectedType("history".to_string())),
    }
}

/// Outbound chat frame. The server stamps its own time on the echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundChatMessage {
    pub username: String,
    pub text: String,
    pub timestamp: String,
}

impl OutboundChatMessage {
    pub fn new(username: impl Into<String>, text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
