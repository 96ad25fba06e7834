use crate::error::PayloadError;
use crate::model::presence::coerce_count;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawRelayFrame {
    #[serde(rename = "type")]
    frame_type: Option<String>,
    frame: String,
    fps: Option<f64>,
    viewers: Option<Value>,
    timestamp: Option<String>,
}

/// One still frame pushed by the frame relay socket.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayFrame {
    pub jpeg: Bytes,
    pub fps: Option<u32>,
    pub viewers: Option<u64>,
    /// Server-side capture time, as sent.
    pub captured_at: Option<String>,
}

impl RelayFrame {
    /// Accepts the json frame object, or a bare base64 string as sent by the
    /// earliest relay servers.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let trimmed = text.trim();

        if !trimmed.starts_with('{') {
            return Ok(Self {
                jpeg: decode_jpeg(trimmed)?,
                fps: None,
                viewers: None,
                captured_at: None,
            });
        }

        let raw: RawRelayFrame = serde_json::from_str(trimmed)?;
        if let Some(kind) = raw.frame_type.as_deref() {
            if kind != "video" {
                return Err(PayloadError::UnexpectedType(kind.to_string()));
            }
        }

        let fps = match raw.fps {
            Some(fps) if fps.is_finite() && fps >= 0.0 => Some(fps.round() as u32),
            Some(fps) => return Err(PayloadError::Frame(format!("bad fps {fps}"))),
            None => None,
        };
        let viewers = raw.viewers.as_ref().map(coerce_count).transpose()?;

        Ok(Self {
            jpeg: decode_jpeg(&raw.frame)?,
            fps,
            viewers,
            captured_at: raw.timestamp,
        })
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.jpeg))
    }
}

fn decode_jpeg(encoded: &str) -> Result<Bytes, PayloadError> {
    if encoded.is_empty() {
        return Err(PayloadError::Frame("empty frame".to_string()));
    }
    BASE64
        .decode(encoded)
        .map(Bytes::from)
        .map_err(|e| PayloadError::Frame(e.to_string()))
}
