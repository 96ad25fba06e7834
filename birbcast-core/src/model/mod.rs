mod chat;
mod presence;
mod relay;
mod session;
mod session_config;
mod signaling;

pub use chat::{ChatEvent, ChatFrame, OutboundChatMessage, Timestamp};
pub use presence::{coerce_count, parse_presence_count};
pub use relay::RelayFrame;
pub use session::{MediaState, SessionId, TrackHandle, TrackKind};
pub use session_config::{IceServerConfig, SessionConfig, TransportPolicy};
pub use signaling::{OfferRequest, SdpType, SessionDescription};
