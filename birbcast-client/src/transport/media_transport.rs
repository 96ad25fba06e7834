use crate::transport::transport_event::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use birbcast_core::{SessionConfig, SessionDescription, SessionId};
use tokio::sync::mpsc;

/// A receive-only peer connection owned by exactly one media session.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Creates an offer that asks for one receive-only video stream.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Applies the offer locally and returns the description to send out,
    /// with gathered candidates the transport policy admits.
    async fn set_local_description(&self, offer: SessionDescription)
    -> Result<SessionDescription>;

    async fn set_remote_description(&self, answer: SessionDescription) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait MediaTransportFactory: Send + Sync {
    /// State changes and remote tracks of the new transport are delivered to
    /// `events`, tagged with `session_id`.
    async fn create(
        &self,
        session_id: SessionId,
        config: &SessionConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>>;
}
