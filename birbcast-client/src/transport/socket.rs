use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    /// Remote close or transport error; carries a reason when one is known.
    Closed(Option<String>),
}

/// Text message socket, write half. Reads arrive as [`SocketEvent`]s.
#[async_trait]
pub trait DuplexSocket: Send + Sync {
    async fn send(&self, text: String) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait SocketConnector: Send + Sync {
    /// Opens a socket to `url`. `Opened` is delivered on `events` once the
    /// handshake completes, then messages, then a single `Closed`.
    async fn connect(
        &self,
        url: &Url,
        events: mpsc::Sender<SocketEvent>,
    ) -> Result<Box<dyn DuplexSocket>>;
}
