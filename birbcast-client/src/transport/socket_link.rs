use crate::reconnect::{BackoffDelayer, ReconnectPolicy};
use crate::transport::socket::{DuplexSocket, SocketConnector, SocketEvent};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// One logical socket channel with its reconnect timer.
///
/// Each connection gets a fresh event channel. Dropping the receiver on
/// teardown means a replaced socket can never deliver into its successor.
pub struct SocketLink {
    name: &'static str,
    connector: Arc<dyn SocketConnector>,
    url: Option<Url>,
    policy: ReconnectPolicy,
    delayer: BackoffDelayer,
    reconnect_at: Option<Instant>,
    socket: Option<Box<dyn DuplexSocket>>,
    events: Option<mpsc::Receiver<SocketEvent>>,
}

impl SocketLink {
    pub fn new(name: &'static str, connector: Arc<dyn SocketConnector>, policy: ReconnectPolicy) -> Self {
        Self {
            name,
            connector,
            url: None,
            delayer: policy.delayer(),
            policy,
            reconnect_at: None,
            socket: None,
            events: None,
        }
    }

    pub fn set_policy(&mut self, policy: ReconnectPolicy) {
        self.delayer = policy.delayer();
        self.policy = policy;
    }

    pub fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.socket.is_some()
    }

    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Replaces any current socket with a new connection attempt.
    pub async fn connect(&mut self) -> Result<()> {
        self.close().await;

        let url = self
            .url
            .clone()
            .with_context(|| format!("{} socket has no endpoint", self.name))?;
        let (tx, rx) = mpsc::channel(256);

        debug!("Connecting {} socket to {}", self.name, url);
        let socket = self
            .connector
            .connect(&url, tx)
            .await
            .with_context(|| format!("Failed to open {} socket at {}", self.name, url))?;

        self.socket = Some(socket);
        self.events = Some(rx);
        Ok(())
    }

    /// Next event of the current socket. Pending while detached.
    pub async fn next_event(&mut self) -> SocketEvent {
        let Some(events) = self.events.as_mut() else {
            return std::future::pending().await;
        };

        match events.recv().await {
            Some(event) => event,
            None => {
                self.events = None;
                SocketEvent::Closed(None)
            }
        }
    }

    pub fn mark_open(&mut self) {
        self.delayer.reset();
    }

    /// Forgets a socket the remote side already closed.
    pub fn detach(&mut self) {
        self.socket = None;
        self.events = None;
    }

    /// Arms the reconnect timer. Returns the delay, or `None` when the
    /// policy does not reconnect.
    pub fn schedule_reconnect(&mut self) -> Option<Duration> {
        if !self.policy.enabled {
            return None;
        }

        let delay = self.delayer.next_delay();
        self.reconnect_at = Some(Instant::now() + delay);
        debug!("{} socket reconnects in {:?}", self.name, delay);
        Some(delay)
    }

    pub fn cancel_reconnect(&mut self) {
        self.reconnect_at = None;
    }

    pub async fn send(&self, text: String) -> Result<()> {
        let socket = self
            .socket
            .as_ref()
            .with_context(|| format!("{} socket is not connected", self.name))?;
        socket.send(text).await
    }

    /// Closes the current socket, if any. The reconnect timer is left alone.
    pub async fn close(&mut self) {
        self.events = None;

        let Some(socket) = self.socket.take() else {
            return;
        };
        if let Err(e) = socket.close().await {
            warn!("Failed to close {} socket: {:?}", self.name, e);
        }
    }

    /// Closes the socket and cancels any pending reconnect.
    pub async fn shutdown(&mut self) {
        self.cancel_reconnect();
        self.close().await;
    }
}
