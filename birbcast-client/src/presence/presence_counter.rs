use crate::reconnect::{ReconnectPolicy, sleep_until_deadline};
use crate::transport::{SocketConnector, SocketEvent, SocketLink};
use birbcast_core::parse_presence_count;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    /// Last valid count received; 0 until the first one arrives.
    pub count: u64,
    pub connected: bool,
    pub malformed_frames: u64,
}

/// Keeps the viewer count current. Reconnects on every close until shut down.
pub struct PresenceCounter {
    link: SocketLink,
    snapshot: PresenceSnapshot,
    snapshot_tx: watch::Sender<PresenceSnapshot>,
    running: bool,
}

impl PresenceCounter {
    pub fn new(endpoint: Url, connector: Arc<dyn SocketConnector>) -> Self {
        let mut link = SocketLink::new("presence", connector, ReconnectPolicy::presence_default());
        link.set_url(endpoint);
        let (snapshot_tx, _) = watch::channel(PresenceSnapshot::default());

        Self {
            link,
            snapshot: PresenceSnapshot::default(),
            snapshot_tx,
            running: false,
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.link.set_policy(policy);
        self
    }

    pub fn count(&self) -> u64 {
        self.snapshot.count
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        self.snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<PresenceSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.link.reconnect_deadline().is_some()
    }

    pub async fn start(&mut self) {
        self.running = true;
        self.connect().await;
    }

    async fn connect(&mut self) {
        if let Err(e) = self.link.connect().await {
            warn!("{:#}", e);
            self.on_closed();
        }
    }

    pub async fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => {
                debug!("Presence socket open");
                self.link.mark_open();
                self.snapshot.connected = true;
                self.publish();
            }
            SocketEvent::Message(text) => match parse_presence_count(&text) {
                Ok(count) => {
                    self.snapshot.count = count;
                    self.publish();
                }
                Err(e) => {
                    self.snapshot.malformed_frames += 1;
                    warn!("Dropping malformed presence frame: {}", e);
                    self.publish();
                }
            },
            SocketEvent::Closed(reason) => {
                debug!("Presence socket closed: {:?}", reason);
                self.on_closed();
            }
        }
    }

    fn on_closed(&mut self) {
        self.link.detach();
        self.snapshot.connected = false;
        self.publish();

        if !self.running {
            return;
        }
        if let Some(delay) = self.link.schedule_reconnect() {
            info!("Presence reconnects in {:?}", delay);
        }
    }

    async fn reconnect_due(&mut self) {
        self.link.cancel_reconnect();
        if self.running && !self.link.is_attached() {
            self.connect().await;
        }
    }

    /// Cancels any pending reconnect and closes the socket.
    pub async fn shutdown(&mut self) {
        self.running = false;
        self.link.shutdown().await;
        self.snapshot.connected = false;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot);
    }

    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<oneshot::Sender<()>>) {
        self.start().await;

        loop {
            let reconnect_at = self.link.reconnect_deadline();

            tokio::select! {
                done = shutdown_rx.recv() => {
                    self.shutdown().await;
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                    break;
                }

                evt = self.link.next_event() => self.handle_socket_event(evt).await,

                _ = sleep_until_deadline(reconnect_at) => self.reconnect_due().await,
            }
        }

        info!("Presence counter stopped");
    }

    /// Connects and keeps running in the background.
    pub fn spawn(self) -> PresenceHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let snapshot_rx = self.subscribe();
        tokio::spawn(self.run(shutdown_rx));

        PresenceHandle {
            shutdown_tx,
            snapshot_rx,
        }
    }
}

#[derive(Clone)]
pub struct PresenceHandle {
    shutdown_tx: mpsc::Sender<oneshot::Sender<()>>,
    snapshot_rx: watch::Receiver<PresenceSnapshot>,
}

impl PresenceHandle {
    pub fn count(&self) -> u64 {
        self.snapshot_rx.borrow().count
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        *self.snapshot_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PresenceSnapshot> {
        self.snapshot_rx.clone()
    }

    pub async fn shutdown(&self) {
        let (done, wait) = oneshot::channel();
        if self.shutdown_tx.send(done).await.is_ok() {
            let _ = wait.await;
        }
    }
}
