use crate::reconnect::{ReconnectPolicy, sleep_until_deadline};
use crate::transport::{SocketConnector, SocketEvent, SocketLink};
use birbcast_core::RelayFrame;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameFeedSnapshot {
    pub connected: bool,
    /// Most recent frame; older ones are never queued.
    pub frame: Option<Arc<RelayFrame>>,
    pub frames_received: u64,
    pub malformed_frames: u64,
}

/// Still-frame relay socket, used when the stream is served as jpeg frames
/// instead of a media session.
pub struct FrameFeed {
    link: SocketLink,
    snapshot: FrameFeedSnapshot,
    snapshot_tx: watch::Sender<FrameFeedSnapshot>,
    running: bool,
}

impl FrameFeed {
    pub fn new(endpoint: Url, connector: Arc<dyn SocketConnector>) -> Self {
        let mut link = SocketLink::new("frames", connector, ReconnectPolicy::presence_default());
        link.set_url(endpoint);
        let (snapshot_tx, _) = watch::channel(FrameFeedSnapshot::default());

        Self {
            link,
            snapshot: FrameFeedSnapshot::default(),
            snapshot_tx,
            running: false,
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.link.set_policy(policy);
        self
    }

    pub fn snapshot(&self) -> &FrameFeedSnapshot {
        &self.snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameFeedSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn start(&mut self) {
        self.running = true;
        if let Err(e) = self.link.connect().await {
            warn!("{:#}", e);
            self.on_closed();
        }
    }

    pub async fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => {
                info!("Frame relay connected");
                self.link.mark_open();
                self.snapshot.connected = true;
            }
            SocketEvent::Message(text) => match RelayFrame::parse(&text) {
                Ok(frame) => {
                    self.snapshot.frames_received += 1;
                    self.snapshot.frame = Some(Arc::new(frame));
                }
                Err(e) => {
                    self.snapshot.malformed_frames += 1;
                    warn!("Dropping malformed relay frame: {}", e);
                }
            },
            SocketEvent::Closed(reason) => {
                debug!("Frame relay closed: {:?}", reason);
                self.on_closed();
                return;
            }
        }
        self.publish();
    }

    fn on_closed(&mut self) {
        self.link.detach();
        self.snapshot.connected = false;
        self.publish();

        if self.running {
            self.link.schedule_reconnect();
        }
    }

    pub async fn shutdown(&mut self) {
        self.running = false;
        self.link.shutdown().await;
        self.snapshot.connected = false;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot.clone());
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

                _ = sleep_until_deadline(reconnect_at) => {
                    self.link.cancel_reconnect();
                    self.start().await;
                }
            }
        }

        info!("Frame feed stopped");
    }

    pub fn spawn(self) -> FrameFeedHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let snapshot_rx = self.subscribe();
        tokio::spawn(self.run(shutdown_rx));

        FrameFeedHandle {
            shutdown_tx,
            snapshot_rx,
        }
    }
}

#[derive(Clone)]
pub struct FrameFeedHandle {
    shutdown_tx: mpsc::Sender<oneshot::Sender<()>>,
    snapshot_rx: watch::Receiver<FrameFeedSnapshot>,
}

impl FrameFeedHandle {
    pub fn snapshot(&self) -> FrameFeedSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameFeedSnapshot> {
        self.snapshot_rx.clone()
    }

    pub async fn shutdown(&self) {
        let (done, wait) = oneshot::channel();
        if self.shutdown_tx.send(done).await.is_ok() {
            let _ = wait.await;
        }
    }
}
