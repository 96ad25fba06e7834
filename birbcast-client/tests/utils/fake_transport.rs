use anyhow::{Result, bail};
use async_trait::async_trait;
use birbcast_client::transport::{
    MediaTransport, MediaTransportFactory, PeerState, TransportEvent,
};
use birbcast_core::{SessionConfig, SessionDescription, SessionId, TrackHandle, TrackKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Test side of one fake transport.
#[derive(Clone)]
pub struct TransportProbe {
    pub session_id: SessionId,
    events: mpsc::Sender<TransportEvent>,
    closed: Arc<AtomicBool>,
    remote: Arc<Mutex<Option<SessionDescription>>>,
}

impl TransportProbe {
    pub async fn emit_state(&self, state: PeerState) {
        let _ = self
            .events
            .send(TransportEvent::StateChanged(self.session_id, state))
            .await;
    }

    pub async fn emit_track(&self, track_id: &str) {
        let track = TrackHandle {
            stream_id: "stream".into(),
            track_id: track_id.into(),
            kind: TrackKind::Video,
        };
        let _ = self
            .events
            .send(TransportEvent::Track(self.session_id, track))
            .await;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn remote_description(&self) -> Option<SessionDescription> {
        self.remote.lock().await.clone()
    }
}

/// MediaTransportFactory whose transports are driven by the test.
#[derive(Clone, Default)]
pub struct FakeTransportFactory {
    probes: Arc<Mutex<Vec<TransportProbe>>>,
    /// Transports created and not yet closed.
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
    fail_close: Arc<AtomicBool>,
}

impl FakeTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub async fn probes(&self) -> Vec<TransportProbe> {
        self.probes.lock().await.clone()
    }

    pub async fn probe(&self, index: usize) -> TransportProbe {
        self.probes.lock().await[index].clone()
    }

    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub async fn wait_for_transports(&self, count: usize, timeout_ms: u64) -> bool {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.probes.lock().await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() > deadline {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

struct FakeTransport {
    probe: TransportProbe,
    open: Arc<AtomicUsize>,
    fail_close: Arc<AtomicBool>,
}

#[async_trait]
impl MediaTransport for FakeTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        Ok(SessionDescription::offer(
            "v=0\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\na=recvonly\r\n",
        ))
    }

    async fn set_local_description(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription> {
        Ok(offer)
    }

    async fn set_remote_description(&self, answer: SessionDescription) -> Result<()> {
        *self.probe.remote.lock().await = Some(answer);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.probe.closed.swap(true, Ordering::SeqCst) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
        if self.fail_close.load(Ordering::SeqCst) {
            bail!("peer connection refused to close");
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTransportFactory for FakeTransportFactory {
    async fn create(
        &self,
        session_id: SessionId,
        _config: &SessionConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>> {
        let probe = TransportProbe {
            session_id,
            events,
            closed: Arc::new(AtomicBool::new(false)),
            remote: Arc::new(Mutex::new(None)),
        };
        self.probes.lock().await.push(probe.clone());

        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(Box::new(FakeTransport {
            probe,
            open: self.open.clone(),
            fail_close: self.fail_close.clone(),
        }))
    }
}
