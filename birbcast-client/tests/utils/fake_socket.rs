use anyhow::{Result, bail};
use async_trait::async_trait;
use birbcast_client::transport::{DuplexSocket, SocketConnector, SocketEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use url::Url;

/// Server side of one fake socket connection.
#[derive(Clone)]
pub struct FakeRemote {
    pub url: Url,
    events: mpsc::Sender<SocketEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FakeRemote {
    pub async fn push(&self, text: &str) {
        let _ = self.events.send(SocketEvent::Message(text.to_string())).await;
    }

    /// Remote side goes away.
    pub async fn drop_connection(&self, reason: Option<&str>) {
        let _ = self
            .events
            .send(SocketEvent::Closed(reason.map(str::to_string)))
            .await;
    }

    pub async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    /// True once the client closed this socket.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// SocketConnector that hands out in-memory sockets and opens them at once.
#[derive(Clone, Default)]
pub struct FakeSocketConnector {
    remotes: Arc<Mutex<Vec<FakeRemote>>>,
    refuse: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl FakeSocketConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` connection attempts fail.
    pub fn refuse_next(&self, count: usize) {
        self.refuse.store(count, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn connections(&self) -> usize {
        self.remotes.lock().await.len()
    }

    pub async fn remote(&self, index: usize) -> FakeRemote {
        self.remotes.lock().await[index].clone()
    }

    pub async fn last_remote(&self) -> Option<FakeRemote> {
        self.remotes.lock().await.last().cloned()
    }

    /// Latest connection whose url path is `path`.
    pub async fn wait_for_remote(&self, path: &str, timeout_ms: u64) -> Option<FakeRemote> {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);

        loop {
            let found = self
                .remotes
                .lock()
                .await
                .iter()
                .rev()
                .find(|r| r.url.path() == path)
                .cloned();
            if found.is_some() || tokio::time::Instant::now() > deadline {
                return found;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_connections(&self, count: usize, timeout_ms: u64) -> bool {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.remotes.lock().await.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() > deadline {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

struct FakeSocket {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl DuplexSocket for FakeSocket {
    async fn send(&self, text: String) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            bail!("socket closed");
        }
        self.sent.lock().await.push(text);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SocketConnector for FakeSocketConnector {
    async fn connect(
        &self,
        url: &Url,
        events: mpsc::Sender<SocketEvent>,
    ) -> Result<Box<dyn DuplexSocket>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            bail!("connection refused");
        }

        let remote = FakeRemote {
            url: url.clone(),
            events: events.clone(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        };
        self.remotes.lock().await.push(remote.clone());

        let _ = events.send(SocketEvent::Opened).await;

        Ok(Box::new(FakeSocket {
            sent: remote.sent,
            closed: remote.closed,
        }))
    }
}
