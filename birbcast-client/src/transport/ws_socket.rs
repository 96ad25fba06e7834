use crate::transport::socket::{DuplexSocket, SocketConnector, SocketEvent};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// Websocket connector backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

pub struct WsSocket {
    outbound: mpsc::UnboundedSender<Message>,
    recv_task: JoinHandle<()>,
    send_task: JoinHandle<()>,
}

#[async_trait]
impl SocketConnector for WsConnector {
    async fn connect(
        &self,
        url: &Url,
        events: mpsc::Sender<SocketEvent>,
    ) -> Result<Box<dyn DuplexSocket>> {
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .with_context(|| format!("Websocket handshake with {url} failed"))?;
        info!("Websocket connected: {}", url);

        let (mut sender, mut receiver) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        let _ = events.send(SocketEvent::Opened).await;

        let send_task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if sender.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        let recv_url = url.clone();
        let recv_task = tokio::spawn(async move {
            let reason = loop {
                match receiver.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if events
                            .send(SocketEvent::Message(text.as_str().to_owned()))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map(|f| f.reason.as_str().to_owned()).filter(|r| !r.is_empty());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Websocket error on {}: {:?}", recv_url, e);
                        break Some(e.to_string());
                    }
                    None => break None,
                }
            };

            debug!("Websocket closed: {}", recv_url);
            let _ = events.send(SocketEvent::Closed(reason)).await;
        });

        Ok(Box::new(WsSocket {
            outbound: tx,
            recv_task,
            send_task,
        }))
    }
}

#[async_trait]
impl DuplexSocket for WsSocket {
    async fn send(&self, text: String) -> Result<()> {
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| anyhow!("websocket writer has stopped"))
    }

    async fn close(&self) -> Result<()> {
        self.recv_task.abort();
        if self.outbound.send(Message::Close(None)).is_err() {
            self.send_task.abort();
        }
        Ok(())
    }
}

impl Drop for WsSocket {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
