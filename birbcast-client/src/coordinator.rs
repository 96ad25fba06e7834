use crate::chat::{ChatChannelController, ChatHandle, ChatSnapshot};
use crate::config::{ClientConfig, ReconnectConfig};
use crate::error::{ChatError, SignalingError};
use crate::notification::NotificationState;
use crate::presence::{PresenceCounter, PresenceHandle, PresenceSnapshot};
use crate::relay::{FrameFeed, FrameFeedHandle, FrameFeedSnapshot};
use crate::session::{MediaSessionController, MediaSessionHandle, MediaStatus};
use crate::signaling::{HttpSignaling, SignalingClient};
use crate::transport::{MediaTransportFactory, RtcTransportFactory, SocketConnector, WsConnector};
use crate::view::{RenderModel, ViewInputs, project};
use birbcast_core::SessionConfig;
use birbcast_core::utils::DayClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoMode {
    /// Receive-only webrtc session.
    #[default]
    Media,
    /// Jpeg stills over the frame relay socket.
    Frames,
}

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub video_mode: VideoMode,
    pub chat_enabled: bool,
    pub chat_visible: bool,
    pub clock: DayClock,
    pub signaling_timeout: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            video_mode: VideoMode::Media,
            chat_enabled: true,
            chat_visible: true,
            clock: DayClock::Local,
            signaling_timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl CoordinatorOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            signaling_timeout: config.signaling_timeout,
            reconnect: config.reconnect,
            ..Self::default()
        }
    }
}

/// The capability implementations every controller is built from.
#[derive(Clone)]
pub struct Adapters {
    pub media: Arc<dyn MediaTransportFactory>,
    pub signaling: Arc<dyn SignalingClient>,
    pub sockets: Arc<dyn SocketConnector>,
}

impl Adapters {
    /// webrtc-rs, reqwest and tokio-tungstenite.
    pub fn network(session: &SessionConfig, signaling_timeout: Duration) -> Result<Self, SignalingError> {
        Ok(Self {
            media: Arc::new(RtcTransportFactory::default()),
            signaling: Arc::new(HttpSignaling::new(
                session.signaling_endpoint().clone(),
                signaling_timeout,
            )?),
            sockets: Arc::new(WsConnector),
        })
    }
}

/// Runs every controller of one viewer and projects them into a render model.
pub struct Coordinator {
    media: Option<MediaSessionHandle>,
    frames: Option<FrameFeedHandle>,
    chat: Option<ChatHandle>,
    presence: PresenceHandle,
    media_rx: Option<watch::Receiver<MediaStatus>>,
    frames_rx: Option<watch::Receiver<FrameFeedSnapshot>>,
    chat_rx: Option<watch::Receiver<ChatSnapshot>>,
    presence_rx: watch::Receiver<PresenceSnapshot>,
    notification_tx: Arc<watch::Sender<NotificationState>>,
    notification_rx: watch::Receiver<NotificationState>,
    activity_task: JoinHandle<()>,
    clock: DayClock,
}

impl Coordinator {
    /// Spawns all controllers and kicks off the video source. Chat waits
    /// for [`Coordinator::join_chat`].
    pub async fn start(config: Arc<SessionConfig>, adapters: Adapters, options: CoordinatorOptions) -> Self {
        let (notification_tx, notification_rx) =
            watch::channel(NotificationState::new(options.chat_visible));
        let notification_tx = Arc::new(notification_tx);

        let (activity_tx, mut activity_rx) = mpsc::unbounded_channel();
        let notify = notification_tx.clone();
        let activity_task = tokio::spawn(async move {
            while activity_rx.recv().await.is_some() {
                notify.send_if_modified(|state| {
                    let before = *state;
                    state.on_chat_activity();
                    *state != before
                });
            }
        });

        let media = match options.video_mode {
            VideoMode::Media => {
                let handle = MediaSessionController::new(
                    config.clone(),
                    adapters.media.clone(),
                    adapters.signaling.clone(),
                )
                .with_signaling_timeout(options.signaling_timeout)
                .with_restart_policy(options.reconnect.media)
                .spawn();
                handle.start().await;
                Some(handle)
            }
            VideoMode::Frames => None,
        };

        let frames = match (options.video_mode, config.frame_endpoint()) {
            (VideoMode::Frames, Some(endpoint)) => Some(
                FrameFeed::new(endpoint.clone(), adapters.sockets.clone())
                    .with_reconnect_policy(options.reconnect.frames)
                    .spawn(),
            ),
            (VideoMode::Frames, None) => {
                warn!("Frame mode requested but no frame endpoint is configured");
                None
            }
            _ => None,
        };

        let chat = options.chat_enabled.then(|| {
            ChatChannelController::new(config.clone(), adapters.sockets.clone())
                .with_reconnect_policy(options.reconnect.chat)
                .with_clock(options.clock)
                .with_activity_sender(activity_tx)
                .spawn()
        });

        let presence = PresenceCounter::new(config.presence_endpoint().clone(), adapters.sockets.clone())
            .with_reconnect_policy(options.reconnect.presence)
            .spawn();

        info!(
            "Coordinator started ({:?}, chat {})",
            options.video_mode,
            if options.chat_enabled { "on" } else { "off" }
        );

        Self {
            media_rx: media.as_ref().map(MediaSessionHandle::subscribe),
            frames_rx: frames.as_ref().map(FrameFeedHandle::subscribe),
            chat_rx: chat.as_ref().map(ChatHandle::subscribe),
            presence_rx: presence.subscribe(),
            media,
            frames,
            chat,
            presence,
            notification_tx,
            notification_rx,
            activity_task,
            clock: options.clock,
        }
    }

    pub async fn join_chat(&self, username: &str) -> Result<(), ChatError> {
        self.chat.as_ref().ok_or(ChatError::Stopped)?.join(username).await
    }

    pub async fn send_chat(&self, text: &str) -> Result<(), ChatError> {
        self.chat.as_ref().ok_or(ChatError::Stopped)?.send(text).await
    }

    pub async fn rejoin_chat(&self) -> Result<(), ChatError> {
        self.chat.as_ref().ok_or(ChatError::Stopped)?.rejoin().await
    }

    /// Tears down the current media session and negotiates a new one.
    pub async fn restart_media(&self) {
        if let Some(media) = &self.media {
            media.start().await;
        }
    }

    pub fn set_chat_visible(&self, visible: bool) {
        self.notification_tx.send_if_modified(|state| {
            let before = *state;
            state.set_pane_visible(visible);
            *state != before
        });
    }

    pub fn notification(&self) -> NotificationState {
        *self.notification_rx.borrow()
    }

    pub fn render_model(&self) -> RenderModel {
        let media = self.media_rx.as_ref().map(|rx| rx.borrow().clone());
        let frames = self.frames_rx.as_ref().map(|rx| rx.borrow().clone());
        let chat = self.chat_rx.as_ref().map(|rx| rx.borrow().clone());
        let presence = *self.presence_rx.borrow();

        project(&ViewInputs {
            media: media.as_ref(),
            frames: frames.as_ref(),
            chat: chat.as_ref(),
            presence: &presence,
            notification: self.notification(),
            clock: self.clock,
        })
    }

    /// Resolves once any controller published a new snapshot.
    pub async fn changed(&mut self) {
        tokio::select! {
            _ = changed_opt(self.media_rx.as_mut()) => {}
            _ = changed_opt(self.frames_rx.as_mut()) => {}
            _ = changed_opt(self.chat_rx.as_mut()) => {}
            _ = changed_opt(Some(&mut self.presence_rx)) => {}
            _ = changed_opt(Some(&mut self.notification_rx)) => {}
        }
    }

    /// Closes every transport and cancels every timer.
    pub async fn shutdown(self) {
        if let Some(media) = &self.media {
            media.shutdown().await;
        }
        if let Some(frames) = &self.frames {
            frames.shutdown().await;
        }
        if let Some(chat) = &self.chat {
            chat.shutdown().await;
        }
        self.presence.shutdown().await;
        self.activity_task.abort();
        info!("Coordinator shut down");
    }
}

async fn changed_opt<T>(rx: Option<&mut watch::Receiver<T>>) {
    if let Some(rx) = rx {
        if rx.changed().await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}
