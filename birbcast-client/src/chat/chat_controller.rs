use crate::chat::chat_command::ChatCommand;
use crate::chat::chat_log::ChatLog;
use crate::chat::chat_session::{
    ChatActivity, ChatSnapshot, MAX_MESSAGE_LEN, SocketState, validate_username,
};
use crate::error::{ChatError, ValidationError};
use crate::reconnect::{ReconnectPolicy, sleep_until_deadline};
use crate::transport::{SocketConnector, SocketEvent, SocketLink};
use birbcast_core::utils::DayClock;
use birbcast_core::{ChatEvent, ChatFrame, OutboundChatMessage, SessionConfig};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// The chat socket of one committed username, and the log it feeds.
pub struct ChatChannelController {
    config: Arc<SessionConfig>,
    link: SocketLink,
    username: Option<String>,
    state: SocketState,
    log: ChatLog,
    error: Option<String>,
    malformed_frames: u64,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    activity_tx: Option<mpsc::UnboundedSender<ChatActivity>>,
}

impl ChatChannelController {
    pub fn new(config: Arc<SessionConfig>, connector: Arc<dyn SocketConnector>) -> Self {
        let (snapshot_tx, _) = watch::channel(ChatSnapshot::default());

        Self {
            config,
            link: SocketLink::new("chat", connector, ReconnectPolicy::chat_default()),
            username: None,
            state: SocketState::Disconnected,
            log: ChatLog::new(DayClock::Local),
            error: None,
            malformed_frames: 0,
            snapshot_tx,
            activity_tx: None,
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.link.set_policy(policy);
        self
    }

    pub fn with_clock(mut self, clock: DayClock) -> Self {
        self.log = ChatLog::new(clock);
        self
    }

    pub fn with_activity_sender(mut self, tx: mpsc::UnboundedSender<ChatActivity>) -> Self {
        self.activity_tx = Some(tx);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn state(&self) -> SocketState {
        self.state
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn events(&self) -> &[ChatEvent] {
        self.log.events()
    }

    pub fn malformed_frames(&self) -> u64 {
        self.malformed_frames
    }

    pub fn reconnect_pending(&self) -> bool {
        self.link.reconnect_deadline().is_some()
    }

    /// Commits `username` and opens the chat socket.
    pub async fn join(&mut self, username: &str) -> Result<(), ChatError> {
        let name = validate_username(username)?;
        if matches!(self.state, SocketState::Connecting | SocketState::Open) {
            let current = self.username.clone().unwrap_or_default();
            return Err(ChatError::AlreadyJoined(current));
        }

        info!("Joining chat as {}", name);
        self.username = Some(name);
        self.link.cancel_reconnect();
        self.connect().await;
        Ok(())
    }

    /// Reopens the socket under the committed username.
    pub async fn rejoin(&mut self) -> Result<(), ChatError> {
        if self.username.is_none() {
            return Err(ChatError::NotJoined);
        }
        if matches!(self.state, SocketState::Connecting | SocketState::Open) {
            return Ok(());
        }

        self.link.cancel_reconnect();
        self.connect().await;
        Ok(())
    }

    pub async fn leave(&mut self) {
        self.link.shutdown().await;
        self.state = SocketState::Disconnected;
        self.error = None;
        self.publish();
        debug!("Left chat");
    }

    /// Sends one message. Nothing is appended locally: the server echo is
    /// what shows up in the log.
    pub async fn send(&mut self, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(ValidationError::MessageTooLong {
                max: MAX_MESSAGE_LEN,
            }
            .into());
        }
        let Some(username) = self.username.as_deref() else {
            return Err(ChatError::NotJoined);
        };
        if self.state != SocketState::Open {
            return Err(ValidationError::NotConnected.into());
        }

        let outbound = OutboundChatMessage::new(username, text, Utc::now());
        let body = serde_json::to_string(&outbound).map_err(|e| ChatError::Send(e.to_string()))?;
        self.link
            .send(body)
            .await
            .map_err(|e| ChatError::Send(format!("{e:#}")))
    }

    async fn connect(&mut self) {
        let Some(username) = self.username.as_deref() else {
            return;
        };
        self.link.set_url(self.config.chat_url_for(username));
        self.state = SocketState::Connecting;
        self.publish();

        if let Err(e) = self.link.connect().await {
            warn!("{:#}", e);
            self.on_closed(Some(format!("{e:#}")));
        }
    }

    pub async fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Opened => {
                info!("Chat socket open");
                self.link.mark_open();
                self.state = SocketState::Open;
                self.error = None;
                self.publish();
            }
            SocketEvent::Message(text) => self.on_frame(&text),
            SocketEvent::Closed(reason) => {
                if self.state == SocketState::Disconnected {
                    return;
                }
                self.on_closed(reason);
            }
        }
    }

    fn on_frame(&mut self, text: &str) {
        let frame = match ChatFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                self.malformed_frames += 1;
                warn!("Dropping malformed chat frame: {}", e);
                self.publish();
                return;
            }
        };

        match frame {
            ChatFrame::History { events, skipped } => {
                if skipped > 0 {
                    self.malformed_frames += skipped as u64;
                    warn!("Chat history had {} unreadable entries", skipped);
                }
                debug!("Chat history replay with {} entries", events.len());
                let before = self.log.len();
                let last = self.log.events().last().cloned();
                self.log.replace_with_history(events);
                self.publish();

                // Messages missed while disconnected arrive only through replay.
                let after = self.log.len();
                if after > before || (after > 0 && self.log.events().last() != last.as_ref()) {
                    self.notify(after.saturating_sub(before).max(1));
                }
            }
            ChatFrame::Message(event) => self.append(event),
            ChatFrame::System(event) => {
                if let (ChatEvent::SystemNotice { text, .. }, Some(me)) = (&event, &self.username) {
                    if text.contains(me.as_str()) {
                        debug!("Suppressed own system notice: {}", text);
                        return;
                    }
                }
                self.append(event);
            }
        }
    }

    fn append(&mut self, event: ChatEvent) {
        let appended = self.log.append(event);
        self.publish();
        self.notify(appended);
    }

    fn notify(&self, appended: usize) {
        if let Some(tx) = &self.activity_tx {
            let _ = tx.send(ChatActivity { appended });
        }
    }

    fn on_closed(&mut self, reason: Option<String>) {
        self.link.detach();
        self.state = SocketState::Closed;

        let retry = self.link.schedule_reconnect();
        self.error = Some(match (reason, retry) {
            (Some(reason), Some(delay)) => {
                format!("Chat connection lost ({reason}). Reconnecting in {}s", delay.as_secs())
            }
            (None, Some(delay)) => {
                format!("Chat connection lost. Reconnecting in {}s", delay.as_secs())
            }
            (Some(reason), None) => format!("Chat connection closed: {reason}"),
            (None, None) => "Chat connection closed".to_string(),
        });
        warn!("{}", self.error.as_deref().unwrap_or_default());
        self.publish();
    }

    async fn reconnect_due(&mut self) {
        self.link.cancel_reconnect();
        if self.state == SocketState::Closed {
            info!("Reconnecting chat");
            self.connect().await;
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(ChatSnapshot {
            username: self.username.clone(),
            state: self.state,
            events: Arc::new(self.log.events().to_vec()),
            error: self.error.clone(),
            malformed_frames: self.malformed_frames,
        });
    }

    async fn handle_command(&mut self, cmd: ChatCommand) -> bool {
        match cmd {
            ChatCommand::Join { username, reply } => {
                let _ = reply.send(self.join(&username).await);
            }
            ChatCommand::Send { text, reply } => {
                let _ = reply.send(self.send(&text).await);
            }
            ChatCommand::Rejoin { reply } => {
                let _ = reply.send(self.rejoin().await);
            }
            ChatCommand::Leave => self.leave().await,
            ChatCommand::Shutdown { done } => {
                self.leave().await;
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    pub async fn run(mut self, mut command_rx: mpsc::Receiver<ChatCommand>) {
        info!("Chat loop started");

        loop {
            let reconnect_at = self.link.reconnect_deadline();

            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            self.leave().await;
                            break;
                        }
                    }
                }

                evt = self.link.next_event() => self.handle_socket_event(evt).await,

                _ = sleep_until_deadline(reconnect_at) => self.reconnect_due().await,
            }
        }

        info!("Chat loop finished");
    }

    pub fn spawn(self) -> ChatHandle {
        let (command_tx, command_rx) = mpsc::channel(32);
        let snapshot_rx = self.subscribe();
        tokio::spawn(self.run(command_rx));

        ChatHandle {
            command_tx,
            snapshot_rx,
        }
    }
}

#[derive(Clone)]
pub struct ChatHandle {
    command_tx: mpsc::Sender<ChatCommand>,
    snapshot_rx: watch::Receiver<ChatSnapshot>,
}

impl ChatHandle {
    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), ChatError>>) -> ChatCommand,
    ) -> Result<(), ChatError> {
        let (reply, wait) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| ChatError::Stopped)?;
        wait.await.map_err(|_| ChatError::Stopped)?
    }

    pub async fn join(&self, username: &str) -> Result<(), ChatError> {
        let username = username.to_string();
        self.request(|reply| ChatCommand::Join { username, reply }).await
    }

    pub async fn send(&self, text: &str) -> Result<(), ChatError> {
        let text = text.to_string();
        self.request(|reply| ChatCommand::Send { text, reply }).await
    }

    pub async fn rejoin(&self) -> Result<(), ChatError> {
        self.request(|reply| ChatCommand::Rejoin { reply }).await
    }

    pub async fn leave(&self) {
        let _ = self.command_tx.send(ChatCommand::Leave).await;
    }

    pub async fn shutdown(&self) {
        let (done, wait) = oneshot::channel();
        if self.command_tx.send(ChatCommand::Shutdown { done }).await.is_ok() {
            let _ = wait.await;
        }
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_rx.clone()
    }
}
