use crate::error::{MediaError, SignalingError, TransportError};
use crate::reconnect::{BackoffDelayer, ReconnectPolicy, sleep_until_deadline};
use crate::session::media_command::MediaCommand;
use crate::session::media_session::{MediaSession, MediaStatus};
use crate::signaling::SignalingClient;
use crate::transport::{MediaTransport, MediaTransportFactory, PeerState, TransportEvent};
use birbcast_core::{MediaState, OfferRequest, SessionConfig, SessionDescription, SessionId};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const DEFAULT_SIGNALING_TIMEOUT: Duration = Duration::from_secs(10);

type PendingAnswer = BoxFuture<'static, Result<SessionDescription, SignalingError>>;

/// Resolves with the in-flight answer, or never when nothing is pending.
async fn next_answer(
    pending: &mut Option<(SessionId, PendingAnswer)>,
) -> (SessionId, Result<SessionDescription, SignalingError>) {
    match pending {
        Some((id, answer)) => (*id, answer.await),
        None => std::future::pending().await,
    }
}

/// Owns the single live media session and its transport.
///
/// Driven either directly through its async methods or as an actor via
/// [`MediaSessionController::spawn`].
pub struct MediaSessionController {
    config: Arc<SessionConfig>,
    factory: Arc<dyn MediaTransportFactory>,
    signaling: Arc<dyn SignalingClient>,
    signaling_timeout: Duration,
    restart_policy: ReconnectPolicy,
    restart_delayer: BackoffDelayer,
    restart_at: Option<Instant>,
    state: MediaState,
    session: Option<MediaSession>,
    transport: Option<Box<dyn MediaTransport>>,
    last_error: Option<String>,
    pending: Option<(SessionId, PendingAnswer)>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    status_tx: watch::Sender<MediaStatus>,
}

impl MediaSessionController {
    pub fn new(
        config: Arc<SessionConfig>,
        factory: Arc<dyn MediaTransportFactory>,
        signaling: Arc<dyn SignalingClient>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (status_tx, _) = watch::channel(MediaStatus::default());
        let restart_policy = ReconnectPolicy::disabled();

        Self {
            config,
            factory,
            signaling,
            signaling_timeout: DEFAULT_SIGNALING_TIMEOUT,
            restart_delayer: restart_policy.delayer(),
            restart_policy,
            restart_at: None,
            state: MediaState::Idle,
            session: None,
            transport: None,
            last_error: None,
            pending: None,
            transport_tx,
            transport_rx,
            status_tx,
        }
    }

    pub fn with_signaling_timeout(mut self, timeout: Duration) -> Self {
        self.signaling_timeout = timeout;
        self
    }

    /// Restart after FAILED. Disabled by default: failures are surfaced and
    /// the caller decides.
    pub fn with_restart_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.restart_delayer = policy.delayer();
        self.restart_policy = policy;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<MediaStatus> {
        self.status_tx.subscribe()
    }

    pub fn state(&self) -> MediaState {
        self.state
    }

    pub fn session(&self) -> Option<&MediaSession> {
        self.session.as_ref()
    }

    pub fn restart_deadline(&self) -> Option<Instant> {
        self.restart_at
    }

    /// Tears down any prior session, then negotiates a fresh one.
    ///
    /// Returns once the answer is applied; the session reaches CONNECTED
    /// when the transport reports it.
    pub async fn start(&mut self) -> Result<(), MediaError> {
        let request = self.begin().await?;
        let id = request.id;
        let answer = self.exchange(request).await;
        self.complete(id, answer).await
    }

    /// Releases the old session and publishes a local offer for a new one.
    async fn begin(&mut self) -> Result<OfferRequest, MediaError> {
        if self.state == MediaState::Closed {
            return Err(MediaError::Closed);
        }
        self.restart_at = None;

        if let Err(e) = self.release().await {
            let err = MediaError::from(e);
            self.fail(&err).await;
            return Err(err);
        }

        let id = SessionId::new();
        info!("Starting media session {}", id);
        self.session = Some(MediaSession::new(id));
        self.last_error = None;
        self.set_state(MediaState::Negotiating);

        match self.offer(id).await {
            Ok(request) => Ok(request),
            Err(err) => {
                error!("Media session {} failed to create an offer: {}", id, err);
                self.fail(&err).await;
                Err(err)
            }
        }
    }

    async fn offer(&mut self, id: SessionId) -> Result<OfferRequest, MediaError> {
        let transport = self
            .factory
            .create(id, &self.config, self.transport_tx.clone())
            .await
            .map_err(|e| TransportError::Create(format!("{e:#}")))?;
        let transport = self.transport.insert(transport);

        let offer = transport
            .create_offer()
            .await
            .map_err(|e| TransportError::Negotiation(format!("{e:#}")))?;
        let local = transport
            .set_local_description(offer)
            .await
            .map_err(|e| TransportError::Negotiation(format!("{e:#}")))?;

        if let Some(session) = self.session.as_mut() {
            session.local_offer = Some(local.sdp.clone());
        }
        Ok(OfferRequest { id, offer: local })
    }

    /// The bounded signaling round trip. Owns everything it needs, so the
    /// run loop can drop it to abandon the request.
    fn exchange(&self, request: OfferRequest) -> PendingAnswer {
        let signaling = self.signaling.clone();
        let timeout = self.signaling_timeout;

        async move {
            match tokio::time::timeout(timeout, signaling.exchange(&request)).await {
                Ok(answer) => answer,
                Err(_) => Err(SignalingError::Timeout(timeout)),
            }
        }
        .boxed()
    }

    async fn complete(
        &mut self,
        id: SessionId,
        answer: Result<SessionDescription, SignalingError>,
    ) -> Result<(), MediaError> {
        let result = match answer {
            Ok(answer) => self.apply_answer(id, answer).await,
            Err(e) => Err(e.into()),
        };

        if let Err(err) = &result {
            error!("Media session {} failed to negotiate: {}", id, err);
            self.fail(err).await;
        }
        result
    }

    async fn apply_answer(&mut self, id: SessionId, answer: SessionDescription) -> Result<(), MediaError> {
        debug!("Received answer for media session {}", id);

        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| TransportError::Negotiation("transport released mid-negotiation".into()))?;
        transport
            .set_remote_description(answer.clone())
            .await
            .map_err(|e| TransportError::Negotiation(format!("{e:#}")))?;

        if let Some(session) = self.session.as_mut() {
            session.remote_answer = Some(answer.sdp);
        }
        Ok(())
    }

    /// Starts a session without waiting for the answer; the run loop
    /// completes it.
    async fn launch(&mut self) {
        if let Ok(request) = self.begin().await {
            let id = request.id;
            self.pending = Some((id, self.exchange(request)));
        }
    }

    /// Releases the transport and clears the track binding. Safe in any
    /// state; a closed controller stays closed.
    pub async fn stop(&mut self) {
        self.restart_at = None;
        if let Err(e) = self.release().await {
            warn!("Media transport did not close cleanly: {}", e);
        }
        self.session = None;
        self.last_error = None;
        if self.state != MediaState::Closed {
            self.set_state(MediaState::Idle);
        }
    }

    pub async fn shutdown(&mut self) {
        self.restart_at = None;
        if let Err(e) = self.release().await {
            warn!("Media transport did not close cleanly: {}", e);
        }
        self.session = None;
        self.set_state(MediaState::Closed);
        info!("Media session controller closed");
    }

    async fn release(&mut self) -> Result<(), TransportError> {
        if self.pending.take().is_some() {
            debug!("Abandoned in-flight signaling request");
        }
        if let Some(session) = self.session.as_mut() {
            session.remote_track = None;
        }

        let Some(transport) = self.transport.take() else {
            return Ok(());
        };
        transport
            .close()
            .await
            .map_err(|e| TransportError::Teardown(format!("{e:#}")))
    }

    async fn fail(&mut self, err: &MediaError) {
        if let Err(e) = self.release().await {
            warn!("Media transport did not close cleanly: {}", e);
        }
        self.last_error = Some(err.user_message().to_string());
        self.set_state(MediaState::Failed);

        if let Some(delay) = self.schedule_restart() {
            info!("Media session restarts in {:?}", delay);
        }
    }

    fn schedule_restart(&mut self) -> Option<Duration> {
        if !self.restart_policy.enabled {
            return None;
        }
        let delay = self.restart_delayer.next_delay();
        self.restart_at = Some(Instant::now() + delay);
        Some(delay)
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        let current = self.session.as_ref().map(|s| s.id);
        if current != Some(event.session_id()) {
            debug!("Ignoring event from stale session: {:?}", event);
            return;
        }

        match event {
            TransportEvent::StateChanged(id, PeerState::Connected) => {
                if self.state == MediaState::Negotiating {
                    info!("Media session {} connected", id);
                    self.restart_delayer.reset();
                    self.set_state(MediaState::Connected);
                }
            }

            TransportEvent::StateChanged(
                id,
                state @ (PeerState::Disconnected | PeerState::Failed | PeerState::Closed),
            ) => {
                if self.state.is_live() {
                    warn!("Media session {} lost its transport: {}", id, state);
                    let err = MediaError::from(TransportError::ConnectionLost(state.to_string()));
                    self.fail(&err).await;
                }
            }

            TransportEvent::StateChanged(_, _) => {}

            TransportEvent::Track(id, track) => {
                if !self.state.is_live() {
                    return;
                }
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if session.remote_track.is_some() {
                    debug!("Session {} already has a live track; ignoring {:?}", id, track);
                    return;
                }
                info!("Bound remote track {} to session {}", track.track_id, id);
                session.remote_track = Some(track);
                self.publish();
            }
        }
    }

    async fn handle_command(&mut self, cmd: MediaCommand) -> bool {
        match cmd {
            MediaCommand::Start => self.launch().await,
            MediaCommand::Stop => self.stop().await,
            MediaCommand::Shutdown { done } => {
                self.shutdown().await;
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    fn set_state(&mut self, state: MediaState) {
        if self.state != state {
            debug!("Media state {} -> {}", self.state, state);
        }
        self.state = state;
        if let Some(session) = self.session.as_mut() {
            session.state = state;
        }
        self.publish();
    }

    fn publish(&self) {
        let status = MediaStatus {
            state: self.state,
            session_id: self.session.as_ref().map(|s| s.id),
            track: self.session.as_ref().and_then(|s| s.remote_track.clone()),
            error: (self.state == MediaState::Failed)
                .then(|| self.last_error.clone())
                .flatten(),
        };
        self.status_tx.send_replace(status);
    }

    pub async fn run(mut self, mut command_rx: mpsc::Receiver<MediaCommand>) {
        info!("Media session loop started");

        loop {
            let restart_at = self.restart_at;

            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed. Shutting down media session.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    // The controller keeps a sender, so the channel never closes.
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }

                (id, answer) = next_answer(&mut self.pending) => {
                    self.pending = None;
                    let _ = self.complete(id, answer).await;
                }

                _ = sleep_until_deadline(restart_at) => {
                    info!("Restarting failed media session");
                    self.launch().await;
                }
            }
        }

        info!("Media session loop finished");
    }

    pub fn spawn(self) -> MediaSessionHandle {
        let (command_tx, command_rx) = mpsc::channel(32);
        let status_rx = self.subscribe();
        tokio::spawn(self.run(command_rx));

        MediaSessionHandle {
            command_tx,
            status_rx,
        }
    }
}

/// Cloneable front for a spawned [`MediaSessionController`].
#[derive(Clone)]
pub struct MediaSessionHandle {
    command_tx: mpsc::Sender<MediaCommand>,
    status_rx: watch::Receiver<MediaStatus>,
}

impl MediaSessionHandle {
    pub async fn start(&self) {
        let _ = self.command_tx.send(MediaCommand::Start).await;
    }

    pub async fn stop(&self) {
        let _ = self.command_tx.send(MediaCommand::Stop).await;
    }

    /// Waits until the transport is released and the state is CLOSED.
    pub async fn shutdown(&self) {
        let (done, wait) = oneshot::channel();
        if self.command_tx.send(MediaCommand::Shutdown { done }).await.is_ok() {
            let _ = wait.await;
        }
    }

    pub fn status(&self) -> MediaStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MediaStatus> {
        self.status_rx.clone()
    }
}
