use crate::transport::media_transport::{MediaTransport, MediaTransportFactory};
use crate::transport::transport_event::{PeerState, TransportEvent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use birbcast_core::utils::filter_sdp_candidates;
use birbcast_core::{
    IceServerConfig, SessionConfig, SessionDescription, SessionId, TrackHandle, TrackKind,
    TransportPolicy,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_remote::TrackRemote;

const DEFAULT_GATHER_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds [`RtcTransport`]s on top of webrtc-rs.
#[derive(Debug, Clone)]
pub struct RtcTransportFactory {
    gather_timeout: Duration,
}

impl RtcTransportFactory {
    pub fn new(gather_timeout: Duration) -> Self {
        Self { gather_timeout }
    }
}

impl Default for RtcTransportFactory {
    fn default() -> Self {
        Self::new(DEFAULT_GATHER_TIMEOUT)
    }
}

#[async_trait]
impl MediaTransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        session_id: SessionId,
        config: &SessionConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>> {
        let transport = RtcTransport::new(session_id, config, events, self.gather_timeout).await?;
        Ok(Box::new(transport))
    }
}

pub struct RtcTransport {
    pub session_id: SessionId,
    pub peer_connection: Arc<RTCPeerConnection>,
    policy: TransportPolicy,
    gather_timeout: Duration,
}

impl RtcTransport {
    /// Creates the peer connection with one receive-only video transceiver.
    /// `event_tx` receives state changes and the remote track.
    pub async fn new(
        session_id: SessionId,
        config: &SessionConfig,
        event_tx: mpsc::Sender<TransportEvent>,
        gather_timeout: Duration,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let policy = config.transport_policy();
        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers().iter().map(to_rtc_ice_server).collect(),
            ice_transport_policy: match policy {
                TransportPolicy::Any => RTCIceTransportPolicy::All,
                TransportPolicy::RelayOnly => RTCIceTransportPolicy::Relay,
            },
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        peer_connection
            .add_transceiver_from_kind(
                RTPCodecType::Video,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .context("Failed to add receive-only video transceiver")?;

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed for session {}: {}", session_id, s);
                    let Some(state) = map_state(s) else { return };
                    let _ = tx.send(TransportEvent::StateChanged(session_id, state)).await;
                })
            },
        ));

        let track_tx = event_tx.clone();
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let handle = TrackHandle {
                    stream_id: track.stream_id(),
                    track_id: track.id(),
                    kind: match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    },
                };
                debug!("Remote track {:?} for session {}", handle, session_id);
                let _ = tx.send(TransportEvent::Track(session_id, handle)).await;

                tokio::spawn(drain_track(track, session_id));
            })
        }));

        Ok(Self {
            session_id,
            peer_connection,
            policy,
            gather_timeout,
        })
    }
}

#[async_trait]
impl MediaTransport for RtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn set_local_description(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription> {
        let mut gathering = self.peer_connection.gathering_complete_promise().await;

        let desc = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection.set_local_description(desc).await?;

        if tokio::time::timeout(self.gather_timeout, gathering.recv())
            .await
            .is_err()
        {
            warn!(
                "ICE gathering for session {} did not finish within {:?}",
                self.session_id, self.gather_timeout
            );
        }

        let local = self
            .peer_connection
            .local_description()
            .await
            .context("Local description missing after it was set")?;

        Ok(SessionDescription::offer(filter_sdp_candidates(
            &local.sdp,
            self.policy,
        )))
    }

    async fn set_remote_description(&self, answer: SessionDescription) -> Result<()> {
        let desc = RTCSessionDescription::answer(answer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn map_state(state: RTCPeerConnectionState) -> Option<PeerState> {
    match state {
        RTCPeerConnectionState::New => Some(PeerState::New),
        RTCPeerConnectionState::Connecting => Some(PeerState::Connecting),
        RTCPeerConnectionState::Connected => Some(PeerState::Connected),
        RTCPeerConnectionState::Disconnected => Some(PeerState::Disconnected),
        RTCPeerConnectionState::Failed => Some(PeerState::Failed),
        RTCPeerConnectionState::Closed => Some(PeerState::Closed),
        RTCPeerConnectionState::Unspecified => None,
    }
}

/// Reads rtp off the remote track until it ends, so receive buffers never
/// back up.
async fn drain_track(track: Arc<TrackRemote>, session_id: SessionId) {
    let mut packets: u64 = 0;
    while track.read_rtp().await.is_ok() {
        packets += 1;
    }
    debug!(
        "Remote track {} of session {} ended after {} packets",
        track.id(),
        session_id,
        packets
    );
}
