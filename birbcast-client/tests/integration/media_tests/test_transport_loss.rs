use birbcast_client::reconnect::ReconnectPolicy;
use birbcast_client::transport::PeerState;
use birbcast_client::{MediaError, TransportError};
use birbcast_core::MediaState;
use std::time::Duration;

use crate::integration::{create_media_controller, init_tracing};
use crate::utils::{MockSignaling, wait_for};

#[tokio::test]
async fn test_transport_failure_surfaces_error() {
    init_tracing();

    let (controller, factory) = create_media_controller(MockSignaling::echo());
    let handle = controller.spawn();
    let mut status = handle.subscribe();

    handle.start().await;
    assert!(factory.wait_for_transports(1, 5000).await);
    let probe = factory.probe(0).await;
    probe.emit_state(PeerState::Connected).await;
    wait_for(&mut status, |s| s.state == MediaState::Connected)
        .await
        .expect("never connected");

    probe.emit_state(PeerState::Failed).await;
    let failed = wait_for(&mut status, |s| s.state == MediaState::Failed)
        .await
        .expect("loss not surfaced");

    let expected = MediaError::from(TransportError::ConnectionLost("failed".into()));
    assert_eq!(failed.error.as_deref(), Some(expected.user_message()));
    assert!(probe.is_closed());

    // Restart is caller-triggered.
    handle.start().await;
    assert!(factory.wait_for_transports(2, 5000).await);
    factory.probe(1).await.emit_state(PeerState::Connected).await;
    wait_for(&mut status, |s| s.state == MediaState::Connected)
        .await
        .expect("restart never connected");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_auto_restart_when_enabled() {
    init_tracing();

    let (controller, factory) = create_media_controller(MockSignaling::echo());
    let handle = controller
        .with_restart_policy(ReconnectPolicy::fixed(Duration::from_secs(3)))
        .spawn();
    let mut status = handle.subscribe();

    handle.start().await;
    assert!(factory.wait_for_transports(1, 5000).await);
    let first = factory.probe(0).await;
    first.emit_state(PeerState::Disconnected).await;

    wait_for(&mut status, |s| s.state == MediaState::Failed)
        .await
        .expect("loss not surfaced");

    assert!(factory.wait_for_transports(2, 10_000).await);
    let second = factory.probe(1).await;
    assert!(first.is_closed());
    second.emit_state(PeerState::Connected).await;

    let connected = wait_for(&mut status, |s| s.state == MediaState::Connected)
        .await
        .expect("auto restart never connected");
    assert_eq!(connected.session_id, Some(second.session_id));

    handle.shutdown().await;
}
