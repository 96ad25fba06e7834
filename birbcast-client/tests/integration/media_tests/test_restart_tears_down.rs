use birbcast_client::transport::{PeerState, TransportEvent};
use birbcast_client::{MediaError, TransportError};
use birbcast_core::MediaState;

use crate::integration::{create_media_controller, init_tracing};
use crate::utils::{MockSignaling, wait_for};

#[tokio::test]
async fn test_restart_closes_previous_session_first() {
    init_tracing();

    let (mut controller, factory) = create_media_controller(MockSignaling::echo());

    controller.start().await.expect("first start failed");
    let first = factory.probe(0).await;
    controller
        .handle_transport_event(TransportEvent::StateChanged(
            first.session_id,
            PeerState::Connected,
        ))
        .await;
    assert_eq!(controller.state(), MediaState::Connected);

    controller.start().await.expect("restart failed");
    let second = factory.probe(1).await;

    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(factory.max_open(), 1);
    assert_eq!(controller.state(), MediaState::Negotiating);
    assert_eq!(controller.session().map(|s| s.id), Some(second.session_id));
}

#[tokio::test]
async fn test_stale_session_events_are_ignored() {
    init_tracing();

    let (controller, factory) = create_media_controller(MockSignaling::echo());
    let handle = controller.spawn();
    let mut status = handle.subscribe();

    handle.start().await;
    handle.start().await;
    assert!(factory.wait_for_transports(2, 5000).await);

    let stale = factory.probe(0).await;
    let live = factory.probe(1).await;

    stale.emit_state(PeerState::Connected).await;
    stale.emit_state(PeerState::Failed).await;
    live.emit_state(PeerState::Connected).await;

    let connected = wait_for(&mut status, |s| s.state == MediaState::Connected)
        .await
        .expect("live session never connected");
    assert_eq!(connected.session_id, Some(live.session_id));
    assert_eq!(factory.max_open(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_teardown_blocks_new_offer() {
    init_tracing();

    let signaling = MockSignaling::echo();
    let (mut controller, factory) = create_media_controller(signaling.clone());

    controller.start().await.expect("first start failed");
    factory.fail_close(true);

    let err = controller.start().await.expect_err("teardown failure must fail");
    assert!(matches!(
        err,
        MediaError::Transport(TransportError::Teardown(_))
    ));
    assert_eq!(controller.state(), MediaState::Failed);
    assert_eq!(signaling.requests().await.len(), 1);
    assert_eq!(factory.probes().await.len(), 1);
}
