use birbcast_client::{MediaError, SignalingError};
use birbcast_core::MediaState;
use std::time::Duration;

use crate::integration::{create_media_controller, init_tracing};
use crate::utils::{MockSignaling, SignalingMode, wait_for};

#[tokio::test]
async fn test_http_500_fails_with_no_open_transport() {
    init_tracing();

    let signaling = MockSignaling::new(SignalingMode::Status(500));
    let (controller, factory) = create_media_controller(signaling.clone());
    signaling.observe(controller.subscribe()).await;

    let handle = controller.spawn();
    let mut status = handle.subscribe();
    handle.start().await;

    let failed = wait_for(&mut status, |s| s.state == MediaState::Failed)
        .await
        .expect("session never failed");

    assert_eq!(signaling.states_seen().await, vec![MediaState::Negotiating]);
    assert_eq!(
        failed.error.as_deref(),
        Some(MediaError::from(SignalingError::Status(500)).user_message())
    );
    assert_eq!(factory.open_count(), 0);
    assert!(factory.probe(0).await.is_closed());

    // No automatic retry.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(signaling.requests().await.len(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_signaling_timeout_is_bounded() {
    init_tracing();

    let (controller, factory) = create_media_controller(MockSignaling::new(SignalingMode::Hang));
    let mut controller = controller.with_signaling_timeout(Duration::from_millis(100));

    let err = controller.start().await.expect_err("hung signaling must fail");
    assert_eq!(
        err,
        MediaError::Signaling(SignalingError::Timeout(Duration::from_millis(100)))
    );
    assert_eq!(controller.state(), MediaState::Failed);
    assert_eq!(factory.open_count(), 0);
}

#[tokio::test]
async fn test_shutdown_abandons_hung_negotiation() {
    init_tracing();

    let signaling = MockSignaling::new(SignalingMode::Hang);
    let (controller, factory) = create_media_controller(signaling.clone());
    let handle = controller
        .with_signaling_timeout(Duration::from_secs(30))
        .spawn();

    handle.start().await;
    assert!(signaling.wait_for_requests(1, 5000).await);
    assert_eq!(factory.open_count(), 1);

    tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .expect("shutdown waited on the signaling request");

    assert_eq!(handle.status().state, MediaState::Closed);
    assert_eq!(factory.open_count(), 0);
    assert!(factory.probe(0).await.is_closed());
}

#[tokio::test]
async fn test_restart_replaces_hung_negotiation() {
    init_tracing();

    let signaling = MockSignaling::new(SignalingMode::Hang);
    let (controller, factory) = create_media_controller(signaling.clone());
    let handle = controller
        .with_signaling_timeout(Duration::from_secs(30))
        .spawn();
    let mut status = handle.subscribe();

    handle.start().await;
    assert!(signaling.wait_for_requests(1, 5000).await);
    let first = status.borrow().session_id;

    handle.start().await;
    assert!(signaling.wait_for_requests(2, 5000).await);
    let second = wait_for(&mut status, |s| s.session_id != first)
        .await
        .expect("restart never began");

    assert_eq!(second.state, MediaState::Negotiating);
    assert!(factory.probe(0).await.is_closed());
    assert_eq!(factory.open_count(), 1);
    assert_eq!(factory.max_open(), 1);

    tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .expect("shutdown waited on the signaling request");
    assert_eq!(factory.open_count(), 0);
}
