use birbcast_client::relay::FrameFeed;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{init_tracing, test_session_config};
use crate::utils::{FakeSocketConnector, wait_for};

fn create_feed(connector: &FakeSocketConnector) -> FrameFeed {
    let config = test_session_config();
    let endpoint = config.frame_endpoint().expect("no frame endpoint").clone();
    FrameFeed::new(endpoint, Arc::new(connector.clone()))
}

#[tokio::test]
async fn test_latest_frame_wins() {
    init_tracing();

    let connector = FakeSocketConnector::new();
    let handle = create_feed(&connector).spawn();
    let mut snapshot = handle.subscribe();

    assert!(connector.wait_for_connections(1, 5000).await);
    let remote = connector.remote(0).await;
    assert_eq!(remote.url.path(), "/stream");

    remote
        .push(r#"{"type":"video","frame":"/9j/4A==","fps":24.6,"viewers":"6","timestamp":"2024-01-01 12:00:00"}"#)
        .await;
    remote.push("/9j/4AAQ").await;

    let latest = wait_for(&mut snapshot, |s| s.frames_received == 2)
        .await
        .expect("frames not received");
    let frame = latest.frame.expect("no frame kept");
    assert_eq!(frame.fps, None);
    assert_eq!(frame.data_uri(), "data:image/jpeg;base64,/9j/4AAQ");
    assert!(latest.connected);

    remote.push(r#"{"type":"audio","frame":"AAAA"}"#).await;
    remote.push(r#"{"type":"video","frame":""}"#).await;
    let after = wait_for(&mut snapshot, |s| s.malformed_frames == 2)
        .await
        .expect("malformed frames not counted");
    assert_eq!(after.frames_received, 2);
    assert_eq!(after.frame.map(|f| f.data_uri()), Some(frame.data_uri()));

    handle.shutdown().await;
    assert!(remote.is_closed());
}

#[tokio::test]
async fn test_frame_metadata_is_kept() {
    init_tracing();

    let connector = FakeSocketConnector::new();
    let handle = create_feed(&connector).spawn();
    let mut snapshot = handle.subscribe();

    assert!(connector.wait_for_connections(1, 5000).await);
    connector
        .remote(0)
        .await
        .push(r#"{"type":"video","frame":"/9j/4A==","fps":24.6,"viewers":"6","timestamp":"2024-01-01 12:00:00"}"#)
        .await;

    let received = wait_for(&mut snapshot, |s| s.frame.is_some())
        .await
        .expect("frame not received");
    let frame = received.frame.expect("no frame kept");
    assert_eq!(frame.fps, Some(25));
    assert_eq!(frame.viewers, Some(6));
    assert_eq!(frame.captured_at.as_deref(), Some("2024-01-01 12:00:00"));
    assert_eq!(&frame.jpeg[..2], &[0xffu8, 0xd8]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_feed_reconnects_after_close() {
    init_tracing();

    let connector = FakeSocketConnector::new();
    let handle = create_feed(&connector).spawn();
    let mut snapshot = handle.subscribe();

    assert!(connector.wait_for_connections(1, 1000).await);
    connector.remote(0).await.push("/9j/4A==").await;
    wait_for(&mut snapshot, |s| s.frame.is_some())
        .await
        .expect("frame not received");

    connector.remote(0).await.drop_connection(Some("relay restart")).await;
    let closed = wait_for(&mut snapshot, |s| !s.connected)
        .await
        .expect("close not observed");
    assert!(closed.frame.is_some());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(connector.attempts(), 2);
    wait_for(&mut snapshot, |s| s.connected)
        .await
        .expect("never reconnected");

    handle.shutdown().await;
}
