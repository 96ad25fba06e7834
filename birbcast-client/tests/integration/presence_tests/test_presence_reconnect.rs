use birbcast_client::presence::PresenceCounter;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{init_tracing, test_session_config};
use crate::utils::{FakeSocketConnector, wait_for};

fn create_counter(connector: &FakeSocketConnector) -> PresenceCounter {
    PresenceCounter::new(
        test_session_config().presence_endpoint().clone(),
        Arc::new(connector.clone()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_five_seconds_after_close() {
    init_tracing();

    let connector = FakeSocketConnector::new();
    let handle = create_counter(&connector).spawn();
    let mut snapshot = handle.subscribe();

    assert!(connector.wait_for_connections(1, 1000).await);
    connector.remote(0).await.push(r#"{"count":4}"#).await;
    wait_for(&mut snapshot, |s| s.count == 4)
        .await
        .expect("count not applied");

    connector.remote(0).await.drop_connection(None).await;
    let closed = wait_for(&mut snapshot, |s| !s.connected)
        .await
        .expect("close not observed");
    assert_eq!(closed.count, 4);

    tokio::time::sleep(Duration::from_millis(4900)).await;
    assert_eq!(connector.attempts(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(connector.attempts(), 2);
    wait_for(&mut snapshot, |s| s.connected)
        .await
        .expect("never reconnected");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_refused_connections_keep_retrying() {
    init_tracing();

    let connector = FakeSocketConnector::new();
    connector.refuse_next(3);
    let handle = create_counter(&connector).spawn();
    let mut snapshot = handle.subscribe();

    // Fixed delay: attempts at 0, 5, 10 and 15 seconds.
    wait_for(&mut snapshot, |s| s.connected)
        .await
        .expect("never connected");
    assert_eq!(connector.attempts(), 4);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_reconnect() {
    init_tracing();

    let connector = FakeSocketConnector::new();
    let mut counter = create_counter(&connector);
    connector.refuse_next(1);

    counter.start().await;
    assert!(counter.reconnect_pending());

    counter.shutdown().await;
    assert!(!counter.reconnect_pending());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(connector.attempts(), 1);
}
