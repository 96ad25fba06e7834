use birbcast_client::transport::SocketEvent;
use birbcast_core::ChatEvent;

use super::{LATE, create_chat_controller, system_frame};
use crate::integration::init_tracing;

#[tokio::test]
async fn test_own_join_notice_is_suppressed() {
    init_tracing();

    let (mut controller, _connector) = create_chat_controller();
    controller.join("alice").await.expect("join failed");
    controller.handle_socket_event(SocketEvent::Opened).await;

    controller
        .handle_socket_event(SocketEvent::Message(system_frame("alice joined the chat", LATE)))
        .await;
    assert!(controller.events().is_empty());

    controller
        .handle_socket_event(SocketEvent::Message(system_frame("bob joined the chat", LATE + 1)))
        .await;
    assert_eq!(
        controller.events(),
        &[ChatEvent::SystemNotice {
            text: "bob joined the chat".into(),
            timestamp_ms: LATE + 1,
        }]
    );

    controller
        .handle_socket_event(SocketEvent::Message(system_frame("alice left the chat", LATE + 2)))
        .await;
    assert_eq!(controller.events().len(), 1);
}

#[tokio::test]
async fn test_history_drops_system_notices() {
    init_tracing();

    let (mut controller, _connector) = create_chat_controller();
    controller.join("alice").await.expect("join failed");

    let history = serde_json::json!({
        "type": "history",
        "messages": [
            {"type": "system", "text": "bob joined the chat", "timestamp": LATE},
            {"type": "message", "username": "bob", "text": "hey", "timestamp": LATE + 1},
        ]
    });
    controller
        .handle_socket_event(SocketEvent::Message(history.to_string()))
        .await;

    assert_eq!(controller.events().len(), 1);
    assert!(controller.events()[0].is_message());
}
