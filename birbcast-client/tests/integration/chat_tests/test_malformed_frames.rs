use birbcast_client::chat::SocketState;
use birbcast_client::transport::SocketEvent;

use super::{LATE, create_chat_controller, message_frame};
use crate::integration::init_tracing;

#[tokio::test]
async fn test_malformed_frames_are_counted_and_dropped() {
    init_tracing();

    let (mut controller, _connector) = create_chat_controller();
    let snapshot = controller.subscribe();
    controller.join("alice").await.expect("join failed");
    controller.handle_socket_event(SocketEvent::Opened).await;

    controller
        .handle_socket_event(SocketEvent::Message(message_frame("bob", "kept", LATE)))
        .await;

    for frame in [
        "not json",
        r#"{"type":"typing","username":"bob"}"#,
        r#"{"type":"message","username":"bob"}"#,
        r#"{"type":"message","username":"bob","text":"x","timestamp":"yesterday"}"#,
    ] {
        controller
            .handle_socket_event(SocketEvent::Message(frame.to_string()))
            .await;
    }

    assert_eq!(controller.malformed_frames(), 4);
    assert_eq!(controller.events().len(), 1);
    assert_eq!(controller.state(), SocketState::Open);
    assert_eq!(snapshot.borrow().malformed_frames, 4);
}

#[tokio::test]
async fn test_broken_history_entries_are_counted() {
    init_tracing();

    let (mut controller, _connector) = create_chat_controller();
    controller.join("alice").await.expect("join failed");

    let history = r#"{"type":"history","messages":[
        {"type":"message","username":"bob","text":"ok","timestamp":1704153540000},
        {"type":"message","text":"no user","timestamp":1704153540000},
        42
    ]}"#;
    controller
        .handle_socket_event(SocketEvent::Message(history.to_string()))
        .await;

    assert_eq!(controller.events().len(), 1);
    assert_eq!(controller.malformed_frames(), 2);
}
