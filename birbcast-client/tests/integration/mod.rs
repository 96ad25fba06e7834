pub mod presence_tests;
pub mod relay_tests;

use birbcast_client::session::MediaSessionController;
use birbcast_core::SessionConfig;
use std::sync::Arc;
use tracing::Level;
use url::Url;

use crate::utils::{FakeTransportFactory, MockSignaling};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_session_config() -> Arc<SessionConfig> {
    let url = |s: &str| Url::parse(s).unwrap();
    Arc::new(
        SessionConfig::new(
            url("http://stream.test/webrtc/offer"),
            url("ws://stream.test/chat"),
            url("ws://stream.test/viewers"),
        )
        .with_frame_endpoint(url("ws://stream.test/stream")),
    )
}

pub fn create_media_controller(
    signaling: MockSignaling,
) -> (MediaSessionController, FakeTransportFactory) {
    let factory = FakeTransportFactory::new();
    let controller = MediaSessionController::new(
        test_session_config(),
        Arc::new(factory.clone()),
        Arc::new(signaling),
    );
    (controller, factory)
}
