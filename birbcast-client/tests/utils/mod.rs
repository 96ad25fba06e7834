pub mod fake_socket;
pub mod fake_transport;
pub mod wait_helpers;

pub use fake_socket::*;
pub use fake_transport::*;
pub use mock_signaling::*;
pub use wait_helpers::*;
