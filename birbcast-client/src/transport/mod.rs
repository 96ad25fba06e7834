mod media_transport;
mod rtc_transport;
mod socket;
mod socket_link;
mod transport_event;
mod ws_socket;

pub use media_transport::*;
pub use rtc_transport::*;
pub use socket::*;
pub use socket_link::*;
pub use transport_event::*;
pub use ws_socket::*;
