//! Client-side coordinator for a live camera stream: media session, chat,
//! viewer presence and the view model built from them.

pub mod chat;
pub mod config;
mod coordinator;
mod error;
pub mod notification;
pub mod presence;
pub mod reconnect;
pub mod relay;
pub mod session;
pub mod signaling;
pub mod transport;
pub mod view;

pub use config::{ClientConfig, ConfigError};
pub use coordinator::*;
pub use error::*;
pub use notification::NotificationState;
