mod media_command;
mod media_controller;
mod media_session;

pub use media_command::*;
pub use media_controller::*;
pub use media_session::*;
