mod chat_command;
mod chat_controller;
mod chat_log;
mod chat_session;

pub use chat_command::*;
pub use chat_controller::*;
pub use chat_log::*;
pub use chat_session::*;
