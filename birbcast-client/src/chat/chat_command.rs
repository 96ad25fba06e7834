use crate::error::ChatError;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ChatCommand {
    Join {
        username: String,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Send {
        text: String,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Rejoin {
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Leave,
    Shutdown {
        done: oneshot::Sender<()>,
    },
}
