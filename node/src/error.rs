use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("election error: {0}")]
    Election(#[from] fedelect_elections::ElectionError),

    #[error("message error: {0}")]
    Message(#[from] fedelect_messages::MessageError),

    #[error("identity error: {0}")]
    Types(#[from] fedelect_types::TypesError),

    #[error("config error: {0}")]
    Config(String),

    #[error("election service input queue is full")]
    QueueFull,

    #[error("election service has stopped")]
    ChannelClosed,
}
