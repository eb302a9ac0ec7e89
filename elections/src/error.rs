use fedelect_types::ServerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("federated set must contain at least one leader")]
    EmptyFederated,

    #[error("server {0} appears more than once in the roster")]
    DuplicateServer(ServerId),

    #[error("federated set of {0} leaders does not fit a 32-bit slot index")]
    TooManyLeaders(usize),

    #[error("broadcast failed: {0}")]
    Broadcast(String),
}
