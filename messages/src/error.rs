use thiserror::Error;

use crate::MessageType;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("empty message frame")]
    Empty,

    #[error("message too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("unknown message type tag 0x{0:02x}")]
    UnknownType(u8),

    #[error("{0:?} is an internal event and never goes on the wire")]
    NotWire(MessageType),

    #[error("{0} trailing bytes after message body")]
    TrailingBytes(usize),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
