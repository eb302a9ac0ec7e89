//! Internal timeout event raised when a minute's acknowledgments are overdue.

use fedelect_crypto::blake2b_256_multi;
use fedelect_types::{MsgHash, Position, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ElectionInbox, Message, MessageError, MessageType, ValidationStatus};

/// A locally raised signal that the given position timed out.
///
/// It carries no wire payload: marshaling yields an empty body and any
/// payload (including an empty one) is consumed without effect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutInternal {
    pub server_name: String,
    pub db_height: u32,
    pub minute: u8,
    /// Hash of the message whose acknowledgment timed out, if any.
    pub message_hash: Option<MsgHash>,
}

impl TimeoutInternal {
    pub fn new(server_name: impl Into<String>, position: Position) -> Self {
        Self {
            server_name: server_name.into(),
            db_height: position.height,
            minute: position.minute,
            message_hash: None,
        }
    }

    pub fn with_message_hash(mut self, hash: MsgHash) -> Self {
        self.message_hash = Some(hash);
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.db_height, self.minute)
    }
}

impl Message for TimeoutInternal {
    fn message_type(&self) -> MessageType {
        MessageType::TimeoutInternal
    }

    /// Timeouts are evaluated when handled, so they always read as "now".
    fn timestamp(&self) -> Timestamp {
        Timestamp::now()
    }

    /// Hash of the message whose acknowledgment timed out.
    fn hash(&self) -> MsgHash {
        self.message_hash.unwrap_or(MsgHash::ZERO)
    }

    /// The timeout's own identity: who raised it and for which position.
    fn repeat_hash(&self) -> MsgHash {
        MsgHash::new(blake2b_256_multi(&[
            &[MessageType::TimeoutInternal.as_byte()],
            self.server_name.as_bytes(),
            &self.db_height.to_be_bytes(),
            &[self.minute],
        ]))
    }

    fn marshal_binary(&self) -> Result<Vec<u8>, MessageError> {
        Ok(Vec::new())
    }

    fn unmarshal_binary_data<'a>(&mut self, data: &'a [u8]) -> Result<&'a [u8], MessageError> {
        Ok(&data[data.len()..])
    }

    fn validate(&self) -> ValidationStatus {
        ValidationStatus::Valid
    }

    // The producer feeds timeouts straight into the election loop.
    fn follower_execute(&self, _inbox: &dyn ElectionInbox) {}
}

impl fmt::Display for TimeoutInternal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20} {:>10} dbheight {} minute {}",
            "Timeout Internal", self.server_name, self.db_height, self.minute
        )
    }
}
