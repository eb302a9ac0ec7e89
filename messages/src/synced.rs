//! Internal signal that a federated leader acknowledged its minute.

use fedelect_types::{MsgHash, Position, ServerId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ElectionInbox, Message, MessageError, MessageType, ValidationStatus};

/// Raised by the process list when a leader's end-of-minute acknowledgment
/// arrives. Marks that leader's slot as synced for the minute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderSynced {
    pub server_id: ServerId,
    pub db_height: u32,
    pub minute: u8,
}

impl LeaderSynced {
    pub fn new(server_id: ServerId, position: Position) -> Self {
        Self {
            server_id,
            db_height: position.height,
            minute: position.minute,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.db_height, self.minute)
    }
}

impl Message for LeaderSynced {
    fn message_type(&self) -> MessageType {
        MessageType::LeaderSynced
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::now()
    }

    fn hash(&self) -> MsgHash {
        MsgHash::ZERO
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

    fn follower_execute(&self, _inbox: &dyn ElectionInbox) {}
}

impl fmt::Display for LeaderSynced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20} {:?} dbheight {} minute {}",
            "Leader Synced", self.server_id, self.db_height, self.minute
        )
    }
}
