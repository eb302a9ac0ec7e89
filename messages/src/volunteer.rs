//! Self-nomination of an audit server to replace a faulted leader.

use fedelect_crypto::blake2b_256_multi;
use fedelect_types::{MsgHash, Position, Server, ServerId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::message::decode_prefix;
use crate::{ElectionInbox, ElectionMessage, Message, MessageError, MessageType, ValidationStatus};

/// An audit server volunteering to take over federated slot `server_idx`.
///
/// Immutable once built. Receivers recompute the priority ranking for
/// `(db_height, minute, server_idx, round)` and drop the message unless
/// `weight` matches and the sender is the top-ranked candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerAudit {
    pub server_name: String,
    /// Federated slot the volunteer wants to fill.
    pub server_idx: u32,
    pub server_id: ServerId,
    pub weight: u64,
    pub db_height: u32,
    pub minute: u8,
    pub round: u32,
    pub timestamp: Timestamp,
}

impl VolunteerAudit {
    pub fn new(
        volunteer: &Server,
        slot: u32,
        weight: u64,
        position: Position,
        round: u32,
        now: Timestamp,
    ) -> Self {
        Self {
            server_name: volunteer.name.clone(),
            server_idx: slot,
            server_id: volunteer.id,
            weight,
            db_height: position.height,
            minute: position.minute,
            round,
            timestamp: now,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.db_height, self.minute)
    }

    pub fn slot(&self) -> usize {
        self.server_idx as usize
    }
}

impl Message for VolunteerAudit {
    fn message_type(&self) -> MessageType {
        MessageType::VolunteerAudit
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn hash(&self) -> MsgHash {
        MsgHash::new(blake2b_256_multi(&[
            &[MessageType::VolunteerAudit.as_byte()],
            self.server_name.as_bytes(),
            &self.server_idx.to_be_bytes(),
            self.server_id.as_bytes(),
            &self.weight.to_be_bytes(),
            &self.db_height.to_be_bytes(),
            &[self.minute],
            &self.round.to_be_bytes(),
            &self.timestamp.as_millis().to_be_bytes(),
        ]))
    }

    fn marshal_binary(&self) -> Result<Vec<u8>, MessageError> {
        Ok(bincode::serialize(self)?)
    }

    fn unmarshal_binary_data<'a>(&mut self, data: &'a [u8]) -> Result<&'a [u8], MessageError> {
        let (decoded, rest) = decode_prefix::<Self>(data)?;
        *self = decoded;
        Ok(rest)
    }

    fn validate(&self) -> ValidationStatus {
        if self.round == 0 || self.server_name.is_empty() {
            return ValidationStatus::Invalid;
        }
        ValidationStatus::Valid
    }

    fn follower_execute(&self, inbox: &dyn ElectionInbox) {
        inbox.enqueue(ElectionMessage::VolunteerAudit(self.clone()));
    }
}

impl fmt::Display for VolunteerAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20} {:>10} slot {} round {} weight {} dbheight {} minute {}",
            "Volunteer Audit",
            self.server_name,
            self.server_idx,
            self.round,
            self.weight,
            self.db_height,
            self.minute
        )
    }
}
