//! A federated leader's corroboration of a volunteer.

use fedelect_crypto::blake2b_256_multi;
use fedelect_types::{MsgHash, Position, Server, ServerId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::message::decode_prefix;
use crate::{
    ElectionInbox, ElectionMessage, Message, MessageError, MessageType, ValidationStatus,
    VolunteerAudit,
};

/// Sent by a surviving federated leader once it has accepted a volunteer.
///
/// A volunteer is installed once acks from a majority of the federated set
/// have been counted for the same `(server_idx, round, volunteer_id)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerAck {
    /// Name of the acknowledging leader.
    pub server_name: String,
    /// Identity of the acknowledging leader.
    pub server_id: ServerId,
    pub volunteer_id: ServerId,
    pub server_idx: u32,
    pub round: u32,
    pub db_height: u32,
    pub minute: u8,
    pub timestamp: Timestamp,
}

impl VolunteerAck {
    pub fn new(acker: &Server, volunteer: &VolunteerAudit, now: Timestamp) -> Self {
        Self {
            server_name: acker.name.clone(),
            server_id: acker.id,
            volunteer_id: volunteer.server_id,
            server_idx: volunteer.server_idx,
            round: volunteer.round,
            db_height: volunteer.db_height,
            minute: volunteer.minute,
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

impl Message for VolunteerAck {
    fn message_type(&self) -> MessageType {
        MessageType::VolunteerAck
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn hash(&self) -> MsgHash {
        MsgHash::new(blake2b_256_multi(&[
            &[MessageType::VolunteerAck.as_byte()],
            self.server_name.as_bytes(),
            self.server_id.as_bytes(),
            self.volunteer_id.as_bytes(),
            &self.server_idx.to_be_bytes(),
            &self.round.to_be_bytes(),
            &self.db_height.to_be_bytes(),
            &[self.minute],
            &self.timestamp.as_millis().to_be_bytes(),
        ]))
    }

    /// Repeats of the same ack differ only in timestamp.
    fn repeat_hash(&self) -> MsgHash {
        MsgHash::new(blake2b_256_multi(&[
            &[MessageType::VolunteerAck.as_byte()],
            self.server_id.as_bytes(),
            self.volunteer_id.as_bytes(),
            &self.server_idx.to_be_bytes(),
            &self.round.to_be_bytes(),
            &self.db_height.to_be_bytes(),
            &[self.minute],
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
        if self.round == 0 || self.server_id == self.volunteer_id {
            return ValidationStatus::Invalid;
        }
        ValidationStatus::Valid
    }

    fn follower_execute(&self, inbox: &dyn ElectionInbox) {
        inbox.enqueue(ElectionMessage::VolunteerAck(self.clone()));
    }
}

impl fmt::Display for VolunteerAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20} {:>10} slot {} round {} volunteer {:?} dbheight {} minute {}",
            "Volunteer Ack",
            self.server_name,
            self.server_idx,
            self.round,
            self.volunteer_id,
            self.db_height,
            self.minute
        )
    }
}
