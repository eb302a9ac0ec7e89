//! The generic message interface every election message satisfies.

use fedelect_types::{MsgHash, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ElectionMessage, MessageError};

/// Stable one-byte type tags.
///
/// Network tags occupy `0x20..0x40`; internal events occupy `0x40..` and are
/// refused by the wire codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    VolunteerAudit = 0x20,
    VolunteerAck = 0x21,
    TimeoutInternal = 0x40,
    LeaderSynced = 0x41,
}

impl MessageType {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            0x20 => Some(Self::VolunteerAudit),
            0x21 => Some(Self::VolunteerAck),
            0x40 => Some(Self::TimeoutInternal),
            0x41 => Some(Self::LeaderSynced),
            _ => None,
        }
    }

    /// Internal events are raised locally and never cross node boundaries.
    pub fn is_internal(self) -> bool {
        self.as_byte() >= 0x40
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VolunteerAudit => "volunteer_audit",
            Self::VolunteerAck => "volunteer_ack",
            Self::TimeoutInternal => "timeout_internal",
            Self::LeaderSynced => "leader_synced",
        }
    }
}

/// Result of the stateless validity check a message performs on itself.
///
/// The integer values are the ones the dispatch framework expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Discard the message.
    Invalid,
    /// Hold the message until more context arrives.
    Pending,
    /// Valid enough to hand to the election engine.
    Valid,
}

impl ValidationStatus {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Invalid => -1,
            Self::Pending => 0,
            Self::Valid => 1,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Sink through which election messages reach the node's election loop.
pub trait ElectionInbox: Send + Sync {
    fn enqueue(&self, message: ElectionMessage);
}

/// The interface the dispatch framework requires from every message type.
pub trait Message: fmt::Display {
    fn message_type(&self) -> MessageType;

    fn timestamp(&self) -> Timestamp;

    /// Identity of the message.
    fn hash(&self) -> MsgHash;

    /// Hash used for duplicate suppression.
    fn repeat_hash(&self) -> MsgHash {
        self.hash()
    }

    fn marshal_binary(&self) -> Result<Vec<u8>, MessageError>;

    /// Decode `data` into `self`, returning the unconsumed remainder.
    fn unmarshal_binary_data<'a>(&mut self, data: &'a [u8]) -> Result<&'a [u8], MessageError>;

    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), MessageError> {
        self.unmarshal_binary_data(data).map(|_| ())
    }

    fn validate(&self) -> ValidationStatus;

    /// Leaders and followers handle election messages the same way.
    fn leader_execute(&self, inbox: &dyn ElectionInbox) {
        self.follower_execute(inbox)
    }

    fn follower_execute(&self, inbox: &dyn ElectionInbox);

    fn json_string(&self) -> Result<String, MessageError>
    where
        Self: Serialize + Sized,
    {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode a bincode body from the front of `data` and report what is left.
pub(crate) fn decode_prefix<'a, T>(data: &'a [u8]) -> Result<(T, &'a [u8]), MessageError>
where
    T: for<'de> Deserialize<'de> + Serialize,
{
    let value: T = bincode::deserialize(data)?;
    let used = bincode::serialized_size(&value)? as usize;
    Ok((value, &data[used.min(data.len())..]))
}
