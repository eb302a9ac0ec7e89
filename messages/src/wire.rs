//! Election message envelope and wire codec.
//!
//! A frame is one type-tag byte followed by the bincode body of the message.
//! Internal events share the envelope so the election loop has a single
//! input type, but the codec refuses to put them on the wire.

use fedelect_types::{MsgHash, Position};
use serde::{Deserialize, Serialize};

use crate::{
    LeaderSynced, Message, MessageError, MessageType, TimeoutInternal, VolunteerAck,
    VolunteerAudit,
};

/// Upper bound on an encoded frame. Election messages are tiny; anything
/// larger is garbage.
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024;

/// Every message the election engine consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionMessage {
    VolunteerAudit(VolunteerAudit),
    VolunteerAck(VolunteerAck),
    TimeoutInternal(TimeoutInternal),
    LeaderSynced(LeaderSynced),
}

impl ElectionMessage {
    fn inner(&self) -> &dyn Message {
        match self {
            Self::VolunteerAudit(m) => m,
            Self::VolunteerAck(m) => m,
            Self::TimeoutInternal(m) => m,
            Self::LeaderSynced(m) => m,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.inner().message_type()
    }

    pub fn hash(&self) -> MsgHash {
        self.inner().hash()
    }

    pub fn repeat_hash(&self) -> MsgHash {
        self.inner().repeat_hash()
    }

    pub fn position(&self) -> Position {
        match self {
            Self::VolunteerAudit(m) => m.position(),
            Self::VolunteerAck(m) => m.position(),
            Self::TimeoutInternal(m) => m.position(),
            Self::LeaderSynced(m) => m.position(),
        }
    }

    /// Encode into a tagged frame. Fails for internal events.
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        let kind = self.message_type();
        if kind.is_internal() {
            return Err(MessageError::NotWire(kind));
        }
        let body = self.inner().marshal_binary()?;
        let mut frame = Vec::with_capacity(1 + body.len());
        frame.push(kind.as_byte());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Decode a tagged frame received from a peer.
    pub fn decode(frame: &[u8]) -> Result<Self, MessageError> {
        if frame.len() > MAX_MESSAGE_SIZE {
            return Err(MessageError::TooLarge {
                size: frame.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let (&tag, body) = frame.split_first().ok_or(MessageError::Empty)?;
        let kind = MessageType::from_byte(tag).ok_or(MessageError::UnknownType(tag))?;

        let (message, rest) = match kind {
            MessageType::VolunteerAudit => {
                let mut m = VolunteerAudit::default();
                let rest = m.unmarshal_binary_data(body)?;
                (Self::VolunteerAudit(m), rest)
            }
            MessageType::VolunteerAck => {
                let mut m = VolunteerAck::default();
                let rest = m.unmarshal_binary_data(body)?;
                (Self::VolunteerAck(m), rest)
            }
            MessageType::TimeoutInternal | MessageType::LeaderSynced => {
                return Err(MessageError::NotWire(kind));
            }
        };
        if !rest.is_empty() {
            return Err(MessageError::TrailingBytes(rest.len()));
        }
        Ok(message)
    }
}

impl From<VolunteerAudit> for ElectionMessage {
    fn from(m: VolunteerAudit) -> Self {
        Self::VolunteerAudit(m)
    }
}

impl From<VolunteerAck> for ElectionMessage {
    fn from(m: VolunteerAck) -> Self {
        Self::VolunteerAck(m)
    }
}

impl From<TimeoutInternal> for ElectionMessage {
    fn from(m: TimeoutInternal) -> Self {
        Self::TimeoutInternal(m)
    }
}

impl From<LeaderSynced> for ElectionMessage {
    fn from(m: LeaderSynced) -> Self {
        Self::LeaderSynced(m)
    }
}
