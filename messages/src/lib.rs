//! Election message types for federated leader replacement.
//!
//! Two kinds of message live here:
//! - network messages ([`VolunteerAudit`], [`VolunteerAck`]) that travel
//!   between nodes inside the [`ElectionMessage`] wire envelope;
//! - internal events ([`TimeoutInternal`], [`LeaderSynced`]) that a node
//!   raises for itself and which never touch the wire.
//!
//! Every type implements the generic [`Message`] interface expected by the
//! surrounding dispatch framework.

pub mod ack;
pub mod error;
pub mod message;
pub mod synced;
pub mod timeout;
pub mod volunteer;
pub mod wire;

pub use ack::VolunteerAck;
pub use error::MessageError;
pub use message::{ElectionInbox, Message, MessageType, ValidationStatus};
pub use synced::LeaderSynced;
pub use timeout::TimeoutInternal;
pub use volunteer::VolunteerAudit;
pub use wire::{ElectionMessage, MAX_MESSAGE_SIZE};
