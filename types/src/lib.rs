//! Fundamental types for federated leader elections.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: server identities, message hashes, timestamps and the
//! (height, minute) position an election state governs.

pub mod error;
pub mod hash;
pub mod position;
pub mod server;
pub mod time;

pub use error::TypesError;
pub use hash::MsgHash;
pub use position::Position;
pub use server::{Server, ServerId};
pub use time::Timestamp;
