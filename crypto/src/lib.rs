//! Hashing primitives for federated leader elections.
//!
//! Everything that must agree bit-for-bit across nodes (message identities,
//! candidate weights) is derived from 256-bit Blake2b.

pub mod hash;

pub use hash::{blake2b_256, blake2b_256_multi, server_id_from_name};
