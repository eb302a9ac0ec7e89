//! Nullable infrastructure for deterministic testing.
//!
//! Everything the election service touches outside its own state (time,
//! the peer network and the leader roster) sits behind a trait in
//! `fedelect-elections`. This crate provides test-friendly implementations
//! that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what they were asked to do for later assertions
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod network;
pub mod roster;

pub use clock::NullClock;
pub use network::NullNetwork;
pub use roster::NullRoster;
