//! Federated leader elections — fault detection and audit-server promotion.
//!
//! When a federated leader stops acknowledging within its minute, the
//! surviving servers agree, without a coordinator, on a replacement drawn
//! from the audit pool:
//!
//! - Each node tracks which leaders have synced this minute.
//! - Repeated timeouts on an unsynced slot advance that slot's round.
//! - A deterministic ranking over the audit set, recomputed identically on
//!   every node, names exactly one volunteer per round.
//! - Surviving leaders ack the volunteer; a majority of acks installs it.
//!
//! ## Module overview
//!
//! - [`engine`] — The election state machine ([`Elections`]).
//! - [`state`] — Per-height state and its read-only snapshot.
//! - [`sync`] — Per-minute leader sync flags.
//! - [`priority`] — Deterministic audit ranking.
//! - [`roster`] — Federated/audit sets and index lookups.
//! - [`corroboration`] — Ack tallies behind each volunteer.
//! - [`outcome`] — Events and actions returned by every handler.
//! - [`collaborators`] — Traits for broadcast, roster installation and time.
//! - [`error`] — Election error types.

pub mod collaborators;
pub mod corroboration;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod priority;
pub mod roster;
pub mod state;
pub mod sync;

pub use collaborators::{Broadcaster, Clock, RosterSink, SystemClock};
pub use corroboration::{CandidateKey, Corroboration};
pub use engine::Elections;
pub use error::ElectionError;
pub use outcome::{ElectionAction, ElectionEvent, Outcome, Promotion, RejectReason};
pub use priority::{max_idx, order, weight};
pub use roster::Roster;
pub use state::{ElectionSnapshot, ElectionState};
pub use sync::SyncTracker;
