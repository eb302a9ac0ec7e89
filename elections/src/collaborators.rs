//! Seams to the systems around the election core.

use fedelect_types::Timestamp;

use crate::{ElectionError, Promotion};

/// Delivers an encoded election frame to every federated and audit peer.
///
/// Delivery is best effort; the protocol recovers from loss by escalating
/// rounds.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, frame: &[u8]) -> Result<(), ElectionError>;
}

/// Leader-roster owner (the process list). Told about each promotion so
/// that later heights dispatch to the new leader.
pub trait RosterSink: Send + Sync {
    fn install_leader(&self, promotion: &Promotion);
}

/// Wall-clock source for message timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
