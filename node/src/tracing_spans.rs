//! Pre-built [`tracing::Span`] constructors for election service work.
//!
//! Consistent span names and field sets make it easy to follow one slot's
//! election across timeouts, volunteers and acks in aggregated logs.

use tracing::{info_span, Span};

use fedelect_types::Position;

/// Span covering one input handled by the election service.
pub fn input_span(node: &str, msg_type: &str, position: Position) -> Span {
    info_span!("election_input", node = %node, msg_type = %msg_type, position = %position)
}

/// Span covering the broadcast of an election message.
pub fn broadcast_span(msg_type: &str) -> Span {
    info_span!("broadcast", msg_type = %msg_type)
}

/// Span covering the installation of a promoted leader.
pub fn install_span(slot: usize, round: u32) -> Span {
    info_span!("install_leader", slot = slot, round = round)
}
