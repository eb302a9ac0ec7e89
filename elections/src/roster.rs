//! Federated and audit server sets, and index lookups into them.

use fedelect_types::{Server, ServerId};
use std::collections::HashSet;

use crate::ElectionError;

/// The leaders and standbys for the current height.
///
/// Slot order is significant: every node must hold the same sequences for
/// the priority ranking and slot numbers to agree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    federated: Vec<Server>,
    audit: Vec<Server>,
}

impl Roster {
    pub fn new(federated: Vec<Server>, audit: Vec<Server>) -> Result<Self, ElectionError> {
        if federated.is_empty() {
            return Err(ElectionError::EmptyFederated);
        }
        if u32::try_from(federated.len()).is_err() {
            return Err(ElectionError::TooManyLeaders(federated.len()));
        }
        let mut seen = HashSet::new();
        for server in federated.iter().chain(audit.iter()) {
            if !seen.insert(server.id) {
                return Err(ElectionError::DuplicateServer(server.id));
            }
        }
        Ok(Self { federated, audit })
    }

    pub fn federated(&self) -> &[Server] {
        &self.federated
    }

    pub fn audit(&self) -> &[Server] {
        &self.audit
    }

    pub fn leader(&self, slot: usize) -> Option<&Server> {
        self.federated.get(slot)
    }

    pub fn leader_index(&self, id: &ServerId) -> Option<usize> {
        self.federated.iter().position(|s| s.id == *id)
    }

    pub fn audit_index(&self, id: &ServerId) -> Option<usize> {
        self.audit.iter().position(|s| s.id == *id)
    }

    /// Acks needed to install a replacement: a strict majority of leaders.
    pub fn quorum(&self) -> usize {
        self.federated.len() / 2 + 1
    }

    /// Whether `unsynced` faults are too many to replace safely.
    pub fn exceeds_fault_budget(&self, unsynced: usize) -> bool {
        unsynced > self.federated.len() / 2
    }

    /// Swap audit server `audit_idx` into federated `slot`; the displaced
    /// leader takes the vacated audit position. Returns `(promoted, demoted)`.
    pub fn promote(&mut self, slot: usize, audit_idx: usize) -> Option<(Server, Server)> {
        if slot >= self.federated.len() || audit_idx >= self.audit.len() {
            return None;
        }
        std::mem::swap(&mut self.federated[slot], &mut self.audit[audit_idx]);
        Some((self.federated[slot].clone(), self.audit[audit_idx].clone()))
    }
}
