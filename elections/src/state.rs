//! Per-height election state.

use fedelect_types::{Position, Server};
use serde::Serialize;

use crate::roster::Roster;
use crate::sync::SyncTracker;

/// Everything a node knows about leader health at one position.
///
/// Invariant: `electing` is the lowest slot whose sync flag is false, or
/// `None` when every slot is synced. Every mutator below re-establishes it.
#[derive(Clone, Debug)]
pub struct ElectionState {
    position: Position,
    roster: Roster,
    sync: SyncTracker,
    /// Successive unresolved timeouts per slot. Grown lazily.
    round: Vec<u32>,
    electing: Option<usize>,
    /// Last computed ranking over the audit set.
    a_priority: Vec<u64>,
}

impl ElectionState {
    pub fn new(roster: Roster, position: Position) -> Self {
        let sync = SyncTracker::new(roster.federated().len());
        let mut state = Self {
            position,
            roster,
            sync,
            round: Vec::new(),
            electing: None,
            a_priority: Vec::new(),
        };
        state.refresh_electing();
        state
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn sync(&self) -> &SyncTracker {
        &self.sync
    }

    pub fn rounds(&self) -> &[u32] {
        &self.round
    }

    /// Round of `slot`; slots never timed out read as 0.
    pub fn round(&self, slot: usize) -> u32 {
        self.round.get(slot).copied().unwrap_or(0)
    }

    pub fn electing(&self) -> Option<usize> {
        self.electing
    }

    pub fn a_priority(&self) -> &[u64] {
        &self.a_priority
    }

    /// Recompute `electing`; returns the number of unsynced slots.
    pub(crate) fn refresh_electing(&mut self) -> usize {
        self.electing = self.sync.first_unsynced();
        self.sync.unsynced_count()
    }

    /// Increment the round of `slot`, growing the vector as needed.
    pub(crate) fn bump_round(&mut self, slot: usize) -> u32 {
        if self.round.len() <= slot {
            self.round.resize(slot + 1, 0);
        }
        self.round[slot] += 1;
        self.round[slot]
    }

    pub(crate) fn set_priority(&mut self, weights: Vec<u64>) {
        self.a_priority = weights;
    }

    pub(crate) fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// Mark `slot` synced and restart its round count. Returns `true` if
    /// the slot was unsynced.
    pub(crate) fn resolve_slot(&mut self, slot: usize) -> bool {
        let changed = self.sync.mark(slot);
        if changed {
            if let Some(r) = self.round.get_mut(slot) {
                *r = 0;
            }
            if self.electing == Some(slot) {
                self.a_priority.clear();
            }
            self.refresh_electing();
        }
        changed
    }

    /// Begin a new minute or height. The roster carries over.
    pub(crate) fn reset_for(&mut self, position: Position) {
        self.position = position;
        self.sync = SyncTracker::new(self.roster.federated().len());
        self.round.clear();
        self.a_priority.clear();
        self.refresh_electing();
    }

    /// Test and setup hook: overwrite sync flags directly.
    pub fn set_sync(&mut self, flags: Vec<bool>) {
        self.sync = SyncTracker::from_flags(flags);
        self.refresh_electing();
    }

    pub fn snapshot(&self) -> ElectionSnapshot {
        ElectionSnapshot {
            position: self.position,
            federated: self.roster.federated().to_vec(),
            audit: self.roster.audit().to_vec(),
            sync: self.sync.as_slice().to_vec(),
            round: self.round.clone(),
            electing: self.electing,
            a_priority: self.a_priority.clone(),
        }
    }
}

/// Owned copy of [`ElectionState`] for inspection outside the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionSnapshot {
    pub position: Position,
    pub federated: Vec<Server>,
    pub audit: Vec<Server>,
    pub sync: Vec<bool>,
    pub round: Vec<u32>,
    pub electing: Option<usize>,
    pub a_priority: Vec<u64>,
}

impl ElectionSnapshot {
    pub fn round(&self, slot: usize) -> u32 {
        self.round.get(slot).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedelect_crypto::server_id_from_name;

    fn server(name: &str) -> Server {
        Server::new(server_id_from_name(name), name).unwrap()
    }

    fn state() -> ElectionState {
        let roster = Roster::new(
            vec![server("L0"), server("L1"), server("L2")],
            vec![server("A0"), server("A1")],
        )
        .unwrap();
        ElectionState::new(roster, Position::new(10, 3))
    }

    #[test]
    fn new_state_elects_slot_zero() {
        let s = state();
        assert_eq!(s.electing(), Some(0));
        assert!(s.rounds().is_empty());
        assert_eq!(s.round(2), 0);
    }

    #[test]
    fn rounds_grow_lazily() {
        let mut s = state();
        assert_eq!(s.bump_round(1), 1);
        assert_eq!(s.rounds(), &[0, 1]);
        assert_eq!(s.bump_round(1), 2);
    }

    #[test]
    fn resolve_slot_resets_round_and_moves_electing() {
        let mut s = state();
        s.set_sync(vec![true, false, false]);
        s.bump_round(1);
        assert!(s.resolve_slot(1));
        assert_eq!(s.round(1), 0);
        assert_eq!(s.electing(), Some(2));
        assert!(!s.resolve_slot(1));
    }

    #[test]
    fn reset_for_keeps_roster() {
        let mut s = state();
        s.set_sync(vec![true, true, true]);
        s.bump_round(0);
        s.roster_mut().promote(0, 0);
        s.reset_for(Position::new(10, 4));
        assert_eq!(s.position(), Position::new(10, 4));
        assert_eq!(s.electing(), Some(0));
        assert!(s.rounds().is_empty());
        assert_eq!(s.roster().leader(0).unwrap().name, "A0");
    }

    #[test]
    fn snapshot_mirrors_state() {
        let mut s = state();
        s.set_sync(vec![true, false, true]);
        s.bump_round(1);
        let snap = s.snapshot();
        assert_eq!(snap.sync, vec![true, false, true]);
        assert_eq!(snap.electing, Some(1));
        assert_eq!(snap.round(1), 1);
        assert_eq!(snap.federated.len(), 3);
    }
}
