//! Accumulates leader acks behind volunteers until one reaches quorum.
//!
//! Acks may overtake the volunteer they refer to, so a tally is opened by
//! whichever of the two arrives first. Once a candidacy is installed its
//! acks are kept as the slot's evidence, so peers that missed some of them
//! can be brought level.

use fedelect_messages::{Message, VolunteerAck, VolunteerAudit};
use fedelect_types::{MsgHash, ServerId};
use std::collections::{HashMap, HashSet};

/// One candidacy: a volunteer for a slot in a given round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub slot: usize,
    pub round: u32,
    pub volunteer: ServerId,
}

impl CandidateKey {
    pub fn of(volunteer: &VolunteerAudit) -> Self {
        Self {
            slot: volunteer.slot(),
            round: volunteer.round,
            volunteer: volunteer.server_id,
        }
    }

    pub fn of_ack(ack: &VolunteerAck) -> Self {
        Self {
            slot: ack.slot(),
            round: ack.round,
            volunteer: ack.volunteer_id,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Tally {
    volunteer: Option<VolunteerAudit>,
    acks: Vec<VolunteerAck>,
}

/// Tallies for every open candidacy at the current position.
#[derive(Clone, Debug, Default)]
pub struct Corroboration {
    tallies: HashMap<CandidateKey, Tally>,
    /// Acks this node sent as a leader, one per `(slot, round)`.
    own: HashMap<(usize, u32), VolunteerAck>,
    /// The acks that carried each slot filled by promotion.
    settled: HashMap<usize, Vec<VolunteerAck>>,
    /// Hashes of volunteers and acks already handled or answered.
    seen: HashSet<MsgHash>,
}

impl Corroboration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a volunteer. Returns `false` if it was already known.
    pub fn record_volunteer(&mut self, volunteer: &VolunteerAudit) -> bool {
        self.seen.insert(volunteer.hash());
        let tally = self.tallies.entry(CandidateKey::of(volunteer)).or_default();
        if tally.volunteer.is_some() {
            return false;
        }
        tally.volunteer = Some(volunteer.clone());
        true
    }

    /// Count an ack. Returns the distinct acker count, or `None` when this
    /// acker was already counted for the candidacy.
    pub fn record_ack(&mut self, ack: &VolunteerAck) -> Option<usize> {
        self.seen.insert(ack.hash());
        let tally = self.tallies.entry(CandidateKey::of_ack(ack)).or_default();
        if tally.acks.iter().any(|a| a.server_id == ack.server_id) {
            return None;
        }
        tally.acks.push(ack.clone());
        Some(tally.acks.len())
    }

    pub fn acks(&self, key: &CandidateKey) -> usize {
        self.tallies.get(key).map_or(0, |t| t.acks.len())
    }

    pub fn volunteer(&self, key: &CandidateKey) -> Option<&VolunteerAudit> {
        self.tallies.get(key).and_then(|t| t.volunteer.as_ref())
    }

    /// Claim the right to send `ack`. A leader acks at most one candidate
    /// per `(slot, round)`; returns `false` if already claimed.
    pub fn claim_ack(&mut self, ack: &VolunteerAck) -> bool {
        let key = (ack.slot(), ack.round);
        if self.own.contains_key(&key) {
            return false;
        }
        self.own.insert(key, ack.clone());
        true
    }

    /// This node's acks for `slot`, oldest round first.
    pub fn own_acks(&self, slot: usize) -> Vec<&VolunteerAck> {
        let mut acks: Vec<_> = self.own.values().filter(|a| a.slot() == slot).collect();
        acks.sort_by_key(|a| a.round);
        acks
    }

    /// Replace a stored own ack with its latest repeat.
    pub fn refresh_own(&mut self, ack: VolunteerAck) {
        self.own.insert((ack.slot(), ack.round), ack);
    }

    /// Close `key`'s slot after its candidacy was installed, keeping the
    /// candidacy's acks as evidence. Returns that evidence.
    pub fn settle(&mut self, key: CandidateKey) -> Vec<VolunteerAck> {
        let acks = self
            .tallies
            .remove(&key)
            .map(|t| t.acks)
            .unwrap_or_default();
        self.clear_slot(key.slot);
        self.settled.insert(key.slot, acks.clone());
        acks
    }

    /// Acks that installed the replacement in `slot`; empty if none did.
    pub fn evidence(&self, slot: usize) -> &[VolunteerAck] {
        self.settled.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remember `hash`; `false` if it had been seen before.
    pub fn first_sighting(&mut self, hash: MsgHash) -> bool {
        self.seen.insert(hash)
    }

    /// Drop open tallies and own acks for a resolved slot.
    pub fn clear_slot(&mut self, slot: usize) {
        self.tallies.retain(|k, _| k.slot != slot);
        self.own.retain(|(s, _), _| *s != slot);
    }

    pub fn clear(&mut self) {
        self.tallies.clear();
        self.own.clear();
        self.settled.clear();
        self.seen.clear();
    }

    /// Number of open candidacies.
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedelect_types::{Position, Server, Timestamp};

    fn server(b: u8, name: &str) -> Server {
        Server::new(ServerId::new([b; 32]), name).unwrap()
    }

    fn volunteer(slot: u32, round: u32) -> VolunteerAudit {
        VolunteerAudit::new(
            &server(9, "A0"),
            slot,
            1,
            Position::new(1, 0),
            round,
            Timestamp::EPOCH,
        )
    }

    fn ack(leader: u8, v: &VolunteerAudit) -> VolunteerAck {
        VolunteerAck::new(&server(leader, &format!("L{leader}")), v, Timestamp::EPOCH)
    }

    #[test]
    fn duplicate_volunteer_is_reported() {
        let mut c = Corroboration::new();
        assert!(c.record_volunteer(&volunteer(1, 1)));
        assert!(!c.record_volunteer(&volunteer(1, 1)));
        assert!(c.record_volunteer(&volunteer(1, 2)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn acks_count_distinct_leaders() {
        let mut c = Corroboration::new();
        let v = volunteer(1, 1);
        let key = CandidateKey::of(&v);
        assert_eq!(c.record_ack(&ack(1, &v)), Some(1));
        assert_eq!(c.record_ack(&ack(1, &v)), None);
        assert_eq!(c.record_ack(&ack(2, &v)), Some(2));
        assert_eq!(c.acks(&key), 2);
    }

    #[test]
    fn ack_before_volunteer_opens_tally() {
        let mut c = Corroboration::new();
        let v = volunteer(0, 3);
        let key = CandidateKey::of(&v);
        c.record_ack(&ack(1, &v));
        assert!(c.volunteer(&key).is_none());
        assert!(c.record_volunteer(&v));
        assert_eq!(c.volunteer(&key), Some(&v));
        assert_eq!(c.acks(&key), 1);
    }

    #[test]
    fn claim_ack_once_per_round() {
        let mut c = Corroboration::new();
        assert!(c.claim_ack(&ack(1, &volunteer(1, 1))));
        assert!(!c.claim_ack(&ack(1, &volunteer(1, 1))));
        assert!(c.claim_ack(&ack(1, &volunteer(1, 2))));
        let rounds: Vec<_> = c.own_acks(1).iter().map(|a| a.round).collect();
        assert_eq!(rounds, vec![1, 2]);
    }

    #[test]
    fn clear_slot_leaves_other_slots() {
        let mut c = Corroboration::new();
        c.record_volunteer(&volunteer(0, 1));
        c.record_volunteer(&volunteer(1, 1));
        c.claim_ack(&ack(1, &volunteer(1, 1)));
        c.clear_slot(1);
        assert_eq!(c.len(), 1);
        assert!(c.own_acks(1).is_empty());
        assert!(c.claim_ack(&ack(1, &volunteer(1, 1))));
    }

    #[test]
    fn settle_keeps_installing_acks_as_evidence() {
        let mut c = Corroboration::new();
        let v = volunteer(1, 1);
        let (a1, a2) = (ack(1, &v), ack(2, &v));
        c.record_ack(&a1);
        c.record_ack(&a2);
        c.record_volunteer(&volunteer(1, 2));

        let evidence = c.settle(CandidateKey::of(&v));
        assert_eq!(evidence, vec![a1.clone(), a2]);
        assert_eq!(c.evidence(1).len(), 2);
        assert!(c.evidence(0).is_empty());
        assert!(c.is_empty());
        // Acks already counted are not news.
        assert!(!c.first_sighting(a1.hash()));
    }

    #[test]
    fn clear_forgets_evidence_and_sightings() {
        let mut c = Corroboration::new();
        let v = volunteer(1, 1);
        c.record_ack(&ack(1, &v));
        c.settle(CandidateKey::of(&v));
        c.clear();
        assert!(c.evidence(1).is_empty());
        assert!(c.first_sighting(v.hash()));
    }
}
