//! Election engine — detects faulted leaders and promotes audit servers.
//!
//! One [`Elections`] value owns the state for one node. All handlers take
//! `&mut self`, so the owner serializes timeouts, volunteers, acks and sync
//! signals by construction. Handlers never block and never perform I/O; the
//! returned [`Outcome`] tells the runtime what to broadcast and schedule.
//!
//! Lifecycle of a slot within a minute:
//!
//! 1. A timeout finds the slot unsynced and bumps its round.
//! 2. Every node ranks the audit set for `(height, minute, slot, round)`;
//!    the top-ranked audit server volunteers.
//! 3. Surviving leaders check the volunteer against their own ranking and
//!    broadcast an ack.
//! 4. Once a majority of leaders has acked, every node swaps the volunteer
//!    into the slot and marks it synced.
//!
//! If the volunteer or its acks are lost, the fault re-check fires another
//! timeout, the round advances and the ranking reshuffles. A leader whose
//! re-check finds the slot still open repeats its acks; any peer that has
//! already installed the replacement answers with the acks that carried
//! it, so a lost ack never leaves two rosters behind.

use fedelect_messages::{
    ElectionMessage, LeaderSynced, Message, TimeoutInternal, VolunteerAck, VolunteerAudit,
};
use fedelect_types::{MsgHash, Position, Server, Timestamp};
use tracing::{debug, info};

use crate::corroboration::{CandidateKey, Corroboration};
use crate::outcome::{ElectionAction, ElectionEvent, Outcome, Promotion, RejectReason};
use crate::priority::{max_idx, order};
use crate::roster::Roster;
use crate::state::{ElectionSnapshot, ElectionState};

/// The election state machine for one node.
#[derive(Clone, Debug)]
pub struct Elections {
    identity: Server,
    state: ElectionState,
    corroboration: Corroboration,
}

impl Elections {
    pub fn new(identity: Server, roster: Roster, position: Position) -> Self {
        Self {
            identity,
            state: ElectionState::new(roster, position),
            corroboration: Corroboration::new(),
        }
    }

    pub fn identity(&self) -> &Server {
        &self.identity
    }

    pub fn position(&self) -> Position {
        self.state.position()
    }

    pub fn state(&self) -> &ElectionState {
        &self.state
    }

    /// Direct state access for setup in tests and harnesses.
    pub fn state_mut(&mut self) -> &mut ElectionState {
        &mut self.state
    }

    pub fn snapshot(&self) -> ElectionSnapshot {
        self.state.snapshot()
    }

    /// Dispatch any election message to its handler.
    pub fn process(&mut self, message: &ElectionMessage, now: Timestamp) -> Outcome {
        match message {
            ElectionMessage::TimeoutInternal(m) => self.handle_timeout(m, now),
            ElectionMessage::VolunteerAudit(m) => self.handle_volunteer(m, now),
            ElectionMessage::VolunteerAck(m) => self.handle_ack(m, now),
            ElectionMessage::LeaderSynced(m) => self.handle_synced(m),
        }
    }

    /// React to a timeout for `timeout.position()`.
    pub fn handle_timeout(&mut self, timeout: &TimeoutInternal, now: Timestamp) -> Outcome {
        let mut out = Outcome::default();
        let at = timeout.position();
        let current = self.state.position();

        if at.is_stale(current) {
            debug!(node = %self.identity.name, timeout = %at, current = %current, "stale timeout ignored");
            out.event(ElectionEvent::StaleTimeout {
                timeout: at,
                current,
            });
            return out;
        }

        let unsynced = self.state.refresh_electing();
        let Some(slot) = self.state.electing() else {
            out.event(ElectionEvent::AllSynced { position: current });
            return out;
        };

        // Come back around in case this fault is never resolved.
        out.action(ElectionAction::ScheduleFault { position: at, slot });

        let round = self.state.bump_round(slot);
        debug!(
            node = %self.identity.name,
            slot,
            round,
            unsynced,
            "timeout on unsynced leader"
        );
        out.event(ElectionEvent::RoundAdvanced {
            position: current,
            slot,
            round,
            unsynced,
        });
        self.resend_acks(slot, now, &mut out);

        let roster = self.state.roster();
        if roster.exceeds_fault_budget(unsynced) {
            let federated = roster.federated().len();
            debug!(node = %self.identity.name, unsynced, federated, "no majority visible, not replacing");
            out.event(ElectionEvent::MajorityRefused {
                position: current,
                slot,
                round,
                unsynced,
                federated,
            });
            return out;
        }

        let priority = order(roster.audit(), current.height, current.minute, slot, round);
        let top = max_idx(&priority);
        let own_leader = roster.leader_index(&self.identity.id);
        let own_audit = roster.audit_index(&self.identity.id);
        out.event(ElectionEvent::Ranked { slot, round, top });

        if let Some(own_slot) = own_leader {
            // Leaders take part through acks only.
            out.event(ElectionEvent::LeaderObserved { slot, own_slot });
        }

        // The roster caps the federated set at u32 slots.
        if let (Some(idx), Ok(wire_slot)) = (own_audit, u32::try_from(slot)) {
            if Some(idx) == top {
                let weight = priority[idx];
                let volunteer =
                    VolunteerAudit::new(&self.identity, wire_slot, weight, current, round, now);
                info!(node = %self.identity.name, slot, round, weight, "volunteering to replace leader");
                self.corroboration.record_volunteer(&volunteer);
                out.event(ElectionEvent::Volunteered {
                    slot,
                    round,
                    weight,
                });
                out.action(ElectionAction::Broadcast(volunteer.into()));
            }
        }

        self.state.set_priority(priority);
        out
    }

    /// Check a volunteer against the local ranking; leaders ack it.
    pub fn handle_volunteer(&mut self, volunteer: &VolunteerAudit, now: Timestamp) -> Outcome {
        let mut out = Outcome::default();
        if let Err(reason) = self.check_volunteer(volunteer) {
            debug!(node = %self.identity.name, ?reason, "volunteer rejected");
            let late = match reason {
                RejectReason::SlotSynced(slot) => Some(slot),
                _ => None,
            };
            out.event(ElectionEvent::VolunteerRejected(reason));
            if let Some(slot) = late {
                self.answer_late(slot, volunteer.hash(), &mut out);
            }
            return out;
        }

        let key = CandidateKey::of(volunteer);
        if !self.corroboration.record_volunteer(volunteer) {
            out.event(ElectionEvent::VolunteerDuplicate {
                slot: key.slot,
                round: key.round,
            });
            return out;
        }
        out.event(ElectionEvent::VolunteerAccepted {
            slot: key.slot,
            round: key.round,
            volunteer: key.volunteer,
        });

        let own_slot = self.state.roster().leader_index(&self.identity.id);
        if let Some(own_slot) = own_slot {
            let ack = VolunteerAck::new(&self.identity, volunteer, now);
            if own_slot != key.slot && self.corroboration.claim_ack(&ack) {
                debug!(node = %self.identity.name, slot = key.slot, round = key.round, "acking volunteer");
                out.event(ElectionEvent::AckSent {
                    slot: key.slot,
                    round: key.round,
                    volunteer: key.volunteer,
                });
                out.action(ElectionAction::Broadcast(ack.clone().into()));
                self.tally_ack(&ack, &mut out);
            }
        }
        out
    }

    /// Count a leader's ack; installs the volunteer on quorum.
    pub fn handle_ack(&mut self, ack: &VolunteerAck, _now: Timestamp) -> Outcome {
        let mut out = Outcome::default();
        if let Err(reason) = self.check_ack(ack) {
            debug!(node = %self.identity.name, ?reason, "ack rejected");
            let late = match reason {
                RejectReason::SlotSynced(slot) => Some(slot),
                _ => None,
            };
            out.event(ElectionEvent::AckRejected(reason));
            if let Some(slot) = late {
                self.answer_late(slot, ack.hash(), &mut out);
            }
            return out;
        }
        self.tally_ack(ack, &mut out);
        out
    }

    /// A leader produced its acknowledgment for the minute.
    pub fn handle_synced(&mut self, synced: &LeaderSynced) -> Outcome {
        let mut out = Outcome::default();
        let position = self.state.position();
        let slot = match self.state.roster().leader_index(&synced.server_id) {
            Some(slot) if synced.position() == position => slot,
            _ => {
                out.event(ElectionEvent::SyncIgnored {
                    server: synced.server_id,
                    position: synced.position(),
                });
                return out;
            }
        };
        let under_check = self.state.round(slot) > 0;
        if self.state.resolve_slot(slot) {
            self.corroboration.clear_slot(slot);
            out.event(ElectionEvent::SlotSynced { slot });
            out.action(ElectionAction::CancelFault { position, slot });
            if under_check {
                self.check_next(position, &mut out);
            }
        }
        out
    }

    /// Move to a later minute or height. Sync flags and rounds restart; the
    /// roster, including any promotions, carries over.
    pub fn advance(&mut self, to: Position) -> Outcome {
        let mut out = Outcome::default();
        let from = self.state.position();
        if to <= from {
            out.event(ElectionEvent::AdvanceIgnored {
                requested: to,
                current: from,
            });
            return out;
        }
        self.state.reset_for(to);
        self.corroboration.clear();
        debug!(node = %self.identity.name, %from, %to, "advanced");
        out.event(ElectionEvent::Advanced { from, to });
        out.action(ElectionAction::CancelStale { before: to });
        out
    }

    fn check_volunteer(&self, v: &VolunteerAudit) -> Result<(), RejectReason> {
        let current = self.state.position();
        if v.position() != current {
            return Err(RejectReason::WrongPosition {
                message: v.position(),
                current,
            });
        }
        if !v.validate().is_valid() {
            return Err(RejectReason::Malformed);
        }
        let slot = self.check_slot(v.slot())?;
        let roster = self.state.roster();
        let idx = roster
            .audit_index(&v.server_id)
            .ok_or(RejectReason::NotAudit(v.server_id))?;
        let priority = order(roster.audit(), current.height, current.minute, slot, v.round);
        if v.weight != priority[idx] {
            return Err(RejectReason::WeightMismatch {
                claimed: v.weight,
                expected: priority[idx],
            });
        }
        let top = max_idx(&priority);
        if top != Some(idx) {
            return Err(RejectReason::NotTopRanked {
                expected: top,
                actual: idx,
            });
        }
        Ok(())
    }

    fn check_ack(&self, a: &VolunteerAck) -> Result<(), RejectReason> {
        let current = self.state.position();
        if a.position() != current {
            return Err(RejectReason::WrongPosition {
                message: a.position(),
                current,
            });
        }
        if !a.validate().is_valid() {
            return Err(RejectReason::Malformed);
        }
        let slot = self.check_slot(a.slot())?;
        let roster = self.state.roster();
        match roster.leader_index(&a.server_id) {
            None => return Err(RejectReason::NotLeader(a.server_id)),
            Some(acker) if acker == slot => return Err(RejectReason::FaultedLeader(a.server_id)),
            Some(_) => {}
        }
        let idx = roster
            .audit_index(&a.volunteer_id)
            .ok_or(RejectReason::NotAudit(a.volunteer_id))?;
        let top = max_idx(&order(
            roster.audit(),
            current.height,
            current.minute,
            slot,
            a.round,
        ));
        if top != Some(idx) {
            return Err(RejectReason::NotTopRanked {
                expected: top,
                actual: idx,
            });
        }
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> Result<usize, RejectReason> {
        if slot >= self.state.roster().federated().len() {
            return Err(RejectReason::UnknownSlot(slot));
        }
        if self.state.sync().is_synced(slot) {
            return Err(RejectReason::SlotSynced(slot));
        }
        Ok(slot)
    }

    fn tally_ack(&mut self, ack: &VolunteerAck, out: &mut Outcome) {
        let key = CandidateKey::of_ack(ack);
        let Some(acks) = self.corroboration.record_ack(ack) else {
            out.event(ElectionEvent::AckDuplicate {
                slot: key.slot,
                round: key.round,
                acker: ack.server_id,
            });
            return;
        };
        let needed = self.state.roster().quorum();
        out.event(ElectionEvent::AckRecorded {
            slot: key.slot,
            round: key.round,
            volunteer: key.volunteer,
            acks,
            needed,
        });
        if acks >= needed {
            self.install(key, out);
        }
    }

    fn install(&mut self, key: CandidateKey, out: &mut Outcome) {
        let position = self.state.position();
        let Some(audit_idx) = self.state.roster().audit_index(&key.volunteer) else {
            return;
        };
        let Some((promoted, demoted)) = self.state.roster_mut().promote(key.slot, audit_idx)
        else {
            return;
        };
        let under_check = self.state.round(key.slot) > 0;
        self.state.resolve_slot(key.slot);
        let evidence = self.corroboration.settle(key);

        info!(
            node = %self.identity.name,
            slot = key.slot,
            round = key.round,
            promoted = %promoted,
            demoted = %demoted,
            "leader replaced"
        );
        let promotion = Promotion {
            position,
            slot: key.slot,
            round: key.round,
            promoted,
            demoted,
        };
        out.event(ElectionEvent::LeaderInstalled(promotion.clone()));
        out.action(ElectionAction::InstallLeader(promotion));
        out.action(ElectionAction::CancelFault {
            position,
            slot: key.slot,
        });
        if under_check {
            self.check_next(position, out);
        }
        self.relay(key.slot, evidence, out);
    }

    /// Keep re-checking the minute while another slot is still unsynced.
    fn check_next(&self, position: Position, out: &mut Outcome) {
        if let Some(next) = self.state.electing() {
            debug!(node = %self.identity.name, slot = next, "re-checking next unsynced leader");
            out.action(ElectionAction::ScheduleFault {
                position,
                slot: next,
            });
        }
    }

    /// Repeat this leader's acks for `slot`, each stamped later than the
    /// copy it replaces so peers treat it as news.
    fn resend_acks(&mut self, slot: usize, now: Timestamp, out: &mut Outcome) {
        let repeats: Vec<VolunteerAck> = self
            .corroboration
            .own_acks(slot)
            .into_iter()
            .map(|ack| {
                let later = now.as_millis().max(ack.timestamp.as_millis().saturating_add(1));
                VolunteerAck {
                    timestamp: Timestamp::new(later),
                    ..ack.clone()
                }
            })
            .collect();
        for ack in repeats {
            out.event(ElectionEvent::AckResent {
                slot,
                round: ack.round,
                volunteer: ack.volunteer_id,
            });
            self.corroboration.refresh_own(ack.clone());
            out.action(ElectionAction::Broadcast(ack.into()));
        }
    }

    /// A peer still treats `slot` as open although a replacement was
    /// installed here. Replay the installing acks, once per late message.
    fn answer_late(&mut self, slot: usize, late: MsgHash, out: &mut Outcome) {
        if self.corroboration.evidence(slot).is_empty()
            || !self.corroboration.first_sighting(late)
        {
            return;
        }
        let evidence = self.corroboration.evidence(slot).to_vec();
        debug!(node = %self.identity.name, slot, acks = evidence.len(), "answering late election traffic");
        self.relay(slot, evidence, out);
    }

    fn relay(&self, slot: usize, acks: Vec<VolunteerAck>, out: &mut Outcome) {
        if acks.is_empty() {
            return;
        }
        out.event(ElectionEvent::AcksRelayed {
            slot,
            count: acks.len(),
        });
        for ack in acks {
            out.action(ElectionAction::Broadcast(ack.into()));
        }
    }
}
