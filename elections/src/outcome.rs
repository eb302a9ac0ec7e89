//! What the engine decided, as data.
//!
//! Handlers never perform I/O. They return [`ElectionEvent`]s describing the
//! decision (for logs, metrics and tests) and [`ElectionAction`]s for the
//! runtime to carry out.

use fedelect_messages::ElectionMessage;
use fedelect_types::{Position, Server, ServerId};
use serde::Serialize;

/// A completed replacement of a faulted leader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub position: Position,
    pub slot: usize,
    pub round: u32,
    pub promoted: Server,
    pub demoted: Server,
}

/// Why a volunteer or ack was discarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Refers to a height/minute other than the engine's.
    WrongPosition { message: Position, current: Position },
    /// Failed the message's own stateless validation.
    Malformed,
    UnknownSlot(usize),
    /// The slot's leader is healthy or already replaced this minute.
    SlotSynced(usize),
    /// The volunteer is not an audit server.
    NotAudit(ServerId),
    /// The claimed weight differs from the locally computed one.
    WeightMismatch { claimed: u64, expected: u64 },
    /// The volunteer is not the top-ranked candidate for its round.
    NotTopRanked { expected: Option<usize>, actual: usize },
    /// The acker is not a federated leader.
    NotLeader(ServerId),
    /// The acker holds the very slot under election.
    FaultedLeader(ServerId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ElectionEvent {
    StaleTimeout {
        timeout: Position,
        current: Position,
    },
    AllSynced {
        position: Position,
    },
    RoundAdvanced {
        position: Position,
        slot: usize,
        round: u32,
        unsynced: usize,
    },
    /// Too many leaders are silent to replace one safely.
    MajorityRefused {
        position: Position,
        slot: usize,
        round: u32,
        unsynced: usize,
        federated: usize,
    },
    Ranked {
        slot: usize,
        round: u32,
        top: Option<usize>,
    },
    /// This node is a leader; leaders only act through acks.
    LeaderObserved {
        slot: usize,
        own_slot: usize,
    },
    Volunteered {
        slot: usize,
        round: u32,
        weight: u64,
    },
    VolunteerAccepted {
        slot: usize,
        round: u32,
        volunteer: ServerId,
    },
    VolunteerDuplicate {
        slot: usize,
        round: u32,
    },
    VolunteerRejected(RejectReason),
    AckSent {
        slot: usize,
        round: u32,
        volunteer: ServerId,
    },
    AckRecorded {
        slot: usize,
        round: u32,
        volunteer: ServerId,
        acks: usize,
        needed: usize,
    },
    AckDuplicate {
        slot: usize,
        round: u32,
        acker: ServerId,
    },
    AckRejected(RejectReason),
    /// This leader repeated an earlier ack for a slot still under election.
    AckResent {
        slot: usize,
        round: u32,
        volunteer: ServerId,
    },
    /// Acks that installed a replacement, rebroadcast for lagging peers.
    AcksRelayed {
        slot: usize,
        count: usize,
    },
    SlotSynced {
        slot: usize,
    },
    SyncIgnored {
        server: ServerId,
        position: Position,
    },
    LeaderInstalled(Promotion),
    Advanced {
        from: Position,
        to: Position,
    },
    AdvanceIgnored {
        requested: Position,
        current: Position,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElectionAction {
    /// Re-run the timeout for `position` after the fault timeout unless the
    /// slot resolves first.
    ScheduleFault { position: Position, slot: usize },
    /// The slot resolved; its pending re-check is moot.
    CancelFault { position: Position, slot: usize },
    /// Every re-check strictly before `before` is moot.
    CancelStale { before: Position },
    /// Fire-and-forget to every peer.
    Broadcast(ElectionMessage),
    /// Hand the new leader to the roster collaborator.
    InstallLeader(Promotion),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub events: Vec<ElectionEvent>,
    pub actions: Vec<ElectionAction>,
}

impl Outcome {
    pub(crate) fn event(&mut self, event: ElectionEvent) {
        self.events.push(event);
    }

    pub(crate) fn action(&mut self, action: ElectionAction) {
        self.actions.push(action);
    }

    pub fn merge(&mut self, other: Outcome) {
        self.events.extend(other.events);
        self.actions.extend(other.actions);
    }

    /// Messages this step wants broadcast.
    pub fn broadcasts(&self) -> impl Iterator<Item = &ElectionMessage> {
        self.actions.iter().filter_map(|a| match a {
            ElectionAction::Broadcast(m) => Some(m),
            _ => None,
        })
    }

    pub fn promotion(&self) -> Option<&Promotion> {
        self.actions.iter().find_map(|a| match a {
            ElectionAction::InstallLeader(p) => Some(p),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.actions.is_empty()
    }
}
