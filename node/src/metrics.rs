//! Prometheus metrics for the election service.
//!
//! [`ElectionMetrics`] owns a dedicated [`Registry`]. The service feeds it
//! every [`ElectionEvent`] the engine returns, plus the pending fault count
//! and current electing slot after each input.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

use fedelect_elections::ElectionEvent;

/// Central collection of all election-level Prometheus metrics.
pub struct ElectionMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Timeouts handled, stale ones included.
    pub timeouts: IntCounter,
    pub stale_timeouts: IntCounter,
    /// Round increments across all slots.
    pub rounds: IntCounter,
    /// Timeouts that found too many leaders unsynced to replace one.
    pub majority_refusals: IntCounter,
    pub volunteers_sent: IntCounter,
    pub volunteers_accepted: IntCounter,
    pub volunteers_rejected: IntCounter,
    pub acks_sent: IntCounter,
    pub acks_rejected: IntCounter,
    /// Acks repeated by this leader on a fault re-check.
    pub acks_resent: IntCounter,
    /// Installing acks rebroadcast for peers that missed them.
    pub acks_relayed: IntCounter,
    pub leaders_installed: IntCounter,
    /// Inbound frames that failed to decode.
    pub frames_rejected: IntCounter,
    pub broadcast_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Slot under election, or -1 when every leader is synced.
    pub electing_slot: IntGauge,
    /// Armed fault re-checks.
    pub pending_faults: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name} counter: {e}"))
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name} gauge: {e}"))
}

impl ElectionMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let timeouts = counter(
            &registry,
            "fedelect_timeouts_total",
            "Timeouts handled by the election engine",
        );
        let stale_timeouts = counter(
            &registry,
            "fedelect_stale_timeouts_total",
            "Timeouts ignored because their position had passed",
        );
        let rounds = counter(
            &registry,
            "fedelect_rounds_total",
            "Election rounds started",
        );
        let majority_refusals = counter(
            &registry,
            "fedelect_majority_refusals_total",
            "Timeouts where too many leaders were unsynced to elect",
        );
        let volunteers_sent = counter(
            &registry,
            "fedelect_volunteers_sent_total",
            "Volunteer messages sent by this node",
        );
        let volunteers_accepted = counter(
            &registry,
            "fedelect_volunteers_accepted_total",
            "Volunteer messages accepted",
        );
        let volunteers_rejected = counter(
            &registry,
            "fedelect_volunteers_rejected_total",
            "Volunteer messages discarded",
        );
        let acks_sent = counter(
            &registry,
            "fedelect_acks_sent_total",
            "Volunteer acks sent by this node",
        );
        let acks_rejected = counter(
            &registry,
            "fedelect_acks_rejected_total",
            "Volunteer acks discarded",
        );
        let acks_resent = counter(
            &registry,
            "fedelect_acks_resent_total",
            "Volunteer acks repeated on a fault re-check",
        );
        let acks_relayed = counter(
            &registry,
            "fedelect_acks_relayed_total",
            "Installing acks rebroadcast for lagging peers",
        );
        let leaders_installed = counter(
            &registry,
            "fedelect_leaders_installed_total",
            "Audit servers promoted to leader",
        );
        let frames_rejected = counter(
            &registry,
            "fedelect_frames_rejected_total",
            "Inbound frames that failed to decode",
        );
        let broadcast_failures = counter(
            &registry,
            "fedelect_broadcast_failures_total",
            "Election messages that could not be broadcast",
        );

        let electing_slot = gauge(
            &registry,
            "fedelect_electing_slot",
            "Slot under election, -1 when all leaders are synced",
        );
        let pending_faults = gauge(
            &registry,
            "fedelect_pending_faults",
            "Fault re-checks currently armed",
        );
        electing_slot.set(-1);

        Self {
            registry,
            timeouts,
            stale_timeouts,
            rounds,
            majority_refusals,
            volunteers_sent,
            volunteers_accepted,
            volunteers_rejected,
            acks_sent,
            acks_rejected,
            acks_resent,
            acks_relayed,
            leaders_installed,
            frames_rejected,
            broadcast_failures,
            electing_slot,
            pending_faults,
        }
    }

    /// Count one engine event.
    pub fn observe(&self, event: &ElectionEvent) {
        match event {
            ElectionEvent::StaleTimeout { .. } => {
                self.timeouts.inc();
                self.stale_timeouts.inc();
            }
            ElectionEvent::AllSynced { .. } => self.timeouts.inc(),
            ElectionEvent::RoundAdvanced { .. } => {
                self.timeouts.inc();
                self.rounds.inc();
            }
            ElectionEvent::MajorityRefused { .. } => self.majority_refusals.inc(),
            ElectionEvent::Volunteered { .. } => self.volunteers_sent.inc(),
            ElectionEvent::VolunteerAccepted { .. } => self.volunteers_accepted.inc(),
            ElectionEvent::VolunteerRejected(_) => self.volunteers_rejected.inc(),
            ElectionEvent::AckSent { .. } => self.acks_sent.inc(),
            ElectionEvent::AckRejected(_) => self.acks_rejected.inc(),
            ElectionEvent::AckResent { .. } => self.acks_resent.inc(),
            ElectionEvent::AcksRelayed { count, .. } => {
                self.acks_relayed.inc_by(u64::try_from(*count).unwrap_or(u64::MAX));
            }
            ElectionEvent::LeaderInstalled(_) => self.leaders_installed.inc(),
            _ => {}
        }
    }

    /// Record the engine's current electing slot.
    pub fn set_electing(&self, slot: Option<usize>) {
        self.electing_slot
            .set(slot.map_or(-1, |s| i64::try_from(s).unwrap_or(i64::MAX)));
    }
}

impl Default for ElectionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
