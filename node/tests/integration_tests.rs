//! Integration tests running the election service on a paused tokio clock:
//! fault re-checks, cancellation, frame handling, shutdown, and a full
//! cluster of services exchanging frames through an in-memory router.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fedelect_crypto::server_id_from_name;
use fedelect_elections::{max_idx, order, Broadcaster, ElectionError, Roster};
use fedelect_messages::{ElectionMessage, Message, VolunteerAck, VolunteerAudit};
use fedelect_node::{
    start, Collaborators, ElectionHandle, NodeConfig, NodeError, RunningService, ServerEntry,
    ShutdownController,
};
use fedelect_nullables::{NullClock, NullNetwork, NullRoster};
use fedelect_types::{Position, Server, ServerId, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const POS: Position = Position {
    height: 10,
    minute: 3,
};
const FAULT_MS: u64 = 1_000;
const LEADERS: [&str; 3] = ["L0", "L1", "L2"];
const AUDITS: [&str; 2] = ["A0", "A1"];

const WIDE_LEADERS: [&str; 5] = ["L0", "L1", "L2", "L3", "L4"];
const WIDE_AUDITS: [&str; 3] = ["A0", "A1", "A2"];

fn config_for(name: &str, leaders: &[&str], audits: &[&str]) -> NodeConfig {
    NodeConfig {
        node_name: name.to_string(),
        fault_timeout_ms: FAULT_MS,
        enable_metrics: true,
        federated: leaders.iter().map(|n| ServerEntry::named(*n)).collect(),
        audit: audits.iter().map(|n| ServerEntry::named(*n)).collect(),
        ..NodeConfig::default()
    }
}

fn config(name: &str) -> NodeConfig {
    config_for(name, &LEADERS, &AUDITS)
}

fn id(name: &str) -> ServerId {
    server_id_from_name(name)
}

fn server(name: &str) -> Server {
    Server::new(id(name), name).unwrap()
}

/// Audit server ranked first for `slot`/`round` at [`POS`].
fn top_audit(slot: usize, round: u32) -> String {
    let roster = config("x").roster().unwrap();
    let idx = max_idx(&order(roster.audit(), POS.height, POS.minute, slot, round)).unwrap();
    AUDITS[idx].to_string()
}

/// Let every runnable task finish without reaching any fault deadline.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// One service wired to nullables.
struct Solo {
    net: Arc<NullNetwork>,
    roster: Arc<NullRoster>,
    shutdown: ShutdownController,
    running: RunningService,
}

impl Solo {
    fn start(name: &str) -> Self {
        Self::start_with(&config(name))
    }

    fn start_with(config: &NodeConfig) -> Self {
        let net = Arc::new(NullNetwork::new());
        let roster = Arc::new(NullRoster::new());
        let shutdown = ShutdownController::new();
        let collaborators = Collaborators {
            broadcaster: net.clone(),
            roster: roster.clone(),
            clock: Arc::new(NullClock::new(5_000)),
        };
        let running = start(config, POS, collaborators, shutdown.subscribe()).unwrap();
        Self {
            net,
            roster,
            shutdown,
            running,
        }
    }

    fn handle(&self) -> &ElectionHandle {
        &self.running.handle
    }

    fn metrics(&self) -> &fedelect_node::ElectionMetrics {
        self.running.metrics.as_deref().unwrap()
    }

    async fn sync(&self, leaders: &[&str]) {
        for leader in leaders {
            self.handle().leader_synced(id(leader), POS).await.unwrap();
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Fault detector
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn fault_recheck_refires_until_resolved() {
    let node = Solo::start("L0");
    node.sync(&["L0", "L2"]).await;
    node.handle().timeout(POS).await.unwrap();

    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.electing, Some(1));
    assert_eq!(snap.round(1), 1);

    for expected in 2..=4 {
        tokio::time::sleep(Duration::from_millis(FAULT_MS + 10)).await;
        let snap = node.handle().snapshot().await.unwrap();
        assert_eq!(snap.round(1), expected);
    }

    node.sync(&["L1"]).await;
    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.electing, None);
    assert_eq!(snap.round(1), 0);
    assert_eq!(node.metrics().pending_faults.get(), 0);

    tokio::time::sleep(Duration::from_millis(FAULT_MS * 5)).await;
    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.round(1), 0);
    assert_eq!(node.metrics().timeouts.get(), 4);
    assert_eq!(node.metrics().rounds.get(), 4);
    // A leader never volunteers.
    assert!(node.net.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn recheck_moves_on_when_leader_syncs() {
    let node = Solo::start("L0");
    node.sync(&["L0"]).await;
    node.handle().timeout(POS).await.unwrap();
    node.sync(&["L1"]).await;

    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.electing, Some(2));
    assert_eq!(node.metrics().pending_faults.get(), 1);

    for expected in 1..=3 {
        tokio::time::sleep(Duration::from_millis(FAULT_MS + 10)).await;
        let snap = node.handle().snapshot().await.unwrap();
        assert_eq!(snap.round(2), expected);
    }
    assert_eq!(node.metrics().timeouts.get(), 4);
}

#[tokio::test(start_paused = true)]
async fn recheck_moves_on_after_replacement() {
    let node = Solo::start_with(&config_for("L0", &WIDE_LEADERS, &AUDITS));
    node.sync(&["L0", "L3", "L4"]).await;
    node.handle().timeout(POS).await.unwrap();

    let winner = top_audit(1, 1);
    let roster = config("x").roster().unwrap();
    let idx = roster.audit_index(&id(&winner)).unwrap();
    let weight = order(roster.audit(), POS.height, POS.minute, 1, 1)[idx];
    let volunteer = VolunteerAudit::new(&server(&winner), 1, weight, POS, 1, Timestamp::new(1));
    volunteer.follower_execute(node.handle());
    for leader in ["L3", "L4"] {
        VolunteerAck::new(&server(leader), &volunteer, Timestamp::new(2))
            .follower_execute(node.handle());
    }
    settle().await;

    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.federated[1].name, winner);
    assert_eq!(snap.electing, Some(2));
    assert_eq!(node.roster.count(), 1);
    assert_eq!(node.metrics().pending_faults.get(), 1);

    tokio::time::sleep(Duration::from_millis(FAULT_MS + 10)).await;
    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.round(2), 1);
}

#[tokio::test(start_paused = true)]
async fn advancing_cancels_stale_rechecks() {
    let node = Solo::start("L0");
    node.handle().timeout(POS).await.unwrap();
    settle().await;
    assert_eq!(node.metrics().pending_faults.get(), 1);
    assert_eq!(node.metrics().majority_refusals.get(), 1);

    let next = Position::new(10, 4);
    node.handle().advance(next).await.unwrap();
    settle().await;
    assert_eq!(node.metrics().pending_faults.get(), 0);

    tokio::time::sleep(Duration::from_millis(FAULT_MS * 5)).await;
    let snap = node.handle().snapshot().await.unwrap();
    assert_eq!(snap.position, next);
    assert!(snap.round.is_empty());
    assert_eq!(node.metrics().stale_timeouts.get(), 0);
    assert_eq!(node.metrics().timeouts.get(), 1);
}

// ---------------------------------------------------------------------------
// 2. Service plumbing
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn top_audit_volunteers_with_clock_timestamp() {
    let name = top_audit(1, 1);
    let node = Solo::start(&name);
    node.sync(&["L0", "L2"]).await;
    node.handle().timeout(POS).await.unwrap();
    settle().await;

    let sent = node.net.sent_messages();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        ElectionMessage::VolunteerAudit(v) => {
            assert_eq!(v.server_name, name);
            assert_eq!(v.slot(), 1);
            assert_eq!(v.timestamp, Timestamp::new(5_000));
        }
        other => panic!("expected a volunteer, got {other:?}"),
    }
    assert_eq!(node.metrics().volunteers_sent.get(), 1);
    // Nobody acked, so nothing was installed.
    assert_eq!(node.roster.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn inbox_routes_volunteer_to_leader() {
    let node = Solo::start("L0");
    node.sync(&["L0", "L2"]).await;

    let winner = top_audit(1, 1);
    let roster = config("x").roster().unwrap();
    let idx = roster.audit_index(&id(&winner)).unwrap();
    let weight = order(roster.audit(), POS.height, POS.minute, 1, 1)[idx];
    let volunteer = VolunteerAudit::new(&server(&winner), 1, weight, POS, 1, Timestamp::new(1));

    volunteer.follower_execute(node.handle());
    settle().await;

    let sent = node.net.sent_messages();
    assert!(matches!(
        sent.as_slice(),
        [ElectionMessage::VolunteerAck(a)] if a.volunteer_id == id(&winner)
    ));
    assert_eq!(node.metrics().acks_sent.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn undecodable_frame_is_dropped() {
    let node = Solo::start("L0");
    let before = node.handle().snapshot().await.unwrap();
    node.handle().deliver_frame(vec![0xFF, 1, 2]).await.unwrap();
    node.handle().deliver_frame(Vec::new()).await.unwrap();
    let after = node.handle().snapshot().await.unwrap();
    assert_eq!(before, after);
    assert_eq!(node.metrics().frames_rejected.get(), 2);
}

#[tokio::test(start_paused = true)]
async fn broadcast_failure_does_not_stop_service() {
    let node = Solo::start(&top_audit(1, 1));
    node.net.set_offline(true);
    node.sync(&["L0", "L2"]).await;
    node.handle().timeout(POS).await.unwrap();
    settle().await;

    assert_eq!(node.metrics().broadcast_failures.get(), 1);
    assert_eq!(node.handle().snapshot().await.unwrap().round(1), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_service() {
    let node = Solo::start("L0");
    assert!(!node.shutdown.is_triggered());
    node.shutdown.shutdown();
    assert!(node.shutdown.is_triggered());
    let Solo { running, .. } = node;
    running.task.await.unwrap();
    assert!(matches!(
        running.handle.snapshot().await,
        Err(NodeError::ChannelClosed)
    ));
    assert!(running.handle.is_closed());
}

// ---------------------------------------------------------------------------
// 3. Cluster over an in-memory router
// ---------------------------------------------------------------------------

/// Delivers every broadcast to every other registered node.
#[derive(Default)]
struct Router {
    peers: Mutex<BTreeMap<String, ElectionHandle>>,
}

struct Port {
    from: String,
    router: Arc<Router>,
}

impl Broadcaster for Port {
    fn broadcast(&self, frame: &[u8]) -> Result<(), ElectionError> {
        let peers = self.router.peers.lock().unwrap();
        for (name, handle) in peers.iter().filter(|(n, _)| **n != self.from) {
            handle
                .try_deliver_frame(frame.to_vec())
                .map_err(|e| ElectionError::Broadcast(format!("{name}: {e}")))?;
        }
        Ok(())
    }
}

struct Member {
    roster: Arc<NullRoster>,
    running: RunningService,
}

fn cluster(live: &[&str], shutdown: &ShutdownController) -> BTreeMap<String, Member> {
    cluster_of(live, &LEADERS, &AUDITS, shutdown)
}

fn cluster_of(
    live: &[&str],
    leaders: &[&str],
    audits: &[&str],
    shutdown: &ShutdownController,
) -> BTreeMap<String, Member> {
    let router = Arc::new(Router::default());
    let mut members = BTreeMap::new();
    for name in live {
        let roster = Arc::new(NullRoster::new());
        let collaborators = Collaborators {
            broadcaster: Arc::new(Port {
                from: name.to_string(),
                router: router.clone(),
            }),
            roster: roster.clone(),
            clock: Arc::new(NullClock::new(0)),
        };
        let config = config_for(name, leaders, audits);
        let running = start(&config, POS, collaborators, shutdown.subscribe()).unwrap();
        router
            .peers
            .lock()
            .unwrap()
            .insert(name.to_string(), running.handle.clone());
        members.insert(name.to_string(), Member { roster, running });
    }
    members
}

#[tokio::test(start_paused = true)]
async fn cluster_replaces_silent_leader() {
    let shutdown = ShutdownController::new();
    let members = cluster(&["L0", "L2", "A0", "A1"], &shutdown);

    for member in members.values() {
        let handle = &member.running.handle;
        handle.leader_synced(id("L0"), POS).await.unwrap();
        handle.leader_synced(id("L2"), POS).await.unwrap();
        handle.timeout(POS).await.unwrap();
    }
    settle().await;

    let expected = top_audit(1, 1);
    for (name, member) in &members {
        let snap = member.running.handle.snapshot().await.unwrap();
        assert_eq!(snap.federated[1].name, expected, "node {name}");
        assert_eq!(snap.electing, None, "node {name}");
        assert!(snap.audit.iter().any(|s| s.name == "L1"), "node {name}");

        let installed = member.roster.installed();
        assert_eq!(installed.len(), 1, "node {name}");
        assert_eq!(installed[0].demoted.name, "L1");
        assert_eq!(member.running.metrics.as_ref().unwrap().pending_faults.get(), 0);
    }

    // Nothing is left to re-check.
    tokio::time::sleep(Duration::from_millis(FAULT_MS * 3)).await;
    for member in members.values() {
        assert_eq!(member.roster.count(), 1);
    }

    // The promotion survives into the next minute.
    let next = Position::new(10, 4);
    for member in members.values() {
        member.running.handle.advance(next).await.unwrap();
        let snap = member.running.handle.snapshot().await.unwrap();
        let roster = Roster::new(snap.federated.clone(), snap.audit.clone()).unwrap();
        assert_eq!(roster.leader(1).unwrap().name, expected);
        assert_eq!(snap.position, next);
    }
    shutdown.shutdown();
}

#[tokio::test(start_paused = true)]
async fn cluster_without_majority_keeps_roster() {
    let shutdown = ShutdownController::new();
    let members = cluster(&["L0", "A0", "A1"], &shutdown);

    for member in members.values() {
        let handle = &member.running.handle;
        handle.leader_synced(id("L0"), POS).await.unwrap();
        handle.timeout(POS).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(FAULT_MS * 3 + 10)).await;

    for (name, member) in &members {
        let snap = member.running.handle.snapshot().await.unwrap();
        assert_eq!(snap.federated[1].name, "L1", "node {name}");
        assert_eq!(snap.round(1), 4, "node {name}");
        assert_eq!(member.roster.count(), 0);
        let metrics = member.running.metrics.as_ref().unwrap();
        assert_eq!(metrics.majority_refusals.get(), 4);
        assert_eq!(metrics.volunteers_sent.get(), 0);
    }
    shutdown.shutdown();
}

#[tokio::test(start_paused = true)]
async fn cluster_replaces_two_silent_leaders_in_one_minute() {
    let shutdown = ShutdownController::new();
    let live = ["L0", "L3", "L4", "A0", "A1", "A2"];
    let members = cluster_of(&live, &WIDE_LEADERS, &WIDE_AUDITS, &shutdown);

    // One timeout per node; the fault detector drives everything after.
    for member in members.values() {
        let handle = &member.running.handle;
        for leader in ["L0", "L3", "L4"] {
            handle.leader_synced(id(leader), POS).await.unwrap();
        }
        handle.timeout(POS).await.unwrap();
    }

    let mut periods = 0;
    loop {
        settle().await;
        let mut settled = true;
        for member in members.values() {
            let snap = member.running.handle.snapshot().await.unwrap();
            settled &= snap.electing.is_none();
        }
        if settled {
            break;
        }
        periods += 1;
        assert!(periods < 64, "minute never settled");
        tokio::time::sleep(Duration::from_millis(FAULT_MS)).await;
    }

    let mut rosters = Vec::new();
    for (name, member) in &members {
        let snap = member.running.handle.snapshot().await.unwrap();
        let names: Vec<_> = snap.federated.iter().map(|s| s.name.clone()).collect();
        assert!(names[1].starts_with('A'), "node {name}: slot 1 is {}", names[1]);
        assert!(names[2].starts_with('A'), "node {name}: slot 2 is {}", names[2]);
        let slots: Vec<_> = member.roster.installed().iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![1, 2], "node {name}");
        rosters.push(names);
    }
    assert!(rosters.windows(2).all(|w| w[0] == w[1]), "rosters diverged");
    shutdown.shutdown();
}
