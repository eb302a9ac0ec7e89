//! The election service: one task that owns a node's [`Elections`].
//!
//! Timeouts, fault re-checks, peer frames, sync signals, position changes
//! and snapshot queries all arrive through one bounded queue and are
//! applied strictly in order. The engine's returned actions are carried
//! out here: broadcasts go to the [`Broadcaster`], promotions to the
//! [`RosterSink`], and fault re-checks to the [`FaultDetector`].

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use fedelect_elections::{
    Broadcaster, Clock, ElectionAction, ElectionSnapshot, Elections, Outcome, RosterSink,
};
use fedelect_messages::ElectionMessage;
use fedelect_types::Position;

use crate::config::NodeConfig;
use crate::fault_detector::FaultDetector;
use crate::handle::ElectionHandle;
use crate::metrics::ElectionMetrics;
use crate::tracing_spans::{broadcast_span, input_span, install_span};
use crate::NodeError;

/// Everything the election service can be asked to do.
pub enum ElectionInput {
    Message(ElectionMessage),
    /// An undecoded frame from a peer.
    Frame(Vec<u8>),
    Advance(Position),
    Snapshot(oneshot::Sender<ElectionSnapshot>),
}

/// The outside world as seen by the election service.
#[derive(Clone)]
pub struct Collaborators {
    pub broadcaster: Arc<dyn Broadcaster>,
    pub roster: Arc<dyn RosterSink>,
    pub clock: Arc<dyn Clock>,
}

pub struct ElectionService {
    elections: Elections,
    inputs: mpsc::Receiver<ElectionInput>,
    detector: FaultDetector,
    collaborators: Collaborators,
    metrics: Option<Arc<ElectionMetrics>>,
}

impl ElectionService {
    /// Build the service and the handle used to feed it.
    pub fn new(
        elections: Elections,
        config: &NodeConfig,
        collaborators: Collaborators,
    ) -> (Self, ElectionHandle) {
        let (tx, inputs) = mpsc::channel(config.input_capacity.max(1));
        let name = elections.identity().name.clone();
        let detector = FaultDetector::new(name.clone(), config.fault_timeout(), tx.downgrade());
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(ElectionMetrics::new()));
        let service = Self {
            elections,
            inputs,
            detector,
            collaborators,
            metrics,
        };
        (service, ElectionHandle::new(&name, tx))
    }

    pub fn metrics(&self) -> Option<Arc<ElectionMetrics>> {
        self.metrics.clone()
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Process inputs until shutdown or until every handle is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let node = self.elections.identity().name.clone();
        info!(
            node = %node,
            position = %self.elections.position(),
            fault_timeout_ms = self.detector.delay().as_millis() as u64,
            "election service started"
        );
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(node = %node, "election service shutting down");
                    break;
                }
                input = self.inputs.recv() => match input {
                    Some(input) => self.handle_input(input),
                    None => {
                        debug!(node = %node, "all election handles dropped");
                        break;
                    }
                },
            }
        }
        self.detector.abort_all();
    }

    fn handle_input(&mut self, input: ElectionInput) {
        match input {
            ElectionInput::Message(message) => self.handle_message(message),
            ElectionInput::Frame(frame) => match ElectionMessage::decode(&frame) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    warn!(
                        node = %self.elections.identity().name,
                        error = %e,
                        len = frame.len(),
                        "dropping undecodable election frame"
                    );
                    if let Some(m) = &self.metrics {
                        m.frames_rejected.inc();
                    }
                }
            },
            ElectionInput::Advance(to) => {
                let out = self.elections.advance(to);
                self.execute(out);
            }
            ElectionInput::Snapshot(reply) => {
                let _ = reply.send(self.elections.snapshot());
            }
        }
    }

    fn handle_message(&mut self, message: ElectionMessage) {
        let span = input_span(
            &self.elections.identity().name,
            message.message_type().as_str(),
            message.position(),
        );
        let _enter = span.enter();
        let out = self
            .elections
            .process(&message, self.collaborators.clock.now());
        self.execute(out);
    }

    fn execute(&mut self, out: Outcome) {
        if let Some(m) = &self.metrics {
            for event in &out.events {
                m.observe(event);
            }
        }

        for action in out.actions {
            match action {
                ElectionAction::ScheduleFault { position, slot } => {
                    self.detector.arm(position, slot)
                }
                ElectionAction::CancelFault { position, slot } => {
                    self.detector.cancel(position, slot)
                }
                ElectionAction::CancelStale { before } => self.detector.cancel_before(before),
                ElectionAction::Broadcast(message) => self.broadcast(&message),
                ElectionAction::InstallLeader(promotion) => {
                    let _enter = install_span(promotion.slot, promotion.round).entered();
                    self.collaborators.roster.install_leader(&promotion);
                }
            }
        }

        if let Some(m) = &self.metrics {
            m.pending_faults.set(self.detector.pending() as i64);
            m.set_electing(self.elections.state().electing());
        }
    }

    fn broadcast(&self, message: &ElectionMessage) {
        let span = broadcast_span(message.message_type().as_str());
        let result = span.in_scope(|| {
            let frame = message.encode()?;
            self.collaborators.broadcaster.broadcast(&frame)?;
            Ok::<_, NodeError>(())
        });
        if let Err(e) = result {
            warn!(
                node = %self.elections.identity().name,
                msg_type = message.message_type().as_str(),
                error = %e,
                "election broadcast failed"
            );
            if let Some(m) = &self.metrics {
                m.broadcast_failures.inc();
            }
        }
    }
}

/// A started election service.
pub struct RunningService {
    pub handle: ElectionHandle,
    pub metrics: Option<Arc<ElectionMetrics>>,
    pub task: JoinHandle<()>,
}

/// Build a service from `config` and start it on the current runtime.
pub fn start(
    config: &NodeConfig,
    position: Position,
    collaborators: Collaborators,
    shutdown: broadcast::Receiver<()>,
) -> Result<RunningService, NodeError> {
    let elections = Elections::new(config.identity()?, config.roster()?, position);
    let (service, handle) = ElectionService::new(elections, config, collaborators);
    let metrics = service.metrics();
    let span = info_span!("election_service", node = %config.node_name);
    let task = tokio::spawn(service.run(shutdown).instrument(span));
    Ok(RunningService {
        handle,
        metrics,
        task,
    })
}
