//! Re-checks unresolved leader faults after a delay.
//!
//! Every timeout that finds an unsynced leader asks for another look. The
//! detector spawns one sleeping task per `(position, slot)`; when it wakes
//! it feeds a fresh [`TimeoutInternal`] back into the election service's
//! input queue, which advances the slot's round. A check is dropped as
//! soon as the slot resolves or the node moves past its position; the
//! engine then arms one for the next unsynced slot, if any.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use fedelect_messages::TimeoutInternal;
use fedelect_types::Position;

use crate::service::ElectionInput;

type CheckKey = (Position, usize);

pub struct FaultDetector {
    node_name: String,
    delay: Duration,
    /// Weak, so armed checks never keep a stopped service's queue alive.
    inputs: mpsc::WeakSender<ElectionInput>,
    checks: HashMap<CheckKey, JoinHandle<()>>,
}

impl FaultDetector {
    pub fn new(
        node_name: impl Into<String>,
        delay: Duration,
        inputs: mpsc::WeakSender<ElectionInput>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            delay,
            inputs,
            checks: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule a re-check of `slot` at `position`, replacing any check
    /// already armed for the same key. Must run inside a tokio runtime.
    pub fn arm(&mut self, position: Position, slot: usize) {
        self.checks.retain(|_, task| !task.is_finished());
        if let Some(previous) = self.checks.remove(&(position, slot)) {
            previous.abort();
        }

        let inputs = self.inputs.clone();
        let delay = self.delay;
        let timeout = TimeoutInternal::new(self.node_name.clone(), position);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(tx) = inputs.upgrade() else {
                return;
            };
            trace!(%position, slot, "fault re-check fired");
            if tx.send(ElectionInput::Message(timeout.into())).await.is_err() {
                debug!(%position, slot, "election service gone, re-check dropped");
            }
        });
        self.checks.insert((position, slot), task);
    }

    /// Drop the check for a resolved slot.
    pub fn cancel(&mut self, position: Position, slot: usize) {
        if let Some(task) = self.checks.remove(&(position, slot)) {
            task.abort();
            trace!(%position, slot, "fault re-check cancelled");
        }
    }

    /// Drop every check for a position earlier than `before`.
    pub fn cancel_before(&mut self, before: Position) {
        self.checks.retain(|(position, _), task| {
            let keep = *position >= before;
            if !keep {
                task.abort();
            }
            keep
        });
    }

    /// Abort everything, e.g. on shutdown.
    pub fn abort_all(&mut self) {
        for (_, task) in self.checks.drain() {
            task.abort();
        }
    }

    /// Checks that are armed and have not fired yet.
    pub fn pending(&self) -> usize {
        self.checks.values().filter(|t| !t.is_finished()).count()
    }
}

impl Drop for FaultDetector {
    fn drop(&mut self) {
        self.abort_all();
    }
}
