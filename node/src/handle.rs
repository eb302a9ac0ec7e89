//! Cloneable front door to a running [`ElectionService`](crate::ElectionService).

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use fedelect_elections::ElectionSnapshot;
use fedelect_messages::{ElectionInbox, ElectionMessage, LeaderSynced, TimeoutInternal};
use fedelect_types::{Position, ServerId};

use crate::service::ElectionInput;
use crate::NodeError;

/// Sends inputs to the election service. Every call is queued behind the
/// inputs already submitted, so callers never observe a half-applied
/// state.
#[derive(Clone)]
pub struct ElectionHandle {
    node_name: Arc<str>,
    tx: mpsc::Sender<ElectionInput>,
}

impl ElectionHandle {
    pub(crate) fn new(node_name: &str, tx: mpsc::Sender<ElectionInput>) -> Self {
        Self {
            node_name: Arc::from(node_name),
            tx,
        }
    }

    async fn send(&self, input: ElectionInput) -> Result<(), NodeError> {
        self.tx.send(input).await.map_err(|_| NodeError::ChannelClosed)
    }

    fn try_send(&self, input: ElectionInput) -> Result<(), NodeError> {
        self.tx.try_send(input).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NodeError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NodeError::ChannelClosed,
        })
    }

    pub async fn submit(&self, message: ElectionMessage) -> Result<(), NodeError> {
        self.send(ElectionInput::Message(message)).await
    }

    /// Raise the end-of-minute timeout for `position`.
    pub async fn timeout(&self, position: Position) -> Result<(), NodeError> {
        let timeout = TimeoutInternal::new(self.node_name.as_ref(), position);
        self.submit(timeout.into()).await
    }

    /// Report that `server` produced its acknowledgment at `position`.
    pub async fn leader_synced(&self, server: ServerId, position: Position) -> Result<(), NodeError> {
        self.submit(LeaderSynced::new(server, position).into()).await
    }

    /// Hand over a frame received from a peer.
    pub async fn deliver_frame(&self, frame: Vec<u8>) -> Result<(), NodeError> {
        self.send(ElectionInput::Frame(frame)).await
    }

    /// Non-blocking [`deliver_frame`](Self::deliver_frame) for callers
    /// outside async context, such as network callbacks.
    pub fn try_deliver_frame(&self, frame: Vec<u8>) -> Result<(), NodeError> {
        self.try_send(ElectionInput::Frame(frame))
    }

    pub async fn advance(&self, to: Position) -> Result<(), NodeError> {
        self.send(ElectionInput::Advance(to)).await
    }

    pub async fn snapshot(&self) -> Result<ElectionSnapshot, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.send(ElectionInput::Snapshot(reply)).await?;
        rx.await.map_err(|_| NodeError::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ElectionInbox for ElectionHandle {
    fn enqueue(&self, message: ElectionMessage) {
        let msg_type = message.message_type();
        if let Err(e) = self.try_send(ElectionInput::Message(message)) {
            warn!(node = %self.node_name, msg_type = msg_type.as_str(), error = %e, "election message dropped");
        }
    }
}
