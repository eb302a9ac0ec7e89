//! Nullable network — record election frames without sending them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fedelect_elections::{Broadcaster, ElectionError};
use fedelect_messages::ElectionMessage;
use tracing::warn;

/// A test broadcaster that records frames instead of sending them.
pub struct NullNetwork {
    /// All frames "broadcast" by the node.
    sent_frames: Mutex<Vec<Vec<u8>>>,
    /// When set, every broadcast fails.
    offline: AtomicBool,
}

impl NullNetwork {
    pub fn new() -> Self {
        Self {
            sent_frames: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Make subsequent broadcasts fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Get all sent frames (for assertions).
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent_frames.lock().unwrap().clone()
    }

    /// Decode every sent frame. Frames that fail to decode are skipped.
    pub fn sent_messages(&self) -> Vec<ElectionMessage> {
        self.sent()
            .iter()
            .filter_map(|frame| match ElectionMessage::decode(frame) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(error = %e, "undecodable frame in null network");
                    None
                }
            })
            .collect()
    }

    /// Remove and return everything sent so far.
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.sent_frames.lock().unwrap())
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.sent_frames.lock().unwrap().clear();
        self.offline.store(false, Ordering::SeqCst);
    }
}

impl Default for NullNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for NullNetwork {
    fn broadcast(&self, frame: &[u8]) -> Result<(), ElectionError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ElectionError::Broadcast("null network offline".into()));
        }
        self.sent_frames.lock().unwrap().push(frame.to_vec());
        Ok(())
    }
}
