//! Per-minute record of which federated slots have acknowledged.

/// One flag per federated slot, true once that slot's leader has been seen
/// healthy for the current minute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncTracker {
    synced: Vec<bool>,
}

impl SyncTracker {
    /// A tracker for `slots` leaders, none of them synced yet.
    pub fn new(slots: usize) -> Self {
        Self {
            synced: vec![false; slots],
        }
    }

    pub fn from_flags(synced: Vec<bool>) -> Self {
        Self { synced }
    }

    pub fn len(&self) -> usize {
        self.synced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synced.is_empty()
    }

    /// Out-of-range slots read as unsynced.
    pub fn is_synced(&self, slot: usize) -> bool {
        self.synced.get(slot).copied().unwrap_or(false)
    }

    /// Mark a slot synced. Returns `true` if the flag changed.
    pub fn mark(&mut self, slot: usize) -> bool {
        match self.synced.get_mut(slot) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        }
    }

    /// Start a new minute: every slot unsynced again.
    pub fn reset(&mut self) {
        self.synced.iter_mut().for_each(|f| *f = false);
    }

    /// Lowest slot still waiting on its leader.
    pub fn first_unsynced(&self) -> Option<usize> {
        self.synced.iter().position(|synced| !synced)
    }

    pub fn unsynced_count(&self) -> usize {
        self.synced.iter().filter(|synced| !**synced).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.synced
    }
}
