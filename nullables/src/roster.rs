//! Nullable roster sink — records leader installations.

use std::sync::Mutex;

use fedelect_elections::{Promotion, RosterSink};

/// Collects every promotion it is told about.
#[derive(Default)]
pub struct NullRoster {
    installed: Mutex<Vec<Promotion>>,
}

impl NullRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed(&self) -> Vec<Promotion> {
        self.installed.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.installed.lock().unwrap().len()
    }
}

impl RosterSink for NullRoster {
    fn install_leader(&self, promotion: &Promotion) {
        self.installed.lock().unwrap().push(promotion.clone());
    }
}
