//! The (block height, minute) pair an election state governs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A block height and minute within it.
///
/// Positions order lexicographically: height first, then minute. Anything
/// strictly below a node's current position is stale.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub height: u32,
    pub minute: u8,
}

impl Position {
    pub fn new(height: u32, minute: u8) -> Self {
        Self { height, minute }
    }

    /// Whether `self` is strictly older than `current`.
    pub fn is_stale(&self, current: Position) -> bool {
        *self < current
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}/{}", self.height, self.minute)
    }
}
