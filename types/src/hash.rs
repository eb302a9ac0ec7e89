//! Message hash type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte message hash, used as the identity of a message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MsgHash([u8; 32]);

impl MsgHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for MsgHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MsgHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for MsgHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_default() {
        assert!(MsgHash::default().is_zero());
        assert_eq!(MsgHash::default(), MsgHash::ZERO);
    }

    #[test]
    fn debug_shows_prefix_only() {
        let h = MsgHash::new([0xab; 32]);
        assert_eq!(format!("{:?}", h), "MsgHash(abababab)");
        assert_eq!(format!("{}", h).len(), 64);
    }
}
