//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while constructing fundamental types.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("server name must not be empty")]
    EmptyName,
}
