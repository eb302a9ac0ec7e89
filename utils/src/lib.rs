//! Shared utilities for federated leader elections.

pub mod logging;

pub use logging::{build_filter, init_logging, LogFormat, LoggingError};
