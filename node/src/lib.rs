//! Election node — runs the election engine against real time and a real
//! network.
//!
//! The node wires the pure [`fedelect_elections::Elections`] state machine
//! into a runtime:
//! - A single service task owns the engine and applies inputs in order
//! - A fault detector re-raises timeouts for leaders that stay silent
//! - Broadcasts, roster changes and time go through collaborator traits
//! - Configuration comes from TOML, metrics go to a Prometheus registry

pub mod config;
pub mod error;
pub mod fault_detector;
pub mod handle;
pub mod metrics;
pub mod service;
pub mod shutdown;
pub mod tracing_spans;

pub use config::{NodeConfig, ServerEntry};
pub use error::NodeError;
pub use fault_detector::FaultDetector;
pub use handle::ElectionHandle;
pub use metrics::ElectionMetrics;
pub use service::{start, Collaborators, ElectionInput, ElectionService, RunningService};
pub use shutdown::ShutdownController;
