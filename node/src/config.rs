//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use fedelect_crypto::server_id_from_name;
use fedelect_elections::Roster;
use fedelect_types::{Server, ServerId};
use fedelect_utils::LogFormat;

use crate::NodeError;

/// One entry of the federated or audit list.
///
/// `id` is the 64-character hex server id. When omitted it is derived from
/// `name`, which is convenient for local clusters and tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ServerEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    pub fn to_server(&self) -> Result<Server, NodeError> {
        let id = match &self.id {
            Some(hex) => ServerId::from_hex(hex)?,
            None => server_id_from_name(&self.name),
        };
        Ok(Server::new(id, self.name.clone())?)
    }
}

/// Configuration for an election node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// This node's server name.
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// This node's hex server id; derived from `node_name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,

    /// Delay before an unresolved fault is re-checked, in milliseconds.
    #[serde(default = "default_fault_timeout_ms")]
    pub fault_timeout_ms: u64,

    /// Capacity of the election service's input queue.
    #[serde(default = "default_input_capacity")]
    pub input_capacity: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to record Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Leaders, in slot order.
    #[serde(default)]
    pub federated: Vec<ServerEntry>,

    /// Standby servers eligible for promotion.
    #[serde(default)]
    pub audit: Vec<ServerEntry>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_node_name() -> String {
    "node".to_string()
}

fn default_fault_timeout_ms() -> u64 {
    10_000
}

fn default_input_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Install the global tracing subscriber with this config's format
    /// and level.
    pub fn init_logging(&self) -> Result<(), NodeError> {
        fedelect_utils::init_logging(self.log_format, &self.log_level)
            .map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn fault_timeout(&self) -> Duration {
        Duration::from_millis(self.fault_timeout_ms)
    }

    /// This node's own identity.
    pub fn identity(&self) -> Result<Server, NodeError> {
        ServerEntry {
            name: self.node_name.clone(),
            id: self.server_id.clone(),
        }
        .to_server()
    }

    /// Build the initial roster from the federated and audit lists.
    pub fn roster(&self) -> Result<Roster, NodeError> {
        let federated = self
            .federated
            .iter()
            .map(ServerEntry::to_server)
            .collect::<Result<Vec<_>, _>>()?;
        let audit = self
            .audit
            .iter()
            .map(ServerEntry::to_server)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Roster::new(federated, audit)?)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            server_id: None,
            fault_timeout_ms: default_fault_timeout_ms(),
            input_capacity: default_input_capacity(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: false,
            federated: Vec::new(),
            audit: Vec::new(),
        }
    }
}
