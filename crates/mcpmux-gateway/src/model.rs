//! Core data-model types shared across the gateway.
//!
//! Grounded on `original_source/mcp_manager/server/process.py` (`ProcessStatus`,
//! `HealthStatus`) and `original_source/mcp_manager/access/client_identifier.py`
//! (`ConnectionContext`).

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`crate::session::BackendSession`].
///
/// `stopped → starting → running ↔ stopping → stopped`; any operation or
/// handshake failure drives `* → failed`. Only `stopped` or `failed` may be
/// started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Never started, or cleanly stopped.
    Stopped,
    /// Launch plan built, transport connecting, handshake in flight.
    Starting,
    /// Session handle open and initialized.
    Running,
    /// Teardown in progress.
    Stopping,
    /// A start, handshake, or operation failed.
    Failed,
    /// The backend is disabled in configuration and has never been launched.
    NotConfigured,
}

/// Outcome of the most recent health probe for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The probe succeeded.
    Healthy,
    /// The probe failed or timed out.
    Unhealthy,
    /// No probe has run yet.
    Unknown,
}

/// Everything needed to spawn a backend over stdio.
///
/// Grounded on `turbomcp_transport::child_process::ChildProcessConfig` and
/// `original_source/mcp_manager/server/process.py`'s `_start_stdio` (which
/// merges detector-provided environment with the adapted configuration env).
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Command to execute.
    pub command: String,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Working directory; defaults to the install root when `None`.
    pub working_directory: Option<String>,
    /// Environment variables overlaid onto the inherited process environment.
    pub environment: Vec<(String, String)>,
}

impl LaunchPlan {
    /// Build a launch plan from a server's free-form config map, per §4.B's
    /// configuration-adaptation rule: keys are upper-cased, scalars
    /// stringified, booleans rendered as `"true"`/`"false"`, lists joined
    /// with commas.
    pub fn adapt_config_env(config: &HashMap<String, serde_json::Value>) -> Vec<(String, String)> {
        config
            .iter()
            .map(|(key, value)| (key.to_uppercase(), Self::stringify(value)))
            .collect()
    }

    fn stringify(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::stringify)
                .collect::<Vec<_>>()
                .join(","),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Metadata extracted from an inbound MCP session, used to identify the
/// calling client for access control.
#[derive(Debug, Clone, Default)]
pub struct ConnectionContext {
    /// Client name reported at `initialize` time, if any.
    pub client_name: Option<String>,
    /// Client version reported at `initialize` time, if any.
    pub client_version: Option<String>,
    /// Transport kind: `"stdio"`, `"sse"`, or `"websocket"`.
    pub transport_type: String,
    /// Request headers, for transports that carry them (HTTP/WebSocket).
    pub headers: HashMap<String, String>,
    /// Peer address, if known.
    pub remote_address: Option<String>,
    /// When this context was constructed.
    pub timestamp: SystemTime,
    /// The client id resolved by the Client Identifier; empty until resolved.
    pub client_id: Option<String>,
}

impl ConnectionContext {
    /// Start a new context for a transport of the given kind.
    pub fn new(transport_type: impl Into<String>) -> Self {
        Self {
            transport_type: transport_type.into(),
            timestamp: SystemTime::now(),
            ..Default::default()
        }
    }

    /// Extract the value for one of the context keys from §4.G's table.
    /// Missing values resolve to an empty string, which matches only `"*"`.
    pub fn extract(&self, key: &str) -> String {
        match key {
            "client_info.name" => self.client_name.clone().unwrap_or_default(),
            "client_info.version" => self.client_version.clone().unwrap_or_default(),
            "transport_type" | "connection_source" => self.transport_type.clone(),
            "user_agent" => self
                .headers
                .get("User-Agent")
                .or_else(|| self.headers.get("user-agent"))
                .cloned()
                .unwrap_or_default(),
            "remote_address" => self.remote_address.clone().unwrap_or_default(),
            other => other
                .strip_prefix("header.")
                .and_then(|header_name| {
                    self.headers
                        .get(header_name)
                        .or_else(|| self.headers.get(&header_name.to_lowercase()))
                })
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapts_config_env_per_rule() {
        let mut config = HashMap::new();
        config.insert("path".to_string(), serde_json::json!("/a"));
        config.insert("verbose".to_string(), serde_json::json!(true));
        config.insert(
            "extra_paths".to_string(),
            serde_json::json!(["/b", "/c"]),
        );
        let env: HashMap<_, _> = LaunchPlan::adapt_config_env(&config).into_iter().collect();
        assert_eq!(env.get("PATH"), Some(&"/a".to_string()));
        assert_eq!(env.get("VERBOSE"), Some(&"true".to_string()));
        assert_eq!(env.get("EXTRA_PATHS"), Some(&"/b,/c".to_string()));
    }

    #[test]
    fn extracts_known_context_keys() {
        let mut ctx = ConnectionContext::new("stdio");
        ctx.client_name = Some("claude-desktop".to_string());
        ctx.headers
            .insert("User-Agent".to_string(), "claude/1.0".to_string());
        assert_eq!(ctx.extract("client_info.name"), "claude-desktop");
        assert_eq!(ctx.extract("transport_type"), "stdio");
        assert_eq!(ctx.extract("user_agent"), "claude/1.0");
        assert_eq!(ctx.extract("client_info.version"), "");
    }

    #[test]
    fn extracts_arbitrary_header() {
        let mut ctx = ConnectionContext::new("sse");
        ctx.headers
            .insert("X-Api-Key".to_string(), "secret".to_string());
        assert_eq!(ctx.extract("header.X-Api-Key"), "secret");
        assert_eq!(ctx.extract("header.missing"), "");
    }
}
