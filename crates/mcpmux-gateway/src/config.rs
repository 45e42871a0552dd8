//! Gateway configuration: TOML data model, `${VAR}` expansion, and
//! validation.
//!
//! Grounded on `original_source/mcp_manager/config/models.py`'s pydantic
//! models (`ManagerConfig`, `ServerConfig`, `HealthCheckConfig`,
//! `AccessRule`, `ClientRule`, `SourceConfig`, `RuntimeConfig`,
//! `MCPManagerConfig`), restated as plain `serde` structs with the
//! defaults the originals declared via `Field(default_factory=...)` or a
//! bare default value. TOML in place of the original's YAML, per the
//! teacher's own preference for `toml` over an ad hoc format.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

fn default_true() -> bool {
    true
}

/// Top-level configuration file: `[manager]`, `[servers.*]`, `[clients.*]`,
/// `[sources.*]`, `[runtime]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManagerFile {
    /// Manager identity and logging.
    #[serde(default)]
    pub manager: ManagerConfig,
    /// Backend servers this gateway can launch or connect to, keyed by
    /// server id.
    #[serde(default)]
    pub servers: HashMap<String, ServerConfig>,
    /// Per-client access rules, keyed by a label (not necessarily the
    /// client's own name). An [`IndexMap`] rather than a [`HashMap`]
    /// because [`crate::access::ClientIdentifier`] must evaluate rules in
    /// the order they were declared in the file — first match wins.
    #[serde(default)]
    pub clients: IndexMap<String, ClientRule>,
    /// Installer/registry sources, keyed by source name. Not consulted by
    /// the gateway itself (no installer subsystem here), but round-tripped
    /// so a shared config file validates.
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
    /// Runtime tuning knobs.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Gateway identity and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Display name, surfaced in logs and the initialize handshake.
    #[serde(default = "ManagerConfig::default_name")]
    pub name: String,
    /// Reported version string.
    #[serde(default = "ManagerConfig::default_version")]
    pub version: String,
    /// Optional listen port, reserved for a future non-stdio front-end.
    #[serde(default)]
    pub port: Option<u16>,
    /// Minimum log level.
    #[serde(default = "ManagerConfig::default_log_level")]
    pub log_level: String,
}

impl ManagerConfig {
    fn default_name() -> String {
        "mcp-manager".to_string()
    }
    fn default_version() -> String {
        "1.0.0".to_string()
    }
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            version: Self::default_version(),
            port: None,
            log_level: Self::default_log_level(),
        }
    }
}

/// How a backend is launched or reached, and how its health is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Source string: `npm:<pkg>`, `pip:<pkg>`, `uvx:<pkg>`,
    /// `github:<org>/<repo>`, `local:<path>`, `binary:<path>`, or an
    /// `http://`/`https://` endpoint for `transport = "sse"`/`"websocket"`.
    pub source: String,
    /// Pinned version, where the source supports one.
    #[serde(default)]
    pub version: Option<String>,
    /// Pinned branch, for `github:` sources.
    #[serde(default)]
    pub branch: Option<String>,
    /// How the gateway talks to this backend.
    #[serde(default = "ServerConfig::default_transport")]
    pub transport: String,
    /// Endpoint override for non-stdio transports.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Arbitrary launch-time configuration (environment variables, CLI
    /// flags) forwarded to the backend.
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    /// Optional health check spec; `None` disables active health checks
    /// for this backend.
    #[serde(default)]
    pub health_check: Option<HealthCheckSpec>,
    /// Whether the supervisor may install this backend automatically.
    /// Not consulted by the gateway (no installer subsystem here), kept so
    /// a shared config file round-trips.
    #[serde(default = "default_true")]
    pub auto_install: bool,
    /// Whether this backend participates in `start_all`/routing at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ServerConfig {
    fn default_transport() -> String {
        "stdio".to_string()
    }
}

/// How a backend's liveness is probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    /// `"ping"` sends a bare liveness probe; `"tool_call"` invokes `tool`.
    #[serde(default = "HealthCheckSpec::default_method")]
    pub method: String,
    /// Tool name to invoke when `method = "tool_call"`.
    #[serde(default)]
    pub tool: Option<String>,
    /// Arguments for the probe tool call.
    #[serde(default)]
    pub args: Option<HashMap<String, serde_json::Value>>,
    /// Seconds between health checks.
    #[serde(default = "HealthCheckSpec::default_interval")]
    pub interval: u64,
    /// Seconds to wait for a single probe before declaring it failed.
    #[serde(default = "HealthCheckSpec::default_timeout")]
    pub timeout: u64,
}

impl HealthCheckSpec {
    fn default_method() -> String {
        "ping".to_string()
    }
    fn default_interval() -> u64 {
        300
    }
    fn default_timeout() -> u64 {
        10
    }
}

impl Default for HealthCheckSpec {
    fn default() -> Self {
        Self {
            method: Self::default_method(),
            tool: None,
            args: None,
            interval: Self::default_interval(),
            timeout: Self::default_timeout(),
        }
    }
}

/// One allow/deny rule: a backend id plus optional tool and resource name
/// lists (shell-style trailing-`*` wildcards allowed). `None` means "every
/// tool/resource of this server"; `Some(vec![])` means none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRule {
    /// Backend server id this rule applies to.
    pub server: String,
    /// Tool name patterns this rule covers, or `None` for all tools.
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    /// Resource name patterns this rule covers, or `None` for all
    /// resources.
    #[serde(default)]
    pub resources: Option<Vec<String>>,
}

/// How a client identifies itself, and what it's allowed to reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRule {
    /// Ordered list of `{context_key: expected_value}` maps; a client
    /// matches this rule only if every map in the list matches (and every
    /// key within each map matches the corresponding `ConnectionContext`
    /// field, exactly or by trailing-`*` wildcard).
    pub identify_by: Vec<HashMap<String, String>>,
    /// Explicit allow rules.
    #[serde(default)]
    pub allow: Vec<AccessRule>,
    /// Explicit deny rules, always evaluated before `allow`.
    #[serde(default)]
    pub deny: Vec<AccessRule>,
    /// When true, anything not explicitly allowed is denied; when false,
    /// anything not explicitly denied is allowed.
    #[serde(default)]
    pub deny_all_except_allowed: bool,
}

/// Installer/registry source configuration. Round-tripped for config-file
/// compatibility; not consulted by the gateway itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceConfig {
    /// Package registry URL.
    #[serde(default)]
    pub registry: Option<String>,
    /// Base URL for `http(s):` sources.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bearer token for authenticated registries.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Base filesystem path for `local:` sources.
    #[serde(default)]
    pub base_path: Option<String>,
}

/// Runtime tuning: concurrency, timeouts, caching, health checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Upper bound on requests in flight at once, enforced by a semaphore
    /// at the front-end.
    #[serde(default = "RuntimeConfig::default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Default per-request timeout, in seconds, for operations without a
    /// more specific deadline.
    #[serde(default = "RuntimeConfig::default_request_timeout")]
    pub request_timeout: u64,
    /// Reserved for a future connection-pooling backend session.
    #[serde(default = "RuntimeConfig::default_backend_pool_size")]
    pub backend_pool_size: usize,
    /// Whether the supervisor runs its periodic health-check loop.
    #[serde(default = "default_true")]
    pub health_check_enabled: bool,
    /// Whether the router records a latency sample for each backend call.
    /// Request/cache counters are always maintained; this only gates the
    /// latency EMA.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    /// Whether a backend that fails health checks is restarted
    /// automatically.
    #[serde(default = "default_true")]
    pub auto_restart_failed_servers: bool,
    /// Default cache TTL, in seconds, for cacheable router responses.
    #[serde(default = "RuntimeConfig::default_cache_ttl")]
    pub cache_ttl: u64,
}

impl RuntimeConfig {
    fn default_max_concurrent_requests() -> usize {
        100
    }
    fn default_request_timeout() -> u64 {
        30
    }
    fn default_backend_pool_size() -> usize {
        10
    }
    fn default_cache_ttl() -> u64 {
        300
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: Self::default_max_concurrent_requests(),
            request_timeout: Self::default_request_timeout(),
            backend_pool_size: Self::default_backend_pool_size(),
            health_check_enabled: true,
            metrics_enabled: true,
            auto_restart_failed_servers: true,
            cache_ttl: Self::default_cache_ttl(),
        }
    }
}

/// Load a TOML config file from `path`, expand `${VAR}` references against
/// the process environment, and parse into a [`ManagerFile`].
pub fn load(path: impl AsRef<Path>) -> GatewayResult<ManagerFile> {
    let raw = std::fs::read_to_string(path.as_ref())
        .map_err(|e| GatewayError::config_invalid(format!("reading {:?}: {e}", path.as_ref())))?;
    parse(&raw)
}

/// Parse raw TOML text into a [`ManagerFile`], after `${VAR}` expansion.
pub fn parse(raw: &str) -> GatewayResult<ManagerFile> {
    let mut document: toml::Value = toml::from_str(raw)
        .map_err(|e| GatewayError::config_invalid(format!("parsing TOML: {e}")))?;
    expand_env(&mut document);
    document
        .try_into()
        .map_err(|e| GatewayError::config_invalid(format!("deserializing config: {e}")))
}

/// Recursively walk every string leaf of `value`, replacing `${VAR}`
/// references with the corresponding environment variable. A variable that
/// isn't set is left literal, matching the original's behavior of passing
/// unresolved placeholders through rather than failing the load.
fn expand_env(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => {
            *s = expand_env_str(s);
        }
        toml::Value::Array(items) => {
            for item in items {
                expand_env(item);
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_env(item);
            }
        }
        _ => {}
    }
}

fn expand_env_str(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '$' && input[i + 1..].starts_with('{') {
            if let Some(end) = input[i + 2..].find('}') {
                let var_name = &input[i + 2..i + 2 + end];
                match std::env::var(var_name) {
                    Ok(value) => output.push_str(&value),
                    Err(_) => output.push_str(&input[i..i + 3 + end]),
                }
                for _ in 0..(end + 2) {
                    chars.next();
                }
                continue;
            }
        }
        output.push(c);
    }
    output
}

/// Validate a parsed config, returning every problem found rather than
/// stopping at the first one, so a reload attempt can report a complete
/// list of issues.
pub fn validate(config: &ManagerFile) -> Vec<String> {
    let mut issues = Vec::new();

    for (server_id, server) in &config.servers {
        if server.source.is_empty() {
            issues.push(format!("servers.{server_id}: 'source' must not be empty"));
        }
        if !matches!(server.transport.as_str(), "stdio" | "sse" | "websocket") {
            issues.push(format!(
                "servers.{server_id}: unknown transport '{}'",
                server.transport
            ));
        }
        if server.transport != "stdio" && server.endpoint.is_none() {
            issues.push(format!(
                "servers.{server_id}: transport '{}' requires an 'endpoint'",
                server.transport
            ));
        }
    }

    for (client_id, client) in &config.clients {
        if client.identify_by.is_empty() {
            issues.push(format!(
                "clients.{client_id}: 'identify_by' must name at least one match rule"
            ));
        }
        for rule in client.allow.iter().chain(client.deny.iter()) {
            if !config.servers.contains_key(&rule.server) {
                issues.push(format!(
                    "clients.{client_id}: rule references unknown server '{}'",
                    rule.server
                ));
            }
        }
    }

    if config.runtime.max_concurrent_requests == 0 {
        issues.push("runtime.max_concurrent_requests must be at least 1".to_string());
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [manager]
        name = "test-manager"

        [servers.fs]
        source = "npm:@modelcontextprotocol/server-filesystem"
        transport = "stdio"

        [servers.fs.config]
        root = "${HOME}"

        [servers.remote]
        source = "https://example.com/mcp"
        transport = "sse"
        endpoint = "https://example.com/mcp"

        [clients.default]
        identify_by = [{ client_name = "claude-desktop" }]
        deny_all_except_allowed = true

        [[clients.default.allow]]
        server = "fs"
        tools = ["read_*"]

        [runtime]
        max_concurrent_requests = 50
    "#;

    #[test]
    fn parses_sample_config() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.manager.name, "test-manager");
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.runtime.max_concurrent_requests, 50);
        assert_eq!(config.runtime.cache_ttl, 300);
    }

    #[test]
    fn expands_env_vars_recursively() {
        // SAFETY: test-only, single-threaded access to this specific var.
        unsafe {
            std::env::set_var("MCPMUX_TEST_EXPAND", "/tmp/expanded");
        }
        let raw = r#"
            [servers.fs]
            source = "local:${MCPMUX_TEST_EXPAND}"
        "#;
        let config = parse(raw).unwrap();
        assert_eq!(config.servers["fs"].source, "local:/tmp/expanded");
        unsafe {
            std::env::remove_var("MCPMUX_TEST_EXPAND");
        }
    }

    #[test]
    fn unset_var_is_left_literal() {
        let raw = r#"
            [servers.fs]
            source = "local:${MCPMUX_DEFINITELY_UNSET_VAR}"
        "#;
        let config = parse(raw).unwrap();
        assert_eq!(
            config.servers["fs"].source,
            "local:${MCPMUX_DEFINITELY_UNSET_VAR}"
        );
    }

    #[test]
    fn validate_flags_empty_source() {
        let mut config = ManagerFile::default();
        config.servers.insert(
            "broken".to_string(),
            ServerConfig {
                source: String::new(),
                version: None,
                branch: None,
                transport: "stdio".to_string(),
                endpoint: None,
                config: HashMap::new(),
                health_check: None,
                auto_install: true,
                enabled: true,
            },
        );
        let issues = validate(&config);
        assert!(issues.iter().any(|i| i.contains("'source' must not be empty")));
    }

    #[test]
    fn validate_flags_client_rule_referencing_unknown_server() {
        let mut config = ManagerFile::default();
        config.clients.insert(
            "c".to_string(),
            ClientRule {
                identify_by: vec![HashMap::new()],
                allow: vec![AccessRule {
                    server: "ghost".to_string(),
                    tools: None,
                    resources: None,
                }],
                deny: vec![],
                deny_all_except_allowed: false,
            },
        );
        let issues = validate(&config);
        assert!(issues.iter().any(|i| i.contains("unknown server 'ghost'")));
    }

    #[test]
    fn validate_accepts_well_formed_config() {
        let config = parse(SAMPLE).unwrap();
        assert!(validate(&config).is_empty());
    }
}
