//! A single backend MCP connection: launch, handshake, typed operations,
//! health probing, and teardown.
//!
//! Grounded on `original_source/mcp_manager/server/process.py`'s
//! `MCPProcess` for the lifecycle state machine and per-operation
//! timeouts, and on `proxy/backend.rs`'s `AnyClient`/`dispatch_client!`
//! pattern for erasing `turbomcp_client::Client<T>`'s transport generic
//! behind one concrete type.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use turbomcp_client::Client;
use turbomcp_protocol::types::{GetPromptResult, Prompt, ReadResourceResult, Resource, Tool};
use turbomcp_transport::{
    ChildProcessConfig, ChildProcessTransport, Transport, WebSocketBidirectionalConfig,
    WebSocketBidirectionalTransport,
    streamable_http_client::{StreamableHttpClientConfig, StreamableHttpClientTransport},
};

use crate::config::{HealthCheckSpec, ServerConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::model::{HealthStatus, LaunchPlan, ProcessStatus};

/// Default deadline for `call_tool`.
const CALL_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
/// Default deadline for `read_resource`.
const READ_RESOURCE_TIMEOUT: Duration = Duration::from_secs(15);
/// Default deadline for list operations (tools, resources, prompts).
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for a `"ping"`-style health probe.
const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Type-erased client, hiding `turbomcp_client::Client<T>`'s transport
/// generic behind one concrete enum so a `BackendSession` doesn't need to
/// be generic over transport.
#[derive(Clone)]
enum AnyClient {
    Stdio(Arc<Client<ChildProcessTransport>>),
    Http(Arc<Client<StreamableHttpClientTransport>>),
    WebSocket(Arc<Client<WebSocketBidirectionalTransport>>),
}

macro_rules! dispatch_client {
    ($client:expr, $method:ident($($args:expr),*)) => {
        match $client {
            AnyClient::Stdio(c) => c.$method($($args),*).await,
            AnyClient::Http(c) => c.$method($($args),*).await,
            AnyClient::WebSocket(c) => c.$method($($args),*).await,
        }
    };
}

/// One backend MCP server's connection and lifecycle state.
///
/// Running iff `status == Running` and an `AnyClient` is held; this
/// invariant is maintained by `start`/`stop` alone and never observed from
/// the outside as a momentary inconsistency, since both take the write
/// lock for their whole transition.
pub struct BackendSession {
    server_id: String,
    config: ServerConfig,
    status: RwLock<ProcessStatus>,
    client: RwLock<Option<AnyClient>>,
    request_count: AtomicU64,
    error_count: AtomicU64,
    start_time: RwLock<Option<Instant>>,
    last_health: RwLock<HealthStatus>,
}

impl BackendSession {
    /// Build a session for `server_id`, not yet started. `enabled = false`
    /// servers are constructed in [`ProcessStatus::NotConfigured`] and
    /// refuse to start.
    pub fn new(server_id: impl Into<String>, config: ServerConfig) -> Self {
        let status = if config.enabled {
            ProcessStatus::Stopped
        } else {
            ProcessStatus::NotConfigured
        };
        Self {
            server_id: server_id.into(),
            config,
            status: RwLock::new(status),
            client: RwLock::new(None),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            start_time: RwLock::new(None),
            last_health: RwLock::new(HealthStatus::Unknown),
        }
    }

    /// This session's backend id.
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// The config this session was constructed from.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn status(&self) -> ProcessStatus {
        *self.status.read().await
    }

    /// Most recently observed health status.
    pub async fn health_status(&self) -> HealthStatus {
        *self.last_health.read().await
    }

    /// How long this session has been running, if it is.
    pub async fn uptime(&self) -> Option<Duration> {
        if *self.status.read().await != ProcessStatus::Running {
            return None;
        }
        self.start_time.read().await.map(|t| t.elapsed())
    }

    /// Requests served since construction (or the last count reset).
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests that ended in an error since construction.
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Launch the backend and run the MCP handshake. A no-op if already
    /// running or starting; refuses if the server is disabled.
    pub async fn start(&self) -> GatewayResult<()> {
        {
            let status = self.status.read().await;
            if matches!(*status, ProcessStatus::Running | ProcessStatus::Starting) {
                return Ok(());
            }
            if *status == ProcessStatus::NotConfigured {
                return Err(GatewayError::invalid_request(format!(
                    "server '{}' is disabled",
                    self.server_id
                )));
            }
        }
        *self.status.write().await = ProcessStatus::Starting;
        info!(server_id = %self.server_id, "starting backend");

        let plan = match self.launch_plan() {
            Ok(plan) => plan,
            Err(e) => {
                *self.status.write().await = ProcessStatus::Failed;
                warn!(server_id = %self.server_id, error = %e, "backend failed to start");
                return Err(e);
            }
        };
        match self.connect(&plan).await {
            Ok(client) => {
                *self.client.write().await = Some(client);
                *self.start_time.write().await = Some(Instant::now());
                *self.status.write().await = ProcessStatus::Running;
                info!(server_id = %self.server_id, "backend started");
                Ok(())
            }
            Err(e) => {
                *self.status.write().await = ProcessStatus::Failed;
                warn!(server_id = %self.server_id, error = %e, "backend failed to start");
                Err(e)
            }
        }
    }

    /// Tear down the connection. A no-op if already stopped.
    pub async fn stop(&self) -> GatewayResult<()> {
        {
            let status = self.status.read().await;
            if matches!(
                *status,
                ProcessStatus::Stopped | ProcessStatus::NotConfigured
            ) {
                return Ok(());
            }
        }
        *self.status.write().await = ProcessStatus::Stopping;
        info!(server_id = %self.server_id, "stopping backend");
        *self.client.write().await = None;
        *self.start_time.write().await = None;
        *self.status.write().await = ProcessStatus::Stopped;
        Ok(())
    }

    /// Probe liveness per the configured `health_check` spec, defaulting to
    /// a `list_tools` call when none is configured. Never returns an
    /// error: failure is reported as `HealthStatus::Unhealthy`.
    pub async fn health_check(&self) -> HealthStatus {
        let status = *self.status.read().await;
        if status != ProcessStatus::Running {
            let health = HealthStatus::Unhealthy;
            *self.last_health.write().await = health;
            return health;
        }

        let result = match &self.config.health_check {
            Some(HealthCheckSpec {
                method, tool, args, timeout, ..
            }) if method == "tool_call" => {
                let Some(tool) = tool else {
                    warn!(server_id = %self.server_id, "tool_call health check missing 'tool'");
                    *self.last_health.write().await = HealthStatus::Unhealthy;
                    return HealthStatus::Unhealthy;
                };
                self.call_tool_with_timeout(
                    tool,
                    args.clone(),
                    Duration::from_secs(*timeout),
                )
                .await
                .map(|_| ())
            }
            Some(spec) => self
                .list_tools_with_timeout(Duration::from_secs(spec.timeout))
                .await
                .map(|_| ()),
            None => self
                .list_tools_with_timeout(DEFAULT_HEALTH_TIMEOUT)
                .await
                .map(|_| ()),
        };

        let health = match result {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(server_id = %self.server_id, error = %e, "health check failed");
                HealthStatus::Unhealthy
            }
        };
        *self.last_health.write().await = health;
        health
    }

    /// Invoke `name` with `arguments`, enforcing the 30s call-tool
    /// deadline.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> GatewayResult<Value> {
        self.call_tool_with_timeout(name, arguments, CALL_TOOL_TIMEOUT)
            .await
    }

    async fn call_tool_with_timeout(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
        timeout: Duration,
    ) -> GatewayResult<Value> {
        self.with_client("call_tool", timeout, |client| async move {
            dispatch_client!(&client, call_tool(name, arguments))
                .map_err(|e| GatewayError::backend_failure(self.server_id.clone(), e.to_string()))
        })
        .await
    }

    /// List tools, enforcing the 10s list-operation deadline.
    pub async fn list_tools(&self) -> GatewayResult<Vec<Tool>> {
        self.list_tools_with_timeout(LIST_TIMEOUT).await
    }

    async fn list_tools_with_timeout(&self, timeout: Duration) -> GatewayResult<Vec<Tool>> {
        self.with_client("list_tools", timeout, |client| async move {
            dispatch_client!(&client, list_tools())
                .map_err(|e| GatewayError::backend_failure(self.server_id.clone(), e.to_string()))
        })
        .await
    }

    /// List resources, enforcing the 10s list-operation deadline.
    pub async fn list_resources(&self) -> GatewayResult<Vec<Resource>> {
        self.with_client("list_resources", LIST_TIMEOUT, |client| async move {
            dispatch_client!(&client, list_resources())
                .map_err(|e| GatewayError::backend_failure(self.server_id.clone(), e.to_string()))
        })
        .await
    }

    /// Read `uri`, enforcing the 15s read-resource deadline.
    pub async fn read_resource(&self, uri: &str) -> GatewayResult<ReadResourceResult> {
        self.with_client("read_resource", READ_RESOURCE_TIMEOUT, |client| async move {
            dispatch_client!(&client, read_resource(uri))
                .map_err(|e| GatewayError::backend_failure(self.server_id.clone(), e.to_string()))
        })
        .await
    }

    /// List prompts, enforcing the 10s list-operation deadline.
    pub async fn list_prompts(&self) -> GatewayResult<Vec<Prompt>> {
        self.with_client("list_prompts", LIST_TIMEOUT, |client| async move {
            dispatch_client!(&client, list_prompts())
                .map_err(|e| GatewayError::backend_failure(self.server_id.clone(), e.to_string()))
        })
        .await
    }

    /// Render a prompt, enforcing the 10s list-operation deadline (prompts
    /// are not on the call-tool critical path).
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> GatewayResult<GetPromptResult> {
        self.with_client("get_prompt", LIST_TIMEOUT, |client| async move {
            dispatch_client!(&client, get_prompt(name, arguments))
                .map_err(|e| GatewayError::backend_failure(self.server_id.clone(), e.to_string()))
        })
        .await
    }

    async fn with_client<T, F, Fut>(&self, operation: &str, timeout: Duration, f: F) -> GatewayResult<T>
    where
        F: FnOnce(AnyClient) -> Fut,
        Fut: std::future::Future<Output = GatewayResult<T>>,
    {
        let client = {
            let guard = self.client.read().await;
            guard.clone().ok_or_else(|| {
                GatewayError::backend_failure(self.server_id.clone(), "backend not running")
            })?
        };

        self.request_count.fetch_add(1, Ordering::Relaxed);
        let result = tokio::time::timeout(timeout, f(client)).await;
        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            Err(_) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                Err(GatewayError::timeout(operation, timeout.as_secs()))
            }
        }
    }

    fn launch_plan(&self) -> GatewayResult<LaunchPlan> {
        let (command, args) = if self.config.transport == "stdio" {
            resolve_stdio_command(&self.config.source)?
        } else {
            (String::new(), Vec::new())
        };
        Ok(LaunchPlan {
            command,
            args,
            working_directory: None,
            environment: LaunchPlan::adapt_config_env(&self.config.config),
        })
    }

    async fn connect(&self, plan: &LaunchPlan) -> GatewayResult<AnyClient> {
        match self.config.transport.as_str() {
            "stdio" => self.connect_stdio(plan).await,
            "sse" => self.connect_http().await,
            "websocket" => self.connect_websocket().await,
            other => Err(GatewayError::config_invalid(format!(
                "unsupported transport '{other}' for server '{}'",
                self.server_id
            ))),
        }
    }

    async fn connect_stdio(&self, plan: &LaunchPlan) -> GatewayResult<AnyClient> {
        let process_config = ChildProcessConfig {
            command: plan.command.clone(),
            args: plan.args.clone(),
            working_directory: plan.working_directory.clone(),
            environment: if plan.environment.is_empty() {
                None
            } else {
                Some(plan.environment.clone())
            },
            ..Default::default()
        };

        let transport = ChildProcessTransport::new(process_config);
        transport.connect().await.map_err(|e| {
            GatewayError::backend_failure(self.server_id.clone(), format!("connect: {e}"))
        })?;

        debug!(server_id = %self.server_id, "stdio backend connected");

        let mut client = Client::new(transport);
        client.initialize().await.map_err(|e| {
            GatewayError::backend_failure(self.server_id.clone(), format!("initialize: {e}"))
        })?;

        Ok(AnyClient::Stdio(Arc::new(client)))
    }

    async fn connect_http(&self) -> GatewayResult<AnyClient> {
        let base_url = self.config.endpoint.clone().ok_or_else(|| {
            GatewayError::config_invalid(format!(
                "server '{}' requires 'endpoint' for transport 'sse'",
                self.server_id
            ))
        })?;

        let http_config = StreamableHttpClientConfig {
            base_url,
            endpoint_path: "/mcp".to_string(),
            timeout: Duration::from_secs(30),
            auth_token: None,
            ..Default::default()
        };

        let transport = StreamableHttpClientTransport::new(http_config);
        transport.connect().await.map_err(|e| {
            GatewayError::backend_failure(self.server_id.clone(), format!("connect: {e}"))
        })?;

        let mut client = Client::new(transport);
        client.initialize().await.map_err(|e| {
            GatewayError::backend_failure(self.server_id.clone(), format!("initialize: {e}"))
        })?;

        Ok(AnyClient::Http(Arc::new(client)))
    }

    async fn connect_websocket(&self) -> GatewayResult<AnyClient> {
        let url = self.config.endpoint.clone().ok_or_else(|| {
            GatewayError::config_invalid(format!(
                "server '{}' requires 'endpoint' for transport 'websocket'",
                self.server_id
            ))
        })?;

        let ws_config = WebSocketBidirectionalConfig {
            url: Some(url),
            ..Default::default()
        };

        let transport = WebSocketBidirectionalTransport::new(ws_config)
            .await
            .map_err(|e| {
                GatewayError::backend_failure(self.server_id.clone(), format!("connect: {e}"))
            })?;

        let mut client = Client::new(transport);
        client.initialize().await.map_err(|e| {
            GatewayError::backend_failure(self.server_id.clone(), format!("initialize: {e}"))
        })?;

        Ok(AnyClient::WebSocket(Arc::new(client)))
    }
}

/// Resolve a `ServerConfig.source` string into `(command, args)` for a
/// stdio launch. `npm:`/`pip:`/`uvx:` sources run via their package
/// runners; `binary:`/`local:` sources run the path directly.
fn resolve_stdio_command(source: &str) -> GatewayResult<(String, Vec<String>)> {
    let Some((kind, rest)) = source.split_once(':') else {
        return Err(GatewayError::config_invalid(format!(
            "source '{source}' has no '<kind>:' prefix"
        )));
    };
    match kind {
        "npm" => Ok(("npx".to_string(), vec!["-y".to_string(), rest.to_string()])),
        "uvx" => Ok(("uvx".to_string(), vec![rest.to_string()])),
        "pip" => Ok(("python".to_string(), vec!["-m".to_string(), rest.to_string()])),
        "binary" | "local" => Ok((rest.to_string(), Vec::new())),
        "github" => Err(GatewayError::config_invalid(
            "github: sources require the installer subsystem, not started directly",
        )),
        other => Err(GatewayError::config_invalid(format!(
            "unknown source kind '{other}' in '{source}'"
        ))),
    }
}
