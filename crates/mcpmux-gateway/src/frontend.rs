//! Front-end Server: the stdio-facing MCP session that front-ends every
//! configured backend behind one namespace.
//!
//! Grounded on `proxy/frontends/stdio.rs`'s `StdioFrontend`: the same
//! `MAX_LINE_SIZE`-guarded `BufReader`/`read_line` loop and
//! `write_success_response`/`write_error_response` pair, generalized from a
//! single `HttpBackend` passthrough to dispatching into the [`Router`]
//! (§4.E) against the full multi-backend namespace, with an `initialize`
//! handshake, per-connection [`ConnectionContext`]/client identification,
//! and a pre-routing access-control check for `call_tool`/`read_resource`
//! per spec.md §4.H point 2.

use std::io::Write as _;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, trace, warn};
use turbomcp_protocol::MessageId;
use turbomcp_protocol::jsonrpc::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, JsonRpcResponsePayload, ResponseId,
};
use turbomcp_protocol::types::{
    Content, GetPromptResult, Implementation, InitializeResult, ListPromptsResult,
    ListResourcesResult, ListToolsResult, PromptsCapabilities, ReadResourceResult,
    ResourceContent, ResourcesCapabilities, ServerCapabilities, TextContent,
    TextResourceContents, ToolsCapabilities,
};

use crate::access::ClientIdentifier;
use crate::config::ManagerConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::model::ConnectionContext;
use crate::namespace::{parse_namespaced_item, parse_namespaced_resource};
use crate::router::{GatewayRequest, GatewayResponse, Router};

/// Maximum line size in bytes (10 MB), matching the teacher's own
/// `MAX_REQUEST_SIZE` convention.
const MAX_LINE_SIZE: usize = 10 * 1024 * 1024;

/// Drives one stdio-connected MCP session: reads JSON-RPC requests line by
/// line, dispatches them through the [`Router`], and writes responses.
pub struct GatewayFrontend {
    router: Arc<Router>,
    identifier: Arc<ClientIdentifier>,
    manager: ManagerConfig,
    semaphore: Arc<Semaphore>,
    context: RwLock<ConnectionContext>,
}

impl GatewayFrontend {
    /// Build a front-end over `router`, resolving clients via `identifier`,
    /// advertising `manager`'s identity at handshake time, and bounding
    /// in-flight requests to `max_concurrent_requests`.
    pub fn new(
        router: Arc<Router>,
        identifier: Arc<ClientIdentifier>,
        manager: ManagerConfig,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            router,
            identifier,
            manager,
            semaphore: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            context: RwLock::new(ConnectionContext::new("stdio")),
        }
    }

    /// Run the stdin read loop until EOF. Every per-request failure is
    /// caught and converted to a protocol error response; this loop itself
    /// only returns on a stdin I/O error or clean EOF, never on a request
    /// handler failure, per spec.md §7's propagation policy.
    pub async fn run(&self) -> GatewayResult<()> {
        debug!("starting gateway front-end event loop");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("front-end received EOF, shutting down");
                    break;
                }
                Ok(_) => {
                    if line.len() > MAX_LINE_SIZE {
                        error!(size = line.len(), "request line exceeds maximum size");
                        self.write_error_response(
                            None,
                            -32700,
                            "Request too large",
                            Some(format!(
                                "request size {} bytes exceeds maximum {MAX_LINE_SIZE} bytes",
                                line.len()
                            )),
                        )
                        .await?;
                        continue;
                    }

                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    trace!(line = %trimmed, "received request line");

                    match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                        Ok(request) => {
                            let _permit = self.semaphore.acquire().await;
                            if let Err(e) = self.handle_request(request).await {
                                error!(error = %e, "error handling request");
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to parse JSON-RPC request");
                            self.write_error_response(None, -32700, "Parse error", None)
                                .await?;
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "error reading from stdin");
                    return Err(GatewayError::Io(e));
                }
            }
        }

        debug!("front-end event loop completed");
        Ok(())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> GatewayResult<()> {
        let result = self.dispatch(&request).await;
        match result {
            Ok(value) => self.write_success_response(&request.id, value).await,
            Err(e) => {
                let rpc_err: JsonRpcError = (&e).into();
                self.write_error_response(Some(&request.id), rpc_err.code, &rpc_err.message, {
                    match rpc_err.data {
                        Some(Value::String(s)) => Some(s),
                        Some(other) => Some(other.to_string()),
                        None => None,
                    }
                })
                .await
            }
        }
    }

    /// Resolve one request to its JSON-RPC result value, or a
    /// [`GatewayError`] that `handle_request` converts into the wire error
    /// shape. Every branch here is infallible with respect to the session
    /// loop: nothing panics, and every error path returns `Err` rather than
    /// propagating out of `run`.
    async fn dispatch(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await,
            "notifications/initialized" => Ok(Value::Null),
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => self.handle_call_tool(request).await,
            "resources/list" => self.handle_list_resources().await,
            "resources/read" => self.handle_read_resource(request).await,
            "prompts/list" => self.handle_list_prompts().await,
            "prompts/get" => self.handle_get_prompt(request).await,
            other => Err(GatewayError::not_found(format!("unknown method: {other}"))),
        }
    }

    async fn handle_initialize(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        let params = request
            .params
            .clone()
            .ok_or_else(|| GatewayError::invalid_request("missing params for initialize"))?;

        {
            let mut context = self.context.write().await;
            if let Some(client_info) = params.get("clientInfo") {
                context.client_name = client_info
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                context.client_version = client_info
                    .get("version")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            self.identifier.identify(&mut context);
        }

        let result = InitializeResult {
            protocol_version: turbomcp_protocol::PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapabilities {
                    list_changed: Some(true),
                }),
                resources: Some(ResourcesCapabilities {
                    subscribe: Some(false),
                    list_changed: Some(true),
                }),
                prompts: Some(PromptsCapabilities {
                    list_changed: Some(true),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: self.manager.name.clone(),
                title: None,
                version: self.manager.version.clone(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: None,
            _meta: None,
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn client_id(&self) -> String {
        self.context
            .read()
            .await
            .client_id
            .clone()
            .unwrap_or_else(|| "default".to_string())
    }

    async fn handle_list_tools(&self) -> GatewayResult<Value> {
        let client_id = self.client_id().await;
        let response = self.router.route(GatewayRequest::ListTools, &client_id).await?;
        let GatewayResponse::ListTools(tools) = response else {
            unreachable!("route(ListTools) always returns GatewayResponse::ListTools");
        };
        Ok(serde_json::to_value(ListToolsResult {
            tools,
            next_cursor: None,
            _meta: None,
        })?)
    }

    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        let params = request
            .params
            .clone()
            .ok_or_else(|| GatewayError::invalid_request("missing params for tools/call"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::invalid_request("missing 'name' in tools/call"))?
            .to_string();
        let arguments = params
            .get("arguments")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let client_id = self.client_id().await;
        if let Ok((server_id, tool_name)) = parse_namespaced_item(&name) {
            if !self.router.check_tool_access(&client_id, server_id, tool_name) {
                warn!(client_id = %client_id, tool = %name, "tool call denied");
                return Ok(access_denied_tool_result(&name));
            }
        }

        let response = self
            .router
            .route(GatewayRequest::CallTool { name, arguments }, &client_id)
            .await?;
        let GatewayResponse::CallTool(value) = response else {
            unreachable!("route(CallTool) always returns GatewayResponse::CallTool");
        };
        Ok(value)
    }

    async fn handle_list_resources(&self) -> GatewayResult<Value> {
        let client_id = self.client_id().await;
        let response = self
            .router
            .route(GatewayRequest::ListResources, &client_id)
            .await?;
        let GatewayResponse::ListResources(resources) = response else {
            unreachable!("route(ListResources) always returns GatewayResponse::ListResources");
        };
        Ok(serde_json::to_value(ListResourcesResult {
            resources,
            next_cursor: None,
            _meta: None,
        })?)
    }

    async fn handle_read_resource(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        let params = request
            .params
            .clone()
            .ok_or_else(|| GatewayError::invalid_request("missing params for resources/read"))?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::invalid_request("missing 'uri' in resources/read"))?
            .to_string();

        let client_id = self.client_id().await;
        if let Ok((server_id, resource_uri)) = parse_namespaced_resource(&uri) {
            if !self.router.check_resource_access(&client_id, server_id, resource_uri) {
                warn!(client_id = %client_id, uri = %uri, "resource read denied");
                return Ok(access_denied_resource_result(&uri));
            }
        }

        let response = self
            .router
            .route(GatewayRequest::ReadResource { uri }, &client_id)
            .await?;
        let GatewayResponse::ReadResource(result) = response else {
            unreachable!("route(ReadResource) always returns GatewayResponse::ReadResource");
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn handle_list_prompts(&self) -> GatewayResult<Value> {
        let client_id = self.client_id().await;
        let response = self.router.route(GatewayRequest::ListPrompts, &client_id).await?;
        let GatewayResponse::ListPrompts(prompts) = response else {
            unreachable!("route(ListPrompts) always returns GatewayResponse::ListPrompts");
        };
        Ok(serde_json::to_value(ListPromptsResult {
            prompts,
            next_cursor: None,
            _meta: None,
        })?)
    }

    async fn handle_get_prompt(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        let params = request
            .params
            .clone()
            .ok_or_else(|| GatewayError::invalid_request("missing params for prompts/get"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::invalid_request("missing 'name' in prompts/get"))?
            .to_string();
        let arguments = params
            .get("arguments")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        let client_id = self.client_id().await;
        let response = self
            .router
            .route(GatewayRequest::GetPrompt { name, arguments }, &client_id)
            .await?;
        let GatewayResponse::GetPrompt(result): GatewayResponse = response else {
            unreachable!("route(GetPrompt) always returns GatewayResponse::GetPrompt");
        };
        let _: GetPromptResult = result.clone();
        Ok(serde_json::to_value(result)?)
    }

    async fn write_success_response(&self, id: &MessageId, result: Value) -> GatewayResult<()> {
        let response = JsonRpcResponse {
            jsonrpc: turbomcp_protocol::jsonrpc::JsonRpcVersion,
            id: ResponseId::from_request(id.clone()),
            payload: JsonRpcResponsePayload::Success { result },
        };
        self.write_response(&response)
    }

    async fn write_error_response(
        &self,
        id: Option<&MessageId>,
        code: i32,
        message: &str,
        data: Option<String>,
    ) -> GatewayResult<()> {
        let error = JsonRpcError {
            code,
            message: message.to_string(),
            data: data.map(Value::String),
        };
        let response = JsonRpcResponse {
            jsonrpc: turbomcp_protocol::jsonrpc::JsonRpcVersion,
            id: ResponseId(id.cloned()),
            payload: JsonRpcResponsePayload::Error { error },
        };
        self.write_response(&response)
    }

    fn write_response(&self, response: &JsonRpcResponse) -> GatewayResult<()> {
        let json = serde_json::to_string(response)?;
        trace!(response = %json, "writing response");
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{json}")?;
        stdout.flush()?;
        Ok(())
    }
}

/// A `tools/call` access-control denial, rendered as a successful
/// `CallToolResult` carrying an `is_error` text content block, per
/// spec.md §7's "text content block beginning `Access denied:`".
fn access_denied_tool_result(namespaced_name: &str) -> Value {
    serde_json::json!({
        "content": [Content::Text(TextContent {
            text: format!("Access denied: {namespaced_name}"),
            annotations: None,
            meta: None,
        })],
        "isError": true,
    })
}

/// A `resources/read` access-control denial, rendered as a successful
/// `ReadResourceResult` whose sole content is the denial text, per
/// spec.md §7's "denied resource read returns the text `Access denied: …`".
fn access_denied_resource_result(namespaced_uri: &str) -> Value {
    let result = ReadResourceResult {
        contents: vec![ResourceContent::Text(TextResourceContents {
            uri: namespaced_uri.to_string(),
            mime_type: Some("text/plain".to_string()),
            text: format!("Access denied: {namespaced_uri}"),
            meta: None,
        })],
        _meta: None,
    };
    serde_json::to_value(result).unwrap_or(Value::Null)
}
