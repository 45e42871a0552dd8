//! Error types for the gateway
//!
//! Follows TurboMCP's pattern of wrapping protocol errors to preserve their
//! codes while giving the gateway's own failure modes a closed, named
//! taxonomy: `InvalidRequest`, `NotFound`, `Timeout`, `BackendFailure`,
//! `ConfigInvalid`.

use thiserror::Error;
use turbomcp_protocol::jsonrpc::{JsonRpcError, JsonRpcErrorCode};

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors the gateway itself can raise.
///
/// Every variant maps onto exactly one JSON-RPC error code returned to the
/// front-end client; see the `From<&GatewayError> for JsonRpcError`
/// conversion below.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// Malformed namespace, unknown backend, or access denied.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request kind unsupported, or named prompt/tool/resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A per-operation deadline was exceeded.
    #[error("Timeout: {operation} after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },

    /// The backend session returned an error, or its transport broke.
    #[error("Backend failure ({server_id}): {message}")]
    BackendFailure { server_id: String, message: String },

    /// Raised only during configuration load/reload.
    #[error("Configuration invalid: {0}")]
    ConfigInvalid(String),

    /// Protocol-level error from the MCP client-session layer, preserved
    /// verbatim so its error code survives the round trip.
    #[error("Protocol error: {0}")]
    Protocol(#[from] turbomcp_protocol::Error),

    /// Transport layer errors, converted automatically.
    #[error("Transport error: {0}")]
    Transport(#[from] turbomcp_transport::TransportError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Construct an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Construct a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Construct a timeout error.
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs,
        }
    }

    /// Construct a backend-failure error.
    pub fn backend_failure(server_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendFailure {
            server_id: server_id.into(),
            message: message.into(),
        }
    }

    /// Construct a configuration-invalid error.
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid(message.into())
    }

    /// Sanitized, client-safe message for this error. Access-denied text is
    /// preserved verbatim (per the `"Access denied: <reason>"` wire format);
    /// everything else is rendered as `"Error: <message>"`.
    pub fn sanitize(&self) -> String {
        match self {
            Self::InvalidRequest(message) if message.starts_with("Access denied") => {
                message.clone()
            }
            other => format!("Error: {other}"),
        }
    }

    /// Whether retrying this operation might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport(_) | Self::BackendFailure { .. } | Self::Io(_)
        )
    }
}

/// Convert a gateway error into the JSON-RPC error object returned on the
/// wire. `NotFound` maps to method-not-found, `InvalidRequest` to
/// invalid-request, `Timeout`/`BackendFailure`/everything else to
/// internal-error carrying the detail as `data`; a wrapped protocol error
/// keeps its own code via `Error::jsonrpc_error_code`.
impl From<&GatewayError> for JsonRpcError {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::NotFound(message) => {
                let mut rpc_err: Self = JsonRpcErrorCode::MethodNotFound.into();
                rpc_err.data = Some(serde_json::Value::String(message.clone()));
                rpc_err
            }
            GatewayError::InvalidRequest(message) => {
                let mut rpc_err: Self = JsonRpcErrorCode::InvalidRequest.into();
                rpc_err.data = Some(serde_json::Value::String(message.clone()));
                rpc_err
            }
            GatewayError::Protocol(inner) => Self {
                code: inner.jsonrpc_error_code(),
                message: inner.to_string(),
                data: None,
            },
            other => {
                let mut rpc_err: Self = JsonRpcErrorCode::InternalError.into();
                rpc_err.data = Some(serde_json::Value::String(other.to_string()));
                rpc_err
            }
        }
    }
}

impl From<GatewayError> for JsonRpcError {
    fn from(err: GatewayError) -> Self {
        Self::from(&err)
    }
}
