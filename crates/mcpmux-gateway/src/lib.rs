//! mcpmux-gateway: a multiplexing MCP gateway
//!
//! Aggregates any number of backend MCP servers — launched as child
//! processes or reached over SSE/WebSocket — behind one stdio-facing MCP
//! session, presenting their tools, resources, and prompts under a single
//! `server_id.name` / `mcp://server_id/uri` namespace. A per-client
//! permission engine filters what each caller can see and invoke; a bounded
//! TTL cache absorbs repeated `call_tool`/`read_resource` traffic; a
//! background watcher hot-reloads the backend set from the config file.
//!
//! # Architecture
//!
//! ```text
//! stdin/stdout ── GatewayFrontend ── Router ── Supervisor ── BackendSession (×N)
//!                      │                │            │
//!                ClientIdentifier  PermissionEngine  health-check loop
//!                                       │
//!                                  ResponseCache
//! ```
//!
//! [`supervisor::Supervisor`] owns every [`session::BackendSession`] and
//! drives its lifecycle; [`aggregator::Aggregator`] fans list operations out
//! across the running set; [`router::Router`] is the single entry point
//! that ties caching, namespacing, and dispatch together; [`watcher::ConfigWatcher`]
//! hot-reloads the supervisor from an edited config file;
//! [`frontend::GatewayFrontend`] is the stdio-facing MCP session itself.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod frontend;
pub mod metrics;
pub mod model;
pub mod namespace;
pub mod router;
pub mod session;
pub mod supervisor;
pub mod watcher;

pub use error::{GatewayError, GatewayResult};

/// Common imports for building or embedding a gateway.
pub mod prelude {
    pub use crate::access::{ClientIdentifier, PermissionEngine};
    pub use crate::aggregator::Aggregator;
    pub use crate::cache::ResponseCache;
    pub use crate::config::{ManagerFile, ServerConfig};
    pub use crate::error::{GatewayError, GatewayResult};
    pub use crate::frontend::GatewayFrontend;
    pub use crate::metrics::AtomicMetrics;
    pub use crate::router::{GatewayRequest, GatewayResponse, Router};
    pub use crate::session::BackendSession;
    pub use crate::supervisor::Supervisor;
    pub use crate::watcher::ConfigWatcher;
}

/// Version of mcpmux-gateway.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
