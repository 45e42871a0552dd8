//! Process Supervisor: owns every [`BackendSession`], starts/stops/restarts
//! them individually or in bulk, runs the periodic health-check loop, and
//! applies config-reload diffs.
//!
//! Grounded on `original_source/mcp_manager/server/manager.py`'s
//! `MCPServerManager`: `start_all_servers`/`start_server`/`stop_server`/
//! `restart_server`/`stop_all_servers` are idempotent per-id operations;
//! `_health_check_loop` runs every 60s and auto-restarts servers that fail
//! their health check when `runtime.auto_restart_failed_servers` is set.
//! The installer subsystem (`_ensure_server_installed`) is an explicit
//! collaborator the gateway does not reimplement (spec.md §1).

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};

use crate::config::{ManagerFile, ServerConfig};
use crate::metrics::AtomicMetrics;
use crate::model::ProcessStatus;
use crate::session::BackendSession;

/// Cadence of the background health-check loop, matching
/// `_health_check_loop`'s `asyncio.sleep(60)`.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Owns and drives the lifecycle of every configured backend.
pub struct Supervisor {
    sessions: DashMap<String, Arc<BackendSession>>,
    servers: Mutex<std::collections::HashMap<String, ServerConfig>>,
    auto_restart: std::sync::atomic::AtomicBool,
    health_check_enabled: std::sync::atomic::AtomicBool,
    metrics: Arc<AtomicMetrics>,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    /// Build a supervisor over every server in `config`, none of them
    /// started yet. Disabled servers are constructed in
    /// [`ProcessStatus::NotConfigured`] and are skipped by `start_all`.
    pub fn new(config: &ManagerFile, metrics: Arc<AtomicMetrics>) -> Self {
        let sessions = DashMap::new();
        let mut servers = std::collections::HashMap::new();
        for (server_id, server_config) in &config.servers {
            sessions.insert(
                server_id.clone(),
                Arc::new(BackendSession::new(server_id.clone(), server_config.clone())),
            );
            servers.insert(server_id.clone(), server_config.clone());
        }
        Self {
            sessions,
            servers: Mutex::new(servers),
            auto_restart: std::sync::atomic::AtomicBool::new(
                config.runtime.auto_restart_failed_servers,
            ),
            health_check_enabled: std::sync::atomic::AtomicBool::new(
                config.runtime.health_check_enabled,
            ),
            metrics,
            health_task: Mutex::new(None),
        }
    }

    /// Fetch the session for `server_id`, if configured.
    pub fn get(&self, server_id: &str) -> Option<Arc<BackendSession>> {
        self.sessions.get(server_id).map(|entry| Arc::clone(&entry))
    }

    /// Every currently-running session, for the aggregator and router.
    pub async fn active_sessions(&self) -> Vec<Arc<BackendSession>> {
        let mut active = Vec::new();
        for entry in self.sessions.iter() {
            let session = Arc::clone(entry.value());
            if session.status().await == ProcessStatus::Running {
                active.push(session);
            }
        }
        active
    }

    /// Start every enabled server concurrently, then launch the health-check
    /// loop if enabled. Mirrors `start_all_servers`'s `asyncio.gather` fan-out.
    pub async fn start_all(self: &Arc<Self>) {
        info!("starting all backend servers");
        let mut join_set = JoinSet::new();
        for entry in self.sessions.iter() {
            let server_id = entry.key().clone();
            let session = Arc::clone(entry.value());
            join_set.spawn(async move {
                let result = session.start().await;
                (server_id, result)
            });
        }
        while let Some(outcome) = join_set.join_next().await {
            match outcome {
                Ok((server_id, Ok(()))) => info!(server_id = %server_id, "backend started"),
                Ok((server_id, Err(e))) => {
                    warn!(server_id = %server_id, error = %e, "backend failed to start")
                }
                Err(join_err) => warn!(error = %join_err, "start task panicked"),
            }
        }
        self.metrics
            .set_active_backends(self.active_sessions().await.len() as u64);

        if self.health_check_enabled.load(std::sync::atomic::Ordering::Relaxed) {
            let supervisor = Arc::clone(self);
            let handle = tokio::spawn(async move { supervisor.health_check_loop().await });
            *self.health_task.lock() = Some(handle);
        }
    }

    /// Start a single server by id. A no-op if it's already running/starting.
    pub async fn start(&self, server_id: &str) -> crate::error::GatewayResult<()> {
        let session = self.get(server_id).ok_or_else(|| {
            crate::error::GatewayError::not_found(format!("server '{server_id}' not configured"))
        })?;
        session.start().await
    }

    /// Stop a single server by id. A no-op if it's already stopped, and a
    /// no-op (logged, not an error) if `server_id` isn't configured at
    /// all, per the supervisor's idempotent-guard contract.
    pub async fn stop(&self, server_id: &str) -> crate::error::GatewayResult<()> {
        let Some(session) = self.get(server_id) else {
            warn!(server_id = %server_id, "stop requested for unconfigured server");
            return Ok(());
        };
        session.stop().await
    }

    /// Restart a single server by id: stop and fully release the current
    /// session, then construct a fresh `BackendSession` in its place and
    /// start that, rather than restarting the existing object in place.
    /// Per spec Invariant 2 ("restart creates a fresh one after the old is
    /// fully released"), this is also what resets `request_count`/
    /// `error_count` back to their post-construction defaults, since those
    /// counters live on the session object itself. Mirrors the
    /// same-server-config branch of `reload` below.
    pub async fn restart(&self, server_id: &str) -> crate::error::GatewayResult<()> {
        let old_session = self.get(server_id).ok_or_else(|| {
            crate::error::GatewayError::not_found(format!("server '{server_id}' not configured"))
        })?;
        let config = old_session.config().clone();
        old_session.stop().await?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let session = Arc::new(BackendSession::new(server_id.to_string(), config));
        self.sessions.insert(server_id.to_string(), Arc::clone(&session));
        session.start().await?;
        self.metrics.inc_backend_restarts();
        Ok(())
    }

    /// Stop every session and cancel the health-check loop.
    pub async fn stop_all(&self) {
        info!("stopping all backend servers");
        if let Some(handle) = self.health_task.lock().take() {
            handle.abort();
        }
        let mut join_set = JoinSet::new();
        for entry in self.sessions.iter() {
            let session = Arc::clone(entry.value());
            join_set.spawn(async move { session.stop().await });
        }
        while join_set.join_next().await.is_some() {}
    }

    /// Apply a config reload: stop servers only in the old config, start
    /// servers only in the new one, and restart servers present in both
    /// whose structural fields (`source`/`version`/`transport`/`config`)
    /// changed. Mirrors `_apply_config_changes`.
    pub async fn reload(&self, new_config: &ManagerFile) {
        let old_servers = { self.servers.lock().clone() };

        for server_id in old_servers.keys() {
            if !new_config.servers.contains_key(server_id) {
                info!(server_id = %server_id, "removing server on reload");
                if let Some(session) = self.get(server_id) {
                    let _ = session.stop().await;
                }
                self.sessions.remove(server_id);
            }
        }

        for (server_id, new_server_config) in &new_config.servers {
            match old_servers.get(server_id) {
                None => {
                    info!(server_id = %server_id, "adding server on reload");
                    let session =
                        Arc::new(BackendSession::new(server_id.clone(), new_server_config.clone()));
                    self.sessions.insert(server_id.clone(), Arc::clone(&session));
                    let _ = session.start().await;
                }
                Some(old_server_config) => {
                    if structurally_differs(old_server_config, new_server_config) {
                        info!(server_id = %server_id, "restarting modified server on reload");
                        let session = Arc::new(BackendSession::new(
                            server_id.clone(),
                            new_server_config.clone(),
                        ));
                        if let Some(old_session) = self.sessions.get(server_id) {
                            let _ = old_session.stop().await;
                        }
                        self.sessions.insert(server_id.clone(), Arc::clone(&session));
                        let _ = session.start().await;
                        self.metrics.inc_backend_restarts();
                    }
                }
            }
        }

        *self.servers.lock() = new_config.servers.clone();
        self.auto_restart.store(
            new_config.runtime.auto_restart_failed_servers,
            std::sync::atomic::Ordering::Relaxed,
        );
        self.health_check_enabled.store(
            new_config.runtime.health_check_enabled,
            std::sync::atomic::Ordering::Relaxed,
        );
        self.metrics
            .set_active_backends(self.active_sessions().await.len() as u64);
    }

    async fn health_check_loop(self: Arc<Self>) {
        loop {
            tokio::time::sleep(HEALTH_CHECK_INTERVAL).await;
            self.perform_health_checks().await;
        }
    }

    async fn perform_health_checks(&self) {
        let mut join_set = JoinSet::new();
        for entry in self.sessions.iter() {
            let session = Arc::clone(entry.value());
            join_set.spawn(async move {
                let status = session.status().await;
                if status != ProcessStatus::Running {
                    return None;
                }
                let health = session.health_check().await;
                Some((session.server_id().to_string(), health))
            });
        }

        let auto_restart = self.auto_restart.load(std::sync::atomic::Ordering::Relaxed);
        while let Some(outcome) = join_set.join_next().await {
            let Ok(Some((server_id, health))) = outcome else {
                continue;
            };
            if health == crate::model::HealthStatus::Unhealthy {
                warn!(server_id = %server_id, "backend unhealthy");
                if auto_restart {
                    info!(server_id = %server_id, "auto-restarting unhealthy backend");
                    if let Err(e) = self.restart(&server_id).await {
                        warn!(server_id = %server_id, error = %e, "auto-restart failed");
                    }
                }
            }
        }
    }
}

/// Whether a reload's new server config differs enough from the old one to
/// require a restart, per `_apply_config_changes`'s field comparison.
fn structurally_differs(old: &ServerConfig, new: &ServerConfig) -> bool {
    old.source != new.source
        || old.version != new.version
        || old.transport != new.transport
        || old.config != new.config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn server_config(enabled: bool) -> ServerConfig {
        ServerConfig {
            source: "binary:/bin/true".to_string(),
            version: None,
            branch: None,
            transport: "stdio".to_string(),
            endpoint: None,
            config: HashMap::new(),
            health_check: None,
            auto_install: true,
            enabled,
        }
    }

    fn config_with(servers: Vec<(&str, ServerConfig)>) -> ManagerFile {
        let mut file = ManagerFile::default();
        for (id, cfg) in servers {
            file.servers.insert(id.to_string(), cfg);
        }
        file
    }

    #[tokio::test]
    async fn disabled_server_is_never_active() {
        let config = config_with(vec![("fs", server_config(false))]);
        let supervisor = Arc::new(Supervisor::new(&config, Arc::new(AtomicMetrics::new())));
        supervisor.start_all().await;
        assert!(supervisor.active_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn restart_replaces_the_session_with_a_fresh_instance() {
        // A disabled server's `start()` fails, but `restart` must still
        // swap in a brand new `BackendSession` before propagating that
        // error, per Invariant 2 ("restart creates a fresh one after the
        // old is fully released").
        let config = config_with(vec![("fs", server_config(false))]);
        let supervisor = Supervisor::new(&config, Arc::new(AtomicMetrics::new()));
        let original = supervisor.get("fs").unwrap();

        let _ = supervisor.restart("fs").await;

        let replaced = supervisor.get("fs").unwrap();
        assert!(!Arc::ptr_eq(&original, &replaced));
    }

    #[tokio::test]
    async fn stop_of_unconfigured_server_is_a_logged_no_op() {
        let config = ManagerFile::default();
        let supervisor = Supervisor::new(&config, Arc::new(AtomicMetrics::new()));
        assert!(supervisor.stop("ghost").await.is_ok());
    }

    #[tokio::test]
    async fn reload_removes_server_dropped_from_config() {
        let config = config_with(vec![("fs", server_config(false))]);
        let supervisor = Arc::new(Supervisor::new(&config, Arc::new(AtomicMetrics::new())));
        supervisor.start_all().await;
        assert!(supervisor.get("fs").is_some());

        let empty = ManagerFile::default();
        supervisor.reload(&empty).await;
        assert!(supervisor.get("fs").is_none());
    }

    #[test]
    fn structural_diff_detects_source_change() {
        let mut other = server_config(true);
        other.source = "npm:other-package".to_string();
        assert!(structurally_differs(&server_config(true), &other));
        assert!(!structurally_differs(&server_config(true), &server_config(true)));
    }
}
