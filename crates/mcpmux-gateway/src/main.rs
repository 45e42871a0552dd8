//! mcpmux-gateway CLI entry point: loads a TOML config, starts every
//! configured backend, and serves the multiplexed MCP session over stdio.

#![warn(clippy::all)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mcpmux_gateway::prelude::*;
use tracing::{error, info};

/// Multiplexing MCP gateway: front one stdio MCP session for many backends.
#[derive(Parser)]
#[command(name = "mcpmux-gateway", about = "Multiplexing MCP gateway", version)]
struct Cli {
    /// Path to the gateway's TOML configuration file.
    #[arg(short, long, default_value = "mcpmux-gateway.toml")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match mcpmux_gateway::config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load {:?}: {e}", cli.config);
            std::process::exit(1);
        }
    };

    let issues = mcpmux_gateway::config::validate(&config);
    if !issues.is_empty() {
        eprintln!("configuration at {:?} is invalid:", cli.config);
        for issue in &issues {
            eprintln!("  - {issue}");
        }
        std::process::exit(1);
    }

    info!(path = ?cli.config, "configuration loaded");

    let metrics = Arc::new(AtomicMetrics::new());
    let supervisor = Arc::new(Supervisor::new(&config, Arc::clone(&metrics)));

    let client_rules: HashMap<String, mcpmux_gateway::config::ClientRule> =
        config.clients.clone().into_iter().collect();
    let permissions = PermissionEngine::new(client_rules);
    let identifier = Arc::new(ClientIdentifier::new(config.clients.clone()));

    let router = Arc::new(Router::new(
        Arc::clone(&supervisor),
        permissions,
        Arc::clone(&metrics),
        1024,
        Duration::from_secs(config.runtime.cache_ttl),
        config.runtime.metrics_enabled,
    ));

    let watcher = ConfigWatcher::new(cli.config.clone(), Arc::clone(&supervisor));
    let watcher_task = tokio::spawn(async move { watcher.run().await });

    supervisor.start_all().await;

    let frontend = GatewayFrontend::new(
        router,
        identifier,
        config.manager.clone(),
        config.runtime.max_concurrent_requests,
    );

    let result = frontend.run().await;

    watcher_task.abort();
    supervisor.stop_all().await;

    if let Err(e) = result {
        error!(error = %e, "gateway front-end exited with an error");
        std::process::exit(1);
    }
}
