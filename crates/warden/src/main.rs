//! Restart Warden - admission controller for rolling pod restarts
//!
//! Watches a managed workload group for pods requesting a restart and
//! admits a bounded subset of them to restart concurrently, so the fleet
//! never loses more than a configured fraction of its capacity at once.

use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warden_lib::{
    gateway::{GatewayConfig, KubeGateway},
    health::{components, HealthRegistry},
    observability::{StructuredLogger, WardenMetrics},
    watch::{WatchConfig, WatchLoop},
};

mod api;
mod config;

const WARDEN_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting restart-warden");

    // Load configuration
    let config = config::WardenConfig::load()?;
    config.validate()?;
    info!(
        namespace = %config.namespace,
        selector = %config.label_selector,
        max_restart_fraction = config.max_restart_fraction,
        "Warden configured"
    );

    // Establish identity with the platform. This is the only fatal
    // failure path: without a client there is nothing to retry against.
    let client = Client::try_default()
        .await
        .context("Failed to initialize Kubernetes client")?;
    let gateway = Arc::new(KubeGateway::new(
        client,
        GatewayConfig {
            namespace: config.namespace.clone(),
            label_selector: config.label_selector.clone(),
            sentinel_path: config.sentinel_path.clone(),
            watch_timeout_secs: config.watch_timeout_secs,
        },
    ));

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::WATCHER).await;
    health_registry.register(components::GATEWAY).await;

    // Initialize metrics and structured logging
    let metrics = WardenMetrics::new();
    let logger = StructuredLogger::new(&config.namespace);
    logger.log_startup(WARDEN_VERSION);

    // Start health and metrics server
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Start the admission loop
    let (shutdown_tx, _) = broadcast::channel(1);
    let watch_loop = WatchLoop::new(
        gateway,
        WatchConfig {
            namespace: config.namespace.clone(),
            max_restart_fraction: config.max_restart_fraction,
            reconnect_backoff: Duration::from_secs(config.reconnect_backoff_secs),
        },
        health_registry.clone(),
    );
    let loop_handle = tokio::spawn(watch_loop.run(shutdown_tx.subscribe()));

    health_registry.set_ready(true).await;

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;

    let _ = shutdown_tx.send(());
    let _ = loop_handle.await;
    api_handle.abort();

    info!("Shut down");
    Ok(())
}
