//! CLI subcommands

pub mod census;
pub mod health;
pub mod pending;

use anyhow::{Context, Result};
use kube::Client;
use warden_lib::gateway::{GatewayConfig, KubeGateway};

/// Build a gateway from the CLI's cluster flags
pub(crate) async fn build_gateway(cli: &crate::Cli) -> Result<KubeGateway> {
    let client = Client::try_default()
        .await
        .context("Failed to initialize Kubernetes client")?;

    Ok(KubeGateway::new(
        client,
        GatewayConfig {
            namespace: cli.namespace.clone(),
            label_selector: cli.selector.clone(),
            sentinel_path: cli.sentinel_path.clone(),
            ..Default::default()
        },
    ))
}
