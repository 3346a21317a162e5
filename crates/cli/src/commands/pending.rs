//! List pods with a live restart request

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use warden_lib::gateway::PodGateway;

use crate::output::{print_info, print_table};

/// Row for the pending-requests table
#[derive(Tabled, Serialize)]
struct PendingRow {
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Sentinel")]
    sentinel: String,
}

pub async fn run(cli: &crate::Cli) -> Result<()> {
    let gateway = super::build_gateway(cli).await?;
    let pods = gateway.list_pods().await?;

    let mut rows = Vec::new();
    for pod in pods.iter().filter(|p| p.restart_requested()) {
        // A present sentinel means the restart was already admitted and
        // the annotation clear has not landed (or failed)
        let sentinel = match gateway.sentinel_exists(&pod.name).await {
            Ok(true) => "present".to_string(),
            Ok(false) => "absent".to_string(),
            Err(_) => "unknown".to_string(),
        };
        rows.push(PendingRow {
            pod: pod.name.clone(),
            sentinel,
        });
    }

    if rows.is_empty() {
        print_info("No pods are requesting a restart");
        return Ok(());
    }

    print_table(&rows, cli.format);
    Ok(())
}
