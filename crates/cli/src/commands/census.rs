//! Show the live census and admission threshold

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use warden_lib::{admission, Census};

use crate::output::{print_warning, OutputFormat};

pub async fn run(cli: &crate::Cli, max_restart_fraction: f64) -> Result<()> {
    let gateway = Arc::new(super::build_gateway(cli).await?);
    let snapshot = Census::new(gateway).take().await;

    if snapshot.total == 0 {
        print_warning("Selector matched no pods (or the listing failed)");
        return Ok(());
    }

    let threshold = admission::threshold(snapshot.total, max_restart_fraction);
    let would_admit = admission::admit(snapshot.restarting, snapshot.total, max_restart_fraction);

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "namespace": cli.namespace,
                "selector": cli.selector,
                "restarting": snapshot.restarting,
                "total": snapshot.total,
                "threshold": threshold,
                "would_admit": would_admit,
            }))?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Fleet Census".bold());
            println!("{}", "=".repeat(40));
            println!("Namespace:   {}", cli.namespace.cyan());
            println!("Selector:    {}", cli.selector.cyan());
            println!();
            println!("Restarting:  {} / {}", snapshot.restarting, snapshot.total);
            println!("Threshold:   {}", threshold);

            let verdict = if would_admit {
                "would be admitted".green()
            } else {
                "would be throttled".yellow()
            };
            println!("Next request: {}", verdict);
        }
    }

    Ok(())
}
