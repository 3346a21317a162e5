//! Query a running warden's health endpoint

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use warden_lib::health::HealthResponse;

use crate::client::ApiClient;
use crate::output::{color_status, format_timestamp, print_table, OutputFormat};

/// Row for the component health table
#[derive(Tabled, Serialize)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Change")]
    last_change: String,
}

pub async fn run(api_url: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(api_url)?;
    let health: HealthResponse = client.get("healthz").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&health)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Warden Health".bold());
            println!("{}", "=".repeat(40));
            println!("Overall: {}", color_status(health.status));
            println!();

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    component: name.clone(),
                    status: color_status(component.status),
                    message: component.message.clone().unwrap_or_default(),
                    last_change: format_timestamp(component.last_change_timestamp),
                })
                .collect();
            rows.sort_by(|a, b| a.component.cmp(&b.component));

            print_table(&rows, OutputFormat::Table);
        }
    }

    Ok(())
}
