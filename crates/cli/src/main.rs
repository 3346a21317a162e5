//! Restart Warden CLI
//!
//! A command-line tool for inspecting pending restart requests, the live
//! census, and the health of a running warden. Read-only: it never plants
//! sentinels or touches annotations.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Restart Warden CLI
#[derive(Parser)]
#[command(name = "wardenctl")]
#[command(author, version, about = "CLI for Restart Warden", long_about = None)]
pub struct Cli {
    /// Namespace holding the managed workload group
    #[arg(long, short, env = "WARDEN_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Label selector matching the managed pods
    #[arg(
        long,
        short = 'l',
        env = "WARDEN_LABEL_SELECTOR",
        default_value = "restart-warden/managed=true"
    )]
    pub selector: String,

    /// Path of the restart sentinel file inside each pod
    #[arg(
        long,
        env = "WARDEN_SENTINEL_PATH",
        default_value = "/var/run/restart-allowed"
    )]
    pub sentinel_path: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pods with a live restart request
    Pending,

    /// Show the live census and the admission threshold
    Census {
        /// Maximum concurrent-restart fraction used for the threshold
        #[arg(long, default_value_t = 0.25)]
        max_restart_fraction: f64,
    },

    /// Query a running warden's health endpoint
    Health {
        /// Warden API endpoint URL (can also be set via WARDEN_API_URL)
        #[arg(long, env = "WARDEN_API_URL", default_value = "http://localhost:8080")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Pending => commands::pending::run(&cli).await,
        Commands::Census {
            max_restart_fraction,
        } => commands::census::run(&cli, *max_restart_fraction).await,
        Commands::Health { api_url } => commands::health::run(api_url, cli.format).await,
    }
}
