//! mtbridge CLI: run the trading gateway and manage its configuration.
//!
//! Commands:
//! - `serve`: connect the paper session and serve the HTTP gateway
//! - `config`: print the effective configuration as TOML

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mtbridge_core::{LifecycleBridge, PaperSession};
use mtbridge_gateway::GatewayConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mtbridge",
    about = "mtbridge: HTTP gateway to a trading terminal session"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP gateway until interrupted.
    Serve {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen address, overriding `[server] host`.
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overriding `[server] port`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file. Prints the defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, host, port } => run_serve(config.as_deref(), host, port),
        Commands::Config { config } => run_print_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<GatewayConfig> {
    match path {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(GatewayConfig::default()),
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter '{default_filter}'"))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn run_serve(path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    init_logging(&config.logging.filter)?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async move {
        let bridge = Arc::new(LifecycleBridge::new(PaperSession::new(config.session)));
        mtbridge_gateway::serve(&config.server, bridge, shutdown_signal())
            .await
            .with_context(|| {
                format!(
                    "serving on {}:{}",
                    config.server.host, config.server.port
                )
            })
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupt received, shutting down");
    }
}

fn run_print_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
