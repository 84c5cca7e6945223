//! Tactix analysis HTTP server.

use anyhow::{Context, anyhow};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;
use tactix_config::{LayeredConfigOptions, TactixConfig};
use tactix_core::AnalysisHandler;

/// Command-line options for the analysis server.
#[derive(Parser)]
#[command(name = "tactix-server", version)]
struct Cli {
    /// Extra tactix.json5 layer applied over the user and cwd configs
    #[arg(long)]
    config: Option<PathBuf>,
    /// Bind address override
    #[arg(long)]
    address: Option<String>,
    /// Port override
    #[arg(long)]
    port: Option<u16>,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tactix::init_logging();

    let cli = Cli::parse();
    info!(
        "starting server (config_set={}, address_set={}, port_set={})",
        cli.config.is_some(),
        cli.address.is_some(),
        cli.port.is_some()
    );
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        info!("adding runtime config layer: {}", path.display());
        options = options.with_runtime_path(path);
    }
    let layered = TactixConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());

    let mut config = layered.config;
    if let Some(address) = cli.address {
        config.server.address = address;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let handler = AnalysisHandler::from_config(&config);
    tactix_server::build_rocket(&config, handler)
        .launch()
        .await
        .map_err(|err| anyhow!("server failed: {err}"))?;
    info!("server stopped");
    Ok(())
}
