//! # Verdant Server Binary
//!
//! Main entrypoint for the Verdant garden-records server.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use verdant_api::Services;
use verdant_bin::initialization;
use verdant_config::Config;
use verdant_observe::{init_logging, LogConfig, LogFormat};
use verdant_store::StoreFactory;

#[derive(Parser, Debug)]
#[command(name = "verdant")]
#[command(about = "Verdant garden records server", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(args.config.as_deref().map(Path::new))?;

    // Override with CLI args
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize observability
    init_logging(LogConfig {
        format: LogFormat::from_str(&config.log.format)?,
        filter: config.log.filter.clone(),
        ..LogConfig::default()
    })?;

    tracing::info!("Starting Verdant garden records server");

    // Initialize storage backend
    let store = StoreFactory::from_str(&config.store.backend, config.store.connection_string.clone())?;
    tracing::info!(backend = %config.store.backend, "Storage backend ready");

    // Seed the default account if this is a first startup
    let default_account = initialization::initialize_system(&store, &config).await?;
    tracing::info!(account_id = %default_account, "Using default account");

    // One CRUD service per entity type, all over the same backend
    let _services = Services::over_store(Arc::clone(&store));

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Server ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping");

    Ok(())
}
