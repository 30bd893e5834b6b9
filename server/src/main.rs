//! Pokedex Server
//!
//! REST CRUD service for pokemon records over an embedded key-value store
use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};

use pokedex_core::core::{create_app_state, Config, StorageType};
use pokedex_server::{api::start_api_server, logging::init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("pokedex-server")
        .version(pokedex_core::VERSION)
        .about("Pokemon REST CRUD server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("Address to bind, e.g. 0.0.0.0:8000"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding the journal"),
        )
        .arg(
            Arg::new("memory")
                .long("memory")
                .action(ArgAction::SetTrue)
                .help("Use the in-memory backend; nothing survives a restart"),
        )
        .get_matches();

    // Load configuration: file, then environment, then command line
    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load(config_path)?;
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting Pokedex server v{}", pokedex_core::VERSION);

    // Create AppState using factory pattern
    let configured_app_state = create_app_state(config)?;
    info!("AppState created successfully");

    // Serve until Ctrl+C, then flush storage whatever the outcome
    let served = start_api_server(&configured_app_state, shutdown_signal()).await;
    if let Err(e) = &served {
        error!("HTTP server terminated: {:#}", e);
    }
    configured_app_state.sync().context("failed to sync storage on shutdown")?;
    served?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal");
}

fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> anyhow::Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .with_context(|| format!("invalid --http-addr {}", addr))?;
    }
    if let Some(dir) = matches.get_one::<String>("data-dir") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    if matches.get_flag("memory") {
        config.storage.storage_type = StorageType::Memory;
    }
    Ok(())
}
