//! Scout gateway binary entry point.
//!
//! Loads TOML configuration, builds the provider factory, the function
//! registry and the runtime, and runs the axum server with graceful
//! shutdown on ctrl-c.

use anyhow::Result;
use clap::{Parser, Subcommand};
use model::Providers;
use runtime::Runtime;
use scout_gateway::{
    AppState, GatewayConfig,
    config::{self, CONFIG_FILE},
    functions,
};
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Function-calling chat gateway.
#[derive(Debug, Parser)]
#[command(name = "scout", version, about)]
struct Cli {
    /// Configuration file, `~/.config/scout/gateway.toml` by default.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the bind address, e.g. `0.0.0.0:3000`.
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing from RUST_LOG (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config.as_ref().and_then(|path| path.parent()) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => config::global_config_dir()?,
    };

    if let Some(Command::Init { force }) = cli.command {
        let path = config::scaffold_config(&config_dir, force)?;
        tracing::info!("configuration written to {}", path.display());
        return Ok(());
    }

    let config_path = cli.config.unwrap_or_else(|| config_dir.join(CONFIG_FILE));
    if !config_path.exists() {
        anyhow::bail!(
            "no configuration at {}, run `scout init` first",
            config_path.display()
        );
    }
    let config = GatewayConfig::load(&config_path)?;
    tracing::info!("loaded configuration from {}", config_path.display());

    // Provider clients and the function pack.
    let providers = Providers::from_configs(&config.providers.configs())?;
    if providers.kinds().next().is_none() {
        tracing::warn!("no provider configured, every turn will fail");
    }
    let registry = functions::registry(&config, &providers)?;
    tracing::info!("registered {} functions: {registry:?}", registry.len());

    let runtime = Runtime::new(providers, registry).with_limits(config.limits());
    let state = AppState::new(runtime, config.prompt.system.as_str());
    let app = scout_gateway::router(state);

    // Bind and serve.
    let bind_address = cli.bind.unwrap_or_else(|| config.bind_address());
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("gateway listening on {bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gateway shut down");
    Ok(())
}

/// Wait for ctrl-c for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
