//! Mises Node: entry point.
//!
//! Starts the Mises identity node with configuration from a TOML file or defaults.

mod api;
mod commands;
mod config;
mod node;
mod state;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{LoggingConfig, MisesConfig};
use node::MisesNode;

/// Mises Node
#[derive(Parser, Debug)]
#[command(name = "mises-node", version, about = "Mises identity node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "mises.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        init_tracing(&LoggingConfig::default());
        let config = MisesConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    // Load configuration
    let mut config = MisesConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    tracing::info!("Mises Node v{}", env!("CARGO_PKG_VERSION"));

    // Create and start the node
    let mut node = MisesNode::new(config)?;
    node.start().await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("received shutdown signal");
    };

    let result = tokio::select! {
        result = node.run() => result,
        _ = shutdown => {
            tracing::info!("initiating graceful shutdown");
            Ok(())
        }
    };

    node.shutdown().await?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "node event loop stopped");
    } else {
        tracing::info!("Mises node exited cleanly");
    }
    result
}
