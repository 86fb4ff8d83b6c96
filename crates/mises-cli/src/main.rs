//! Mises CLI: command-line client for a Mises identity node.
//!
//! Subcommands: init, status, register, did, user, relations, follow, unfollow.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Mises: decentralized identity on the Mises chain.
#[derive(Parser, Debug)]
#[command(name = "mises", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a secp256k1 key for a new DID.
    Init(commands::init::InitArgs),
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Register a DID with the node.
    Register(commands::register::RegisterArgs),
    /// Show the DID registry record of a mises id.
    Did(commands::did::DidArgs),
    /// Show the profile of a user.
    User(commands::user::UserArgs),
    /// List the relations of a user.
    Relations(commands::relations::RelationsArgs),
    /// Follow a user.
    Follow(commands::follow::FollowArgs),
    /// Stop following a user.
    Unfollow(commands::follow::FollowArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Register(args) => commands::register::run(args).await,
        Commands::Did(args) => commands::did::run(args).await,
        Commands::User(args) => commands::user::run(args).await,
        Commands::Relations(args) => commands::relations::run(args).await,
        Commands::Follow(args) => {
            commands::follow::run(args, mises_core::RelationAction::Follow).await
        }
        Commands::Unfollow(args) => {
            commands::follow::run(args, mises_core::RelationAction::Unfollow).await
        }
    }
}
