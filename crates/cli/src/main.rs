//! Heron CLI — the main entry point.
//!
//! Commands:
//! - `serve` — Start the webhook gateway
//! - `seed`  — Insert a memory fact for a user

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "heron",
    about = "Heron — memory-augmented Telegram bot backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables still apply)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook gateway server
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Embed and store a memory fact for a user
    Seed {
        /// The user (chat) id the fact belongs to
        #[arg(short, long)]
        user: String,

        /// The fact text
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(cli.config.as_deref(), port).await,
        Commands::Seed { user, text } => {
            commands::seed::run(cli.config.as_deref(), &user, &text).await
        }
    }
}
