mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use roam::config::RoamConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roam", version, about = "Describe an event in plain language, publish it, find it again")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve,
    /// Create events through an interactive chat in the terminal
    Chat,
    /// Search published events by keyword
    Search {
        /// Keywords to look for
        query: String,
        /// Only show events in this town
        #[arg(long)]
        town: Option<String>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = RoamConfig::load()?;

    // Log to stderr so stdout stays clean for chat and search output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            roam::server::serve(config).await?;
        }
        Command::Chat => {
            cli::chat::run(&config).await?;
        }
        Command::Search { query, town, limit } => {
            cli::search::search(&config, &query, town.as_deref(), limit)?;
        }
    }

    Ok(())
}
