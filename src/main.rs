use clap::{Parser, Subcommand};
use configuration::load_config;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// The main entry point for the revpulse analytics service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file, if present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => handle_serve(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Subscription revenue metrics, retention cohorts, and churn-risk alerts.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Interface to bind; overrides the configured value.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on; overrides the configured value.
    #[arg(long)]
    port: Option<u16>,
}

/// Resolves the listen address from config and flags, then runs the server.
async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config()?;

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!(%addr, "Starting analytics service.");
    web_server::run_server(addr, &config.database).await
}
