use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Profitline order-profitability service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if one exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = configuration::load_config()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => {
            let addr: SocketAddr = args
                .listen
                .unwrap_or_else(|| config.server.listen_addr.clone())
                .parse()?;
            web_server::run_server(addr, config).await?;
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// An order-profitability engine for e-commerce sellers.
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
    /// The address to listen on (e.g., "0.0.0.0:4000"). Overrides the
    /// configuration file.
    #[arg(long)]
    listen: Option<String>,
}
