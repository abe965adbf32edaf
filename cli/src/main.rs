use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wanderplan_core::{Briefing, api, config};

mod chat;
mod onboard;
mod wizard;

#[derive(Parser)]
#[command(name = "wanderplan")]
#[command(about = "wanderplan - age-aware trip planning with live web search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the travel assistant
    Chat,
    /// Run the HTTP planning API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Build an itinerary step by step
    Plan,
    /// One-shot answer grounded on the Azure AI Search index
    Brief,
    /// Write ~/.wanderplan/config.toml
    Onboard,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    // Only `serve` logs at info; the REPL shares the terminal.
    match command {
        Commands::Serve { .. } => init_tracing("wanderplan_core=info,tower_http=info"),
        _ => init_tracing("warn"),
    }

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("{} Onboarding failed: {}", style("✗").red(), e);
                e
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Chat => {
            let config = config::Config::load()?;
            chat::run(&config).await?;
        }
        Commands::Serve { host, port } => {
            let mut config = config::Config::load()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            api::serve(Arc::new(config)).await?;
        }
        Commands::Plan => {
            let config = config::Config::load()?;
            wizard::run(&config).await?;
        }
        Commands::Brief => {
            let config = config::Config::load()?;
            let briefing = Briefing::from_config(&config).await?;
            println!("{}", briefing.run().await?);
        }
    }

    Ok(())
}
