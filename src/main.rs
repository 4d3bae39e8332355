//! vidcdn - direct video stream URL extractor
//!
//! Resolves video page URLs into ranked, directly fetchable CDN stream URLs
//! by driving yt-dlp across a rotation of identities and browser cookies.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vidcdn::extractor::classify::kind_for_unexpected;
use vidcdn::utils::AppSettings;
use vidcdn::{server, ExtractionOrchestrator, ExtractionOutcome};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP front end
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Extract one URL and print the JSON result
    Extract { url: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut settings = AppSettings::load(args.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            let orchestrator = Arc::new(ExtractionOrchestrator::from_settings(&settings.extractor)?);
            rt.block_on(server::serve(&settings.server, orchestrator))?;
        }
        Command::Extract { url } => {
            let outcome = match ExtractionOrchestrator::from_settings(&settings.extractor) {
                Ok(orchestrator) => rt.block_on(orchestrator.extract(&url)),
                Err(e) => {
                    let detail = e.to_string();
                    ExtractionOutcome::failure(kind_for_unexpected(&detail), detail)
                }
            };
            info!("Extraction finished, success: {}", outcome.is_success());
            println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
        }
    }

    Ok(())
}
