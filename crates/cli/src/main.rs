//! AgriDoctor CLI - On-device crop disease analysis
//!
//! Command-line interface for the image analysis pipeline.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::analyze::AnalyzeCommand;
use commands::diseases::DiseasesCommand;
use commands::history::HistoryCommand;
use commands::preload::PreloadCommand;

#[derive(Parser)]
#[command(
    name = "agridoctor",
    version,
    about = "On-device crop disease detection from leaf photos",
    long_about = "Analyze leaf photos for crop diseases, fully on-device.\n\
                  The pipeline gates out blurry photos, localizes the leaf with a\n\
                  YOLOv8 detector, and classifies the region with a per-crop model.\n\n\
                  Supported crops: corn, potato, wheat.",
    after_help = "EXAMPLES:\n  \
                  # Analyze a photo of a potato leaf\n  \
                  agridoctor analyze --crop potato leaf.jpg\n\n  \
                  # Warm all models ahead of first use\n  \
                  agridoctor preload\n\n  \
                  # List known diseases for a crop, in Bengali\n  \
                  agridoctor diseases --crop wheat --lang bn\n\n  \
                  # Show past analyses\n  \
                  agridoctor history"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one leaf photo and print the diagnosis
    Analyze(AnalyzeCommand),

    /// Load every model once so the first analysis starts warm
    Preload(PreloadCommand),

    /// List the diseases a crop's classifier can recognize
    Diseases(DiseasesCommand),

    /// Show or clear the analysis history
    History(HistoryCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Suppress pipeline logs for the listing commands to keep output clean
    let log_level = match &cli.command {
        Commands::Diseases(_) | Commands::History(_) => Level::WARN,
        _ => {
            if cli.verbose {
                Level::DEBUG
            } else {
                Level::INFO
            }
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Analyze(cmd) => cmd.execute(),
        Commands::Preload(cmd) => cmd.execute(),
        Commands::Diseases(cmd) => cmd.execute(),
        Commands::History(cmd) => cmd.execute(),
    }
}
