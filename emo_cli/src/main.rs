//! emo - log-mel feature extraction and batch inspection for speech emotion data.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod inspect;
mod logmel;
mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(name = "emo")]
#[command(about = "Speech emotion feature extraction and batch inspection")]
#[command(version)]
struct Cli {
    /// Settings file (YAML) with `extraction` and `vocabulary` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract log-mel features for every file listed in a meta CSV
    Logmel(logmel::LogmelArgs),
    /// Load a feature store, build splits and print batch statistics
    Inspect(inspect::InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Logmel(args) => logmel::run(args, &settings),
        Commands::Inspect(args) => inspect::run(args, &settings),
    }
}
