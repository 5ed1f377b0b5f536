//! Krona CLI - bank statement ingestion in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{detect, ingest, train};

/// Krona - bank statement ingestion and categorization
#[derive(Parser)]
#[command(name = "kr", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a bank statement CSV
    Ingest {
        /// Path to CSV file
        file: PathBuf,
        /// Use a named ingest profile from settings
        #[arg(long)]
        profile: Option<String>,
        /// Show a preview table of the ingested rows
        #[arg(long)]
        preview: bool,
        /// Maximum preview rows
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a file's encoding, delimiter and headers without ingesting
    Detect {
        /// Path to CSV file
        file: PathBuf,
        /// Use a named ingest profile from settings
        #[arg(long)]
        profile: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Train the category model from a labeled legacy CSV
    Train {
        /// Labeled source CSV (Ställe;Kategori;Specifikation)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Category rule table JSON (bundled rules by default)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Retrain even when a model artifact already exists
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("KRONA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest {
            file,
            profile,
            preview,
            limit,
            json,
        } => ingest::run(&file, profile.as_deref(), preview, limit, json),
        Commands::Detect { file, profile, json } => detect::run(&file, profile.as_deref(), json),
        Commands::Train {
            source,
            rules,
            force,
            json,
        } => train::run(source, rules, force, json),
    }
}
