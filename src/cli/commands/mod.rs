//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;
mod helpers;
mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docverify::models::DocumentKind;

#[derive(Parser)]
#[command(name = "docverify")]
#[command(about = "Document extraction and cross-verification")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a batch of documents described by a manifest and cross-check them
    Verify {
        /// Manifest JSON: {"documents":[{"filename","doc_type","password"?}]}
        #[arg(short, long)]
        manifest: PathBuf,
        /// Uploaded files, matched to manifest entries by file name
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Number of extraction workers (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Fail the whole batch on the first failed document
        #[arg(long)]
        abort_on_error: bool,
    },

    /// Extract an identity card; several images are read as one card (front and back)
    Identity {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// PDF password
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Extract a single document of a declared kind
    Extract {
        /// Document kind (salary_slip, bank_statement, itr, aadhaar, dl, pan, ...)
        #[arg(short, long)]
        kind: DocumentKind,
        file: PathBuf,
        /// PDF password
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Compare an employee ID card against an appointment letter
    Employment {
        #[arg(long)]
        id_card: PathBuf,
        #[arg(long)]
        letter: PathBuf,
    },

    /// Check availability of PDF tools and recognition engines
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = helpers::load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Verify {
            manifest,
            files,
            workers,
            abort_on_error,
        } => verify::cmd_verify(config, &manifest, &files, workers, abort_on_error).await,
        Commands::Identity { files, password } => {
            extract::cmd_identity(&config, &files, password).await
        }
        Commands::Extract {
            kind,
            file,
            password,
        } => extract::cmd_extract(&config, kind, &file, password).await,
        Commands::Employment { id_card, letter } => {
            extract::cmd_employment(&config, &id_card, &letter).await
        }
        Commands::Check => check::cmd_check(&config),
    }
}
