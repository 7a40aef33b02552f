//! CLI argument parsing for the job binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lexsort job runner
///
/// Runs one categorization, training, or prediction job per process.
/// Progress and result records stream to stdout as NDJSON; logs go to
/// stderr.
#[derive(Parser, Debug)]
#[command(name = "lexsort-job")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/lexsort/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Job commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assign every target item to its best-matching category
    Categorize {
        /// NDJSON file of target items to import before matching
        #[arg(long)]
        targets: Option<PathBuf>,

        /// NDJSON file of category items to import before matching
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Fail instead of calling the provider on any cache miss
        #[arg(long)]
        cache_only: bool,
    },

    /// Train (or reuse) the owner's classifier model
    Train {
        /// Model owner key (one persisted model per owner)
        #[arg(long)]
        owner: String,

        /// NDJSON file of labeled samples
        #[arg(long)]
        samples: PathBuf,

        /// Human-facing model name stored in the envelope
        #[arg(long, default_value = "classifier")]
        model_name: String,
    },

    /// Classify one text with the owner's persisted model
    Predict {
        /// Model owner key
        #[arg(long)]
        owner: String,

        /// The text to classify
        text: String,
    },
}
