//! lexsort job runner
//!
//! One job per process. Progress and result records stream to stdout as
//! NDJSON; results and progress are demultiplexed by the `type` field.
//! Logs go to stderr so the event stream stays clean.
//!
//! # Usage
//!
//! ```bash
//! lexsort-job categorize [--targets FILE] [--categories FILE] [--cache-only]
//! lexsort-job train --owner OWNER --samples FILE [--model-name NAME]
//! lexsort-job predict --owner OWNER TEXT
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/lexsort/config.toml)
//! 3. Environment variables (LEXSORT__*)

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

use lexsort_embeddings::{EmbeddingProvider, HttpEmbeddingProvider};
use lexsort_engine::{predict_one, CategorizeJob, Cli, Commands, EngineError, TrainJob};
use lexsort_progress::{JsonLinesSink, ProgressEvent, ProgressSink};
use lexsort_storage::Database;
use lexsort_types::{EngineConfig, ItemKind};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let sink = JsonLinesSink::new(std::io::stdout());
    let job_id = Ulid::new().to_string();

    match run(cli, &job_id, &sink).await {
        Ok(items) => {
            sink.emit(&ProgressEvent::complete(&job_id, items));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(job_id, code = e.code(), "job failed: {e}");
            sink.emit(&ProgressEvent::error(e.to_string(), e.code()));
            ExitCode::FAILURE
        }
    }
}

/// Dispatch one command; returns the item count for the terminal
/// `complete` record.
async fn run(
    cli: Cli,
    job_id: &str,
    sink: &dyn ProgressSink,
) -> Result<Option<u64>, EngineError> {
    let mut config =
        EngineConfig::load(cli.config.as_deref()).map_err(EngineError::Config)?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let db = Arc::new(Database::open(&config.db_path)?);

    match cli.command {
        Commands::Categorize {
            targets,
            categories,
            cache_only,
        } => {
            config.matcher.cache_only = config.matcher.cache_only || cache_only;
            let provider = build_provider(&config)?;
            let job = CategorizeJob::new(db, provider, &config).with_cancellation(cancel);
            if let Some(path) = targets.as_deref() {
                job.seed_from_file(ItemKind::Target, path)?;
            }
            if let Some(path) = categories.as_deref() {
                job.seed_from_file(ItemKind::Category, path)?;
            }
            info!(job_id, "categorize job starting");
            let stats = job.run(sink).await?;
            Ok(Some(stats.targets_processed))
        }

        Commands::Train {
            owner,
            samples,
            model_name,
        } => {
            let provider = build_provider(&config)?;
            let samples = lexsort_engine::read_samples(&samples)?;
            let job = TrainJob::new(db, provider, &config, &owner, &model_name)
                .with_cancellation(cancel);
            info!(job_id, owner, "train job starting");
            let report = job.run(&samples, sink).await?;
            Ok(Some(report.trained_samples as u64))
        }

        Commands::Predict { owner, text } => {
            let provider = build_provider(&config)?;
            info!(job_id, owner, "predict job starting");
            let prediction = predict_one(db, provider, &config, &owner, &text, sink).await?;
            let mut record = serde_json::to_value(&prediction)
                .map_err(|e| EngineError::Input(format!("serialize prediction: {e}")))?;
            record["type"] = serde_json::Value::from("prediction");
            println!("{record}");
            Ok(Some(1))
        }
    }
}

fn build_provider(config: &EngineConfig) -> Result<Arc<dyn EmbeddingProvider>, EngineError> {
    Ok(Arc::new(HttpEmbeddingProvider::new(&config.provider)?))
}

/// Tracing to stderr; stdout is reserved for the event stream.
fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// SIGINT requests cooperative cancellation; the job reports
/// `cancelled` on the event stream and exits nonzero.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling job");
            cancel.cancel();
        }
    });
}
