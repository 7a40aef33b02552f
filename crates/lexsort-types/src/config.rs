//! Configuration loading for lexsort.
//!
//! Layered: defaults -> config file -> environment variables. The
//! default config file lives at `~/.config/lexsort/config.toml`; any
//! `LEXSORT__*` environment variable overrides a file value.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API base URL (e.g., "https://api.openai.com/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key; usually injected via LEXSORT__PROVIDER__API_KEY rather
    /// than stored in the config file
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum texts per provider request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay between consecutive provider requests (ms)
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    64
}

fn default_chunk_delay_ms() -> u64 {
    50
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
        }
    }
}

impl ProviderSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("provider.chunk_size must be > 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("provider.timeout_secs must be > 0".to_string());
        }
        if self.base_url.is_empty() {
            return Err("provider.base_url must not be empty".to_string());
        }
        Ok(())
    }
}

/// Streaming matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherSettings {
    /// Targets resident per page
    #[serde(default = "default_target_page_size")]
    pub target_page_size: usize,

    /// Categories resident per page
    #[serde(default = "default_category_page_size")]
    pub category_page_size: usize,

    /// Maximum ids per ready-flag update statement
    #[serde(default = "default_ready_batch_size")]
    pub ready_batch_size: usize,

    /// Fail instead of calling the provider when an embedding is missing
    #[serde(default)]
    pub cache_only: bool,
}

fn default_target_page_size() -> usize {
    2000
}

fn default_category_page_size() -> usize {
    2000
}

fn default_ready_batch_size() -> usize {
    500
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            target_page_size: default_target_page_size(),
            category_page_size: default_category_page_size(),
            ready_batch_size: default_ready_batch_size(),
            cache_only: false,
        }
    }
}

impl MatcherSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_page_size == 0 || self.category_page_size == 0 {
            return Err("matcher page sizes must be > 0".to_string());
        }
        if self.ready_batch_size == 0 {
            return Err("matcher.ready_batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

/// Classifier training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// L2 weight-decay coefficient
    #[serde(default = "default_l2_reg")]
    pub l2_reg: f32,
}

fn default_epochs() -> usize {
    500
}

fn default_learning_rate() -> f32 {
    0.1
}

fn default_batch_size() -> usize {
    32
}

fn default_l2_reg() -> f32 {
    1e-4
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            batch_size: default_batch_size(),
            l2_reg: default_l2_reg(),
        }
    }
}

impl TrainingSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.epochs == 0 {
            return Err("training.epochs must be > 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("training.batch_size must be > 0".to_string());
        }
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "training.learning_rate must be > 0, got {}",
                self.learning_rate
            ));
        }
        if self.l2_reg < 0.0 {
            return Err(format!(
                "training.l2_reg must be >= 0, got {}",
                self.l2_reg
            ));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// RocksDB database path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub matcher: MatcherSettings,

    #[serde(default)]
    pub training: TrainingSettings,
}

fn default_db_path() -> PathBuf {
    ProjectDirs::from("", "", "lexsort")
        .map(|dirs| dirs.data_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("lexsort-db"))
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            provider: ProviderSettings::default(),
            matcher: MatcherSettings::default(),
            training: TrainingSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration: defaults, then the config file (explicit path
    /// or the default location when present), then environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, String> {
        let mut builder = Config::builder();

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()));
            }
            None => {
                if let Some(dirs) = ProjectDirs::from("", "", "lexsort") {
                    let default_file = dirs.config_dir().join("config.toml");
                    if default_file.exists() {
                        builder = builder.add_source(File::from(default_file));
                    }
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("LEXSORT").separator("__"),
        );

        let settings: EngineConfig = builder
            .build()
            .map_err(|e| format!("config build failed: {e}"))?
            .try_deserialize()
            .map_err(|e| format!("config deserialize failed: {e}"))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.provider.validate()?;
        self.matcher.validate()?;
        self.training.validate()?;
        Ok(())
    }
}
