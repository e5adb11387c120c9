use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
    pub validation_log_file: String,
    pub stats_file: String,
}

impl StorageConfig {
    pub fn validation_log_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.validation_log_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.stats_file)
    }
}

/// Defaults applied to generation requests that do not override them.
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    pub min_confidence: f64,
    pub max_hypotheses: usize,
    pub novelty_threshold: f64,
    pub include_experiment_design: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub fetch_deadline_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub max_papers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub discovery: DiscoveryConfig,
    pub upstream: UpstreamConfig,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        tracing::debug!("Loading configuration for run mode {}", run_mode);

        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("GAIALAB").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// Built-in values only; no files or environment are consulted.
    pub fn load_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("storage.data_dir", "data")?
            .set_default("storage.validation_log_file", "validation_log.json")?
            .set_default("storage.stats_file", "accuracy_stats.json")?
            .set_default("discovery.min_confidence", 0.3)?
            .set_default("discovery.max_hypotheses", 10_i64)?
            .set_default("discovery.novelty_threshold", 0.5)?
            .set_default("discovery.include_experiment_design", true)?
            .set_default("upstream.fetch_deadline_ms", 90_000_i64)?
            .set_default("ledger.max_papers", 200_i64)
    }
}
