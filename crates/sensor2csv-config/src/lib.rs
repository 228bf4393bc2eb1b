// sensor2csv-config - Runtime configuration
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from SENSOR2CSV_CONFIG env var
// 3. Config file contents from SENSOR2CSV_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.sensor2csv.toml)
// 5. Built-in defaults (lowest priority)
//
// Command-line flags are applied by the binary on top of the loaded config.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub batch: BatchConfig,
    pub request: RequestConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Hybrid size/age flush policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_records: usize,
    pub max_age_ms: u64,
    pub poll_interval_ms: u64,
    pub queue_warn_depth: usize,
}

impl BatchConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_records: 100,
            max_age_ms: 1_000,
            poll_interval_ms: 100,
            queue_warn_depth: 10_000,
        }
    }
}

/// Request handling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub max_payload_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
        }
    }
}

/// Output directory, sink file names and write retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: String,
    pub raw_log_file: String,
    pub environmental_file: String,
    pub analog_file: String,
    pub write_retries: u32,
    pub retry_backoff_ms: u64,
}

impl StorageConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: "./data".to_string(),
            raw_log_file: "sensor_data.jsonl".to_string(),
            environmental_file: "sensor_data.csv".to_string(),
            analog_file: "analog_data.csv".to_string(),
            write_retries: 2,
            retry_backoff_ms: 50,
        }
    }
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load from an explicit file (CLI `--config`), then apply env overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Like [`RuntimeConfig::load`], but an unreadable default file falls back to defaults.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Parse TOML content, apply overrides from `env`, and validate.
    pub fn from_toml_with_env<E: EnvSource>(content: Option<&str>, env: &E) -> Result<Self> {
        let mut config = RuntimeConfig::default();
        if let Some(content) = content {
            let file_config: RuntimeConfig =
                toml::from_str(content).context("Failed to parse inline config content")?;
            config.merge(file_config);
        }
        config.apply_env_overrides_from(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace every section with the one from `other`.
    ///
    /// Sections are deserialized with defaults, so a file that omits a
    /// section or a key still yields the built-in value for it.
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.batch = other.batch;
        self.request = other.request;
        self.storage = other.storage;
        self.server = other.server;
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
