// Configuration source loading.
//
// Priority order:
// 1. Environment variables (SENSOR2CSV_* prefix)
// 2. Config file path from SENSOR2CSV_CONFIG
// 3. Inline config content from SENSOR2CSV_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.sensor2csv.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILES: &[&str] = &["./config.toml", "./.sensor2csv.toml"];

pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    if let Some(file_config) = load_from_file()? {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Some(path) = StdEnvSource.get("CONFIG") {
        return parse_file(Path::new(&path)).map(Some);
    }

    if let Some(content) = StdEnvSource.get("CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content).with_context(|| {
            format!("Failed to parse inline config from {}CONFIG_CONTENT", ENV_PREFIX)
        })?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return parse_file(path).map(Some);
        }
    }

    Ok(None)
}

fn parse_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = parse_file(path.as_ref())?;

    let mut config = RuntimeConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults.
pub fn load_or_default() -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    match load_from_file() {
        Ok(Some(file_config)) => config.merge(file_config),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable config file, using defaults"),
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_file_is_parsed_and_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [batch]
            max_records = 10
            max_age_ms = 500

            [storage]
            output_dir = "/tmp/sensors"
            "#
        )
        .unwrap();

        let config = load_from_file_path(file.path()).unwrap();
        assert_eq!(config.batch.max_records, 10);
        assert_eq!(config.batch.max_age_ms, 500);
        assert_eq!(config.storage.output_dir, "/tmp/sensors");
        assert_eq!(config.storage.analog_file, "analog_data.csv");
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\nmax_records = 0").unwrap();
        assert!(load_from_file_path(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_file_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
