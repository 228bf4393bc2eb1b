// Configuration validation
//
// Rejects values the pipeline cannot run with and warns about suspicious ones

use crate::*;
use anyhow::{bail, Result};
use std::collections::HashSet;
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_batch_config(&config.batch)?;
    validate_request_config(&config.request)?;
    validate_storage_config(&config.storage)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_batch_config(config: &BatchConfig) -> Result<()> {
    if config.max_records == 0 {
        bail!("batch.max_records must be greater than 0");
    }

    if config.max_age_ms == 0 {
        bail!("batch.max_age_ms must be greater than 0");
    }

    if config.poll_interval_ms == 0 {
        bail!("batch.poll_interval_ms must be greater than 0");
    }

    if config.poll_interval_ms > config.max_age_ms {
        bail!(
            "batch.poll_interval_ms ({}) must not exceed batch.max_age_ms ({})",
            config.poll_interval_ms,
            config.max_age_ms
        );
    }

    if config.queue_warn_depth == 0 {
        bail!("batch.queue_warn_depth must be greater than 0");
    }

    if config.max_records > 1_000_000 {
        warn!(
            max_records = config.max_records,
            "batch.max_records is very large; may cause memory issues"
        );
    }

    Ok(())
}

fn validate_request_config(config: &RequestConfig) -> Result<()> {
    if config.max_payload_bytes == 0 {
        bail!("request.max_payload_bytes must be greater than 0");
    }

    if config.max_payload_bytes > 16 * 1024 * 1024 {
        warn!(
            max_payload_bytes = config.max_payload_bytes,
            "request.max_payload_bytes is very large for a single sensor reading"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.output_dir.trim().is_empty() {
        bail!("storage.output_dir must not be empty");
    }

    let files = [
        ("storage.raw_log_file", &config.raw_log_file),
        ("storage.environmental_file", &config.environmental_file),
        ("storage.analog_file", &config.analog_file),
    ];
    let mut seen = HashSet::new();
    for (key, file) in files {
        if file.trim().is_empty() {
            bail!("{} must not be empty", key);
        }
        if file.contains('/') || file.contains('\\') {
            bail!("{} must be a file name inside storage.output_dir", key);
        }
        if !seen.insert(file.as_str()) {
            bail!("{} '{}' is already used by another sink", key, file);
        }
    }

    if config.write_retries > 10 {
        warn!(
            write_retries = config.write_retries,
            "storage.write_retries is high; a failing sink will stall every flush"
        );
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_config() {
        assert!(validate_batch_config(&BatchConfig::default()).is_ok());

        let zero_records = BatchConfig {
            max_records: 0,
            ..BatchConfig::default()
        };
        assert!(validate_batch_config(&zero_records).is_err());

        let slow_poll = BatchConfig {
            max_age_ms: 50,
            poll_interval_ms: 100,
            ..BatchConfig::default()
        };
        let err = validate_batch_config(&slow_poll).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_storage_config() {
        assert!(validate_storage_config(&StorageConfig::default()).is_ok());

        let shared = StorageConfig {
            analog_file: "sensor_data.csv".to_string(),
            ..StorageConfig::default()
        };
        assert!(validate_storage_config(&shared).is_err());

        let empty = StorageConfig {
            raw_log_file: " ".to_string(),
            ..StorageConfig::default()
        };
        assert!(validate_storage_config(&empty).is_err());

        let nested = StorageConfig {
            environmental_file: "../env.csv".to_string(),
            ..StorageConfig::default()
        };
        assert!(validate_storage_config(&nested).is_err());
    }

    #[test]
    fn test_validate_server_config() {
        let bad = ServerConfig {
            listen_addr: "5000".to_string(),
            ..ServerConfig::default()
        };
        assert!(validate_server_config(&bad).is_err());
    }
}
