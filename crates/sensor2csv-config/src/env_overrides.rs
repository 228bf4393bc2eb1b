use super::RuntimeConfig;
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "SENSOR2CSV_";

/// Abstraction over environment-variable lookups so tests can supply
/// their own source of overrides.
pub trait EnvSource {
    /// Look up `key` with the `SENSOR2CSV_` prefix applied.
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Batch configuration
    if let Some(val) = get_env_parsed(env, "BATCH_MAX_RECORDS")? {
        config.batch.max_records = val;
    }
    if let Some(val) = get_env_parsed(env, "BATCH_MAX_AGE_MS")? {
        config.batch.max_age_ms = val;
    }
    if let Some(val) = get_env_parsed(env, "BATCH_POLL_INTERVAL_MS")? {
        config.batch.poll_interval_ms = val;
    }
    if let Some(val) = get_env_parsed(env, "BATCH_QUEUE_WARN_DEPTH")? {
        config.batch.queue_warn_depth = val;
    }

    // Request configuration
    if let Some(val) = get_env_parsed(env, "MAX_PAYLOAD_BYTES")? {
        config.request.max_payload_bytes = val;
    }

    // Storage
    if let Some(dir) = env.get("OUTPUT_DIR") {
        config.storage.output_dir = dir;
    }
    if let Some(val) = get_env_parsed(env, "WRITE_RETRIES")? {
        config.storage.write_retries = val;
    }
    if let Some(val) = get_env_parsed(env, "RETRY_BACKOFF_MS")? {
        config.storage.retry_backoff_ms = val;
    }

    // Server configuration (listen addr, log level/format)
    if let Some(addr) = env.get("LISTEN_ADDR") {
        config.server.listen_addr = addr;
    }
    if let Some(level) = env.get("LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.server.log_format = format
            .parse()
            .with_context(|| format!("Invalid {}LOG_FORMAT value", ENV_PREFIX))?;
    }

    Ok(())
}

fn get_env_parsed<E, T>(env: &E, key: &str) -> Result<Option<T>>
where
    E: EnvSource,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
