// Initialization utilities for server mode
//
// Sink storage, ingestion pipeline and logging/tracing setup

use std::time::Duration;

use anyhow::{Context, Result};
use sensor2csv_batch::{BatchConfig, IngestPipeline};
use sensor2csv_config::{LogFormat, RuntimeConfig};
use sensor2csv_writer::{FsStorage, RetryPolicy, SinkFiles, SinkRouter};
use tracing::info;

pub(crate) fn batch_config(config: &RuntimeConfig) -> BatchConfig {
    BatchConfig {
        max_records: config.batch.max_records,
        max_age: config.batch.max_age(),
        poll_interval: config.batch.poll_interval(),
        queue_warn_depth: config.batch.queue_warn_depth,
    }
}

pub(crate) fn retry_policy(config: &RuntimeConfig) -> RetryPolicy {
    RetryPolicy {
        retries: config.storage.write_retries,
        backoff: Duration::from_millis(config.storage.retry_backoff_ms),
    }
}

pub(crate) fn sink_files(config: &RuntimeConfig) -> SinkFiles {
    SinkFiles {
        raw_log: config.storage.raw_log_file.clone(),
        environmental: config.storage.environmental_file.clone(),
        analog: config.storage.analog_file.clone(),
    }
}

/// Create the output files and start the accumulator thread.
pub fn init_pipeline(config: &RuntimeConfig) -> Result<IngestPipeline> {
    let storage = FsStorage::new(&config.storage.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", config.storage.output_dir))?;
    info!("Using output directory: {}", storage.root().display());

    let mut router =
        SinkRouter::with_default_sinks(storage, &sink_files(config), retry_policy(config))
            .context("Invalid sink configuration")?;
    router
        .bootstrap()
        .context("Failed to prepare sink files")?;

    let pipeline = IngestPipeline::start(batch_config(config), router)
        .context("Failed to start batch accumulator")?;
    info!(
        "Batching enabled (max_records={} max_age={}ms)",
        config.batch.max_records, config.batch.max_age_ms
    );
    Ok(pipeline)
}

/// Initialize tracing/logging from RuntimeConfig
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let server = &config.server;

    // Parse log level from config
    let env_filter =
        EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match server.log_format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}
