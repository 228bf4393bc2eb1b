use anyhow::{Context, Result};
use clap::Parser;
use sensor2csv_config::RuntimeConfig;
use std::path::PathBuf;

/// HTTP ingestion server appending sensor readings to JSONL and CSV files
#[derive(Parser, Debug)]
#[command(name = "sensor2csv")]
#[command(version)]
#[command(about = "HTTP ingestion server appending sensor readings to JSONL and CSV files", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config file)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Output directory for the JSONL log and CSV tables
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'l', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run async server
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try default locations, fall back to defaults
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    // Step 3: Run server with resolved config
    sensor2csv_server::run_with_config(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        let host = config
            .server
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.listen_addr = format!("{}:{}", host, port);
    }

    if let Some(output) = &cli.output {
        config.storage.output_dir = output.to_string_lossy().to_string();
    }

    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "sensor2csv",
            "--port",
            "6000",
            "--output",
            "/srv/sensors",
            "-l",
            "debug",
        ]);
        let mut config = RuntimeConfig::default();
        config.server.listen_addr = "127.0.0.1:5000".to_string();

        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config.server.listen_addr, "127.0.0.1:6000");
        assert_eq!(config.storage.output_dir, "/srv/sensors");
        assert_eq!(config.server.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = Cli::parse_from(["sensor2csv"]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config, RuntimeConfig::default());
    }
}
