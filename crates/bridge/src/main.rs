//! Tagbridge - field-bus telemetry bridge
//!
//! # Usage
//!
//! ```bash
//! # Run the bridge with the default config
//! tagbridge
//! tagbridge --config configs/tagbridge.toml
//! tagbridge --log-level debug
//! ```

mod serve;
mod tcp;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tagbridge_config::Config;

/// Tagbridge - field-bus telemetry bridge
#[derive(Parser, Debug)]
#[command(name = "tagbridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/tagbridge.toml")]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    init_logging(level)?;

    serve::run(config).await
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
