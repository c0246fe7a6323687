use anyhow::{anyhow, Context, Result};
use procura_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

/// Installs the global subscriber from the effective configuration. Logs go to
/// stderr so command payloads on stdout stay machine-readable.
pub fn init_from_env() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default()).context("loading logging config")?;
    init(&config)
}

pub fn init(config: &AppConfig) -> Result<()> {
    let level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
