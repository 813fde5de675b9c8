use anyhow::{Context, Result};
use serde::Deserialize;
use xrpl_saga_connector::config::ConnectorConfig;
use xrpl_saga_logger::LogConfig;

/// Prefix of environment variables that override file settings,
/// e.g. `XRPL_SAGA__LOG__LEVEL=debug`.
pub const ENV_PREFIX: &str = "XRPL_SAGA";

/// The top-level configuration for the `xrpl-saga` binary.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Loads the configuration from an optional TOML file plus environment overrides.
///
/// Every section is optional; missing values take their defaults.
pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path));
    }
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

    let source = path.unwrap_or("<defaults>");
    let settings: AppConfig = builder
        .build()
        .with_context(|| format!("Failed to build configuration from '{source}'"))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}
