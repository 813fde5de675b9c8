use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs::File, sync::Mutex};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

/// Logging configuration, usually the `[log]` table of the application config.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogConfig {
    /// A level (`"debug"`) or a full filter directive (`"info,xrpl_saga_connector=trace"`).
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required when `output` is `file`.
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
        }
    }
}

/// Picks the filter directives: `RUST_LOG` when set, else the configured level.
pub fn filter_directives(config: &LogConfig, rust_log: Option<&str>) -> String {
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .or_else(|| Some(config.level.trim()).filter(|level| !level.is_empty()))
        .unwrap_or(DEFAULT_LEVEL)
        .to_string()
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(config, rust_log.as_deref());
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{directives}' ({e}), falling back to '{DEFAULT_LEVEL}'");
        EnvFilter::new(DEFAULT_LEVEL)
    })
}

/// Installs the global `tracing` subscriber.
///
/// Fails if `output` is `file` without a `file-path`, if the file cannot be
/// created, or if a global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let subscriber = Registry::default().with(build_filter(config));

    match config.output {
        LogOutput::File => {
            let file_path = config
                .file_path
                .as_deref()
                .ok_or_else(|| {
                    anyhow::anyhow!("Log output is 'file' but 'file-path' is not specified")
                })?;
            let log_file = File::create(file_path)
                .with_context(|| format!("Failed to create log file '{file_path}'"))?;
            let layer = fmt::layer().with_writer(Mutex::new(log_file)).with_ansi(false);

            match config.format {
                LogFormat::Json => subscriber.with(layer.json()).try_init(),
                LogFormat::Plain => subscriber.with(layer.pretty()).try_init(),
            }
        }
        LogOutput::Stdout => {
            let layer = fmt::layer().with_writer(std::io::stdout);
            match config.format {
                LogFormat::Json => subscriber.with(layer.json()).try_init(),
                LogFormat::Plain => subscriber.with(layer.pretty()).try_init(),
            }
        }
    }
    .context("Failed to install the tracing subscriber")?;

    Ok(())
}
