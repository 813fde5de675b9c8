pub mod cli;
pub mod config;
mod demo;
pub mod issuance;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::load_config;
use std::sync::Arc;

/// The main entry point for the `xrpl-saga` binary.
/// This function handles CLI parsing, configuration, logging and runs the chosen demo.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.config {
        Some(path) => println!("Loading configuration from '{path}'"),
        None => println!("No config file provided, using default settings."),
    }
    let config = load_config(cli.config.as_deref())?;
    xrpl_saga_logger::init(&config.log)?;
    tracing::debug!("Configuration loaded: {:#?}", &config);

    let connector = Arc::new(config.connector);
    match cli.command {
        Commands::Account(cmd) => demo::account(connector, cmd.ledgers).await,
        Commands::Issue(cmd) => demo::issue(connector, cmd.into()).await,
    }
}
