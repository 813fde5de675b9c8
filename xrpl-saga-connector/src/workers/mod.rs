//! # Ledger Subscription
//!
//! Ledger-close notifications are delivered by message passing rather than
//! callbacks. [`subscribe_ledgers`] creates a connected pair:
//!
//! - [`LedgerWorker`]: the producer. Spawn its [`run`](LedgerWorker::run) as a
//!   background task; it polls the node for newly validated ledgers and pushes
//!   a [`LedgerClosed`](crate::events::LedgerClosed) for each one.
//! - [`LedgerListener`]: the consumer, drained by any task that cares.
//!
//! The worker shares only the node client with the rest of the application and
//! never touches workflow state, so it can run alongside a workflow on the same
//! connection.

mod ledger;

pub use ledger::LedgerWorker;

use crate::{client::LedgerReader, config::ConnectorConfig, listener::LedgerListener};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates a ledger-close subscription.
///
/// Nothing is polled until the returned worker is run.
pub fn subscribe_ledgers(
    config: Arc<ConnectorConfig>,
    reader: Arc<dyn LedgerReader>,
) -> (LedgerWorker, LedgerListener) {
    let (tx, rx) = mpsc::channel(config.channels.ledger_event_buffer.max(1));
    (LedgerWorker::new(config, reader, tx), LedgerListener::new(rx))
}
