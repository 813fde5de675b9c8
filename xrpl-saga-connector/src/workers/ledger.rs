use crate::{
    client::{LedgerHeader, LedgerReader, LedgerSpecifier},
    config::ConnectorConfig,
    error::ConnectorError,
    events::LedgerClosed,
};
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{sleep, Duration},
};

/// Polls for validated ledgers and forwards each new one to a listener.
pub struct LedgerWorker {
    config: Arc<ConnectorConfig>,
    reader: Arc<dyn LedgerReader>,
    tx: mpsc::Sender<LedgerClosed>,
    last_seen: Option<u32>,
}

impl LedgerWorker {
    pub(crate) fn new(
        config: Arc<ConnectorConfig>,
        reader: Arc<dyn LedgerReader>,
        tx: mpsc::Sender<LedgerClosed>,
    ) -> Self {
        Self {
            config,
            reader,
            tx,
            last_seen: None,
        }
    }

    /// Runs until the listener is dropped or unsubscribed.
    ///
    /// Poll failures are logged and retried on the next tick.
    pub async fn run(mut self) {
        let interval = Duration::from_millis(self.config.subscription.poll_interval_ms);
        tracing::info!("Ledger worker started, polling every {:?}", interval);

        loop {
            tokio::select! {
                _ = sleep(interval) => {},
                _ = self.tx.closed() => {
                    tracing::info!("LedgerWorker: listener closed, exiting.");
                    return;
                }
            }

            match self.poll().await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!("LedgerWorker: listener dropped, exiting.");
                    return;
                }
                Err(e) => tracing::error!("Error polling validated ledger: {}", e),
            }
        }
    }

    /// Returns `Ok(false)` when the listener is gone.
    async fn poll(&mut self) -> Result<bool, ConnectorError> {
        let latest = self.reader.closed_ledger(LedgerSpecifier::Validated).await?;

        let first = match self.last_seen {
            None => latest.ledger_index,
            Some(last) if latest.ledger_index <= last => return Ok(true),
            Some(last) => {
                let floor = latest
                    .ledger_index
                    .saturating_sub(self.config.subscription.max_backfill);
                (last + 1).max(floor)
            }
        };

        if let Some(last) = self.last_seen {
            if first > last + 1 {
                tracing::warn!(
                    "Skipped ledgers {}..{} beyond the backfill limit",
                    last + 1,
                    first
                );
            }
        }

        for index in first..latest.ledger_index {
            let header = self
                .reader
                .closed_ledger(LedgerSpecifier::Index(index))
                .await?;
            if !self.emit(header).await {
                return Ok(false);
            }
        }
        Ok(self.emit(latest).await)
    }

    async fn emit(&mut self, header: LedgerHeader) -> bool {
        let index = header.ledger_index;
        let event = LedgerClosed::from(header);
        tracing::debug!("[LEDGER] {}", event);
        if self.tx.send(event).await.is_err() {
            return false;
        }
        self.last_seen = Some(index);
        true
    }
}
