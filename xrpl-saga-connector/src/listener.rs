//! # Ledger Listener
//!
//! The consumer end of a ledger-close subscription. The [`LedgerWorker`]
//! pushes [`LedgerClosed`] events onto a bounded channel; a listener drains it.
//! Dropping the listener closes the channel, which tells the worker to stop.
//!
//! [`LedgerWorker`]: crate::workers::LedgerWorker

pub use crate::events::LedgerClosed;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug)]
pub struct LedgerListener {
    rx: mpsc::Receiver<LedgerClosed>,
}

impl LedgerListener {
    pub(crate) fn new(rx: mpsc::Receiver<LedgerClosed>) -> Self {
        Self { rx }
    }

    /// Receives the next validated ledger. Returns `None` once the worker has stopped.
    pub async fn next_ledger(&mut self) -> Option<LedgerClosed> {
        self.rx.recv().await
    }

    /// Converts the listener into a `Stream` of events.
    pub fn into_stream(self) -> ReceiverStream<LedgerClosed> {
        ReceiverStream::new(self.rx)
    }

    /// Stops the subscription. Events already buffered are discarded.
    pub fn unsubscribe(mut self) {
        tracing::debug!("Unsubscribing ledger listener");
        self.rx.close();
    }
}
