use crate::client::LedgerHeader;
use chrono::{DateTime, Utc};
use std::fmt;

/// A newly validated ledger, as delivered to a [`LedgerListener`](crate::listener::LedgerListener).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerClosed {
    pub ledger_index: u32,
    pub ledger_hash: String,
    pub txn_count: usize,
    pub close_time: Option<DateTime<Utc>>,
}

impl From<LedgerHeader> for LedgerClosed {
    fn from(header: LedgerHeader) -> Self {
        Self {
            close_time: header.close_time_utc(),
            ledger_index: header.ledger_index,
            ledger_hash: header.ledger_hash,
            txn_count: header.txn_count,
        }
    }
}

impl fmt::Display for LedgerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ledger #{} validated with {} transactions!",
            self.ledger_index, self.txn_count
        )
    }
}
