//! # Collaborator Traits
//!
//! The workflow coordinator and the subscription worker never talk to the
//! network directly. They are generic over the traits in this module, which
//! lets them run against the live [`RpcClient`](crate::rpc::RpcClient) or an
//! in-memory double in tests.
//!
//! - [`LedgerClient`]: autofill and submit-and-wait.
//! - [`TransactionSigner`]: turns a prepared transaction into a signed blob.
//! - [`WalletProvider`]: produces funded wallets.
//! - [`LedgerReader`]: reads closed ledger headers.

use crate::{
    engine_result::EngineResult,
    error::ConnectorError,
    transaction::{PreparedTransaction, SignedTransaction, Transaction},
    types::TxHash,
    wallet::{FundedWallet, Wallet},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Seconds between the Unix epoch and the ledger epoch (2000-01-01T00:00:00Z).
pub const LEDGER_EPOCH_OFFSET: i64 = 946_684_800;

/// A trait abstracting over the node connection used to submit transactions.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fills in `Sequence`, `Fee` and `LastLedgerSequence`.
    async fn autofill(
        &self,
        transaction: &Transaction,
    ) -> Result<PreparedTransaction, ConnectorError>;

    /// Submits a signed transaction and waits until its outcome is final.
    async fn submit_and_wait(
        &self,
        signed: &SignedTransaction,
    ) -> Result<SubmitOutcome, ConnectorError>;
}

/// Signs prepared transactions with a wallet's credential.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign(
        &self,
        prepared: &PreparedTransaction,
        wallet: &Wallet,
    ) -> Result<SignedTransaction, ConnectorError>;
}

/// Provisions funded wallets.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn fund_wallet(&self) -> Result<FundedWallet, ConnectorError>;
}

/// Reads headers of closed ledgers.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn closed_ledger(&self, ledger: LedgerSpecifier) -> Result<LedgerHeader, ConnectorError>;
}

/// Selects a closed ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSpecifier {
    Validated,
    Index(u32),
}

/// The parts of a closed ledger the connector cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerHeader {
    pub ledger_index: u32,
    pub ledger_hash: String,
    pub txn_count: usize,
    /// Close time in seconds since the ledger epoch.
    pub close_time: u64,
}

impl LedgerHeader {
    pub fn close_time_utc(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.close_time).ok()?;
        DateTime::from_timestamp(seconds.checked_add(LEDGER_EPOCH_OFFSET)?, 0)
    }
}

/// The final outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub hash: TxHash,
    pub result: EngineResult,
    /// The ledger that included the transaction, if it was validated.
    pub ledger_index: Option<u32>,
    pub validated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(close_time: u64) -> LedgerHeader {
        LedgerHeader {
            ledger_index: 1,
            ledger_hash: String::new(),
            txn_count: 0,
            close_time,
        }
    }

    #[test]
    fn close_time_counts_from_the_ledger_epoch() {
        let time = header(0).close_time_utc().unwrap();
        assert_eq!(time.to_rfc3339(), "2000-01-01T00:00:00+00:00");
    }

    #[test]
    fn out_of_range_close_time_is_none() {
        assert_eq!(header(u64::MAX).close_time_utc(), None);
        assert_eq!(header(i64::MAX as u64).close_time_utc(), None);
    }
}
