use thiserror::Error;

/// Errors raised while constructing a transaction or a workflow step.
///
/// These never reach the network: a value that fails validation cannot be
/// autofilled, signed or submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Invalid account address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Transfer rate {0} is outside 1000000000..=2000000000 and is not 0")]
    InvalidTransferRate(u32),

    #[error("Tick size {0} is outside 3..=15 and is not 0")]
    InvalidTickSize(u8),

    #[error("Conflicting flags: {0}")]
    ConflictingFlags(&'static str),

    #[error("{field} must differ from the sending account {account}")]
    SelfReference { field: &'static str, account: String },

    #[error("Invalid seed: {0}")]
    InvalidSeed(&'static str),

    #[error("Step for account {account} cannot be signed by wallet {signer}")]
    SignerMismatch { account: String, signer: String },
}

/// Errors raised by the network-facing collaborators (node client, signer,
/// faucet).
///
/// Every variant is an infrastructure failure from the coordinator's point of
/// view; a ledger rejection is reported as a result code, not as an error.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(
        "Node returned error for '{command}': {error} ({})",
        .message.as_deref().unwrap_or("no message")
    )]
    Rpc {
        command: String,
        error: String,
        message: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Faucet error: {0}")]
    Faucet(String),

    #[error("Transaction {hash} was not validated before ledger {last_ledger_sequence}")]
    Expired {
        hash: String,
        last_ledger_sequence: u32,
    },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] TransactionError),
}

impl ConnectorError {
    /// Returns the node's error token (e.g. `txnNotFound`) for RPC errors.
    pub fn rpc_error(&self) -> Option<&str> {
        match self {
            ConnectorError::Rpc { error, .. } => Some(error),
            _ => None,
        }
    }
}
