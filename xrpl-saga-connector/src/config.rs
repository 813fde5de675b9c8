use serde::{Deserialize, Serialize};

/// The top-level configuration for the `xrpl-saga-connector` library.
///
/// This struct aggregates the node endpoints, submission behavior and
/// subscription settings. It is typically deserialized from a configuration
/// file and shared as an `Arc` between the RPC client and background workers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectorConfig {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub submission: Submission,
    #[serde(default)]
    pub subscription: Subscription,
    #[serde(default)]
    pub channels: ChannelConfig,
}

/// Endpoints of the ledger network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Network {
    /// JSON-RPC endpoint of a node.
    pub rpc_url: String,
    /// Base URL of the test network faucet.
    pub faucet_url: String,
    /// Base URL of a block explorer, used for log links only.
    pub explorer_url: String,
    /// Node used by `NodeSigner`. Unset means transactions are signed locally;
    /// there is no fallback to `rpc_url`.
    pub signing_url: Option<String>,
    pub request_timeout_secs: u64,
}

/// Defines how transactions are autofilled and confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Submission {
    /// Interval between `tx` lookups while waiting for validation.
    pub poll_interval_ms: u64,
    /// Added to the current ledger index to form `LastLedgerSequence`.
    pub ledger_offset: u32,
    /// Upper bound on the autofilled fee.
    pub max_fee_drops: u64,
}

/// Defines behavior of the ledger-close subscription worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Subscription {
    /// The interval at which the worker polls for a newly validated ledger.
    pub poll_interval_ms: u64,
    /// The maximum number of skipped ledgers fetched individually after a gap.
    pub max_backfill: u32,
}

/// Defines capacities for the MPSC channels within the connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChannelConfig {
    /// The buffer capacity of a ledger listener's event channel.
    pub ledger_event_buffer: usize,
}

impl Network {
    pub fn signing_url(&self) -> Option<&str> {
        self.signing_url.as_deref()
    }

    /// Link to a transaction on the configured explorer.
    pub fn explorer_link(&self, hash: impl std::fmt::Display) -> String {
        format!("{}/transactions/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

impl Default for Network {
    fn default() -> Self {
        Self {
            rpc_url: "https://s.altnet.rippletest.net:51234".to_string(),
            faucet_url: "https://faucet.altnet.rippletest.net".to_string(),
            explorer_url: "https://testnet.xrpl.org".to_string(),
            signing_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            ledger_offset: 20,
            max_fee_drops: 2_000_000,
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_backfill: 10,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            ledger_event_buffer: 128,
        }
    }
}
