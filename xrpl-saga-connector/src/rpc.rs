//! # JSON-RPC Node Client
//!
//! [`RpcClient`] talks to a node over HTTP JSON-RPC. Besides the raw
//! [`RpcClient::request`] escape hatch it offers typed wrappers for the queries
//! the demos use, and implements [`LedgerClient`] and [`LedgerReader`] so the
//! workflow coordinator and the subscription worker can run against it.
//!
//! Autofill follows the usual client-library rules: `Sequence` comes from
//! `account_info` on the current ledger, `Fee` is the open-ledger fee (capped),
//! and `LastLedgerSequence` is the current ledger index plus a configured
//! offset. Submit-and-wait polls `tx` until the transaction is validated or the
//! validated ledger has moved past its `LastLedgerSequence`.

use crate::{
    client::{LedgerClient, LedgerHeader, LedgerReader, LedgerSpecifier, SubmitOutcome},
    config::ConnectorConfig,
    engine_result::EngineResult,
    error::ConnectorError,
    transaction::{PreparedTransaction, SignedTransaction, Transaction},
    types::{Address, TxHash},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::time::sleep;

/// Which ledger version a query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerIndex {
    Current,
    Validated,
    Seq(u32),
}

impl Serialize for LedgerIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LedgerIndex::Current => serializer.serialize_str("current"),
            LedgerIndex::Validated => serializer.serialize_str("validated"),
            LedgerIndex::Seq(index) => serializer.serialize_u32(*index),
        }
    }
}

impl From<LedgerSpecifier> for LedgerIndex {
    fn from(specifier: LedgerSpecifier) -> Self {
        match specifier {
            LedgerSpecifier::Validated => LedgerIndex::Validated,
            LedgerSpecifier::Index(index) => LedgerIndex::Seq(index),
        }
    }
}

/// Result of `account_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_data: AccountRoot,
    #[serde(default)]
    pub ledger_index: Option<u32>,
    #[serde(default)]
    pub ledger_current_index: Option<u32>,
    #[serde(default)]
    pub validated: bool,
}

/// The account root entry inside `account_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRoot {
    pub account: String,
    /// XRP balance in drops.
    pub balance: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub owner_count: u32,
    pub sequence: u32,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Result of `account_lines`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLines {
    pub account: String,
    #[serde(default)]
    pub lines: Vec<TrustLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustLine {
    /// The counterparty of this trust line.
    pub account: String,
    pub balance: String,
    pub currency: String,
    pub limit: String,
    pub limit_peer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_ripple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
}

/// Result of `gateway_balances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayBalances {
    pub account: String,
    /// Total issued per currency.
    #[serde(default)]
    pub obligations: BTreeMap<String, String>,
    /// Balances held by the requested hot wallets.
    #[serde(default)]
    pub balances: BTreeMap<String, Vec<CurrencyBalance>>,
    #[serde(default)]
    pub assets: BTreeMap<String, Vec<CurrencyBalance>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub currency: String,
    pub value: String,
}

/// Result of `fee`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeInfo {
    pub drops: FeeDrops,
    pub ledger_current_index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeDrops {
    pub base_fee: String,
    pub open_ledger_fee: String,
}

#[derive(Debug, Deserialize)]
struct LedgerResult {
    ledger: LedgerBody,
    ledger_hash: String,
    ledger_index: u32,
}

#[derive(Debug, Deserialize)]
struct LedgerBody {
    close_time: u64,
    #[serde(default)]
    transactions: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SubmitResult {
    engine_result: String,
    #[serde(default)]
    engine_result_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    ledger_index: Option<u32>,
    #[serde(default)]
    meta: Option<TxMeta>,
    #[serde(default)]
    validated: bool,
}

#[derive(Debug, Deserialize)]
struct TxMeta {
    #[serde(rename = "TransactionResult")]
    transaction_result: String,
}

/// A JSON-RPC client for a single node.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    config: Arc<ConnectorConfig>,
}

impl RpcClient {
    /// Creates a client for the configured `rpc-url`.
    pub fn new(config: Arc<ConnectorConfig>) -> Result<Self, ConnectorError> {
        let url = config.network.rpc_url.clone();
        Self::with_url(url, config)
    }

    /// Creates a client for an explicit endpoint, keeping the other settings.
    pub fn with_url(
        url: impl Into<String>,
        config: Arc<ConnectorConfig>,
    ) -> Result<Self, ConnectorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.network.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            config,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Sends one JSON-RPC request and returns its `result` object.
    ///
    /// A result with `status: "error"` becomes [`ConnectorError::Rpc`].
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ConnectorError> {
        tracing::trace!(method, "JSON-RPC request");
        let body = json!({ "method": method, "params": [params] });
        let envelope: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let result = match envelope {
            Value::Object(mut map) => map.remove("result"),
            _ => None,
        }
        .ok_or_else(|| {
            ConnectorError::MalformedResponse(format!("'{method}' response has no result"))
        })?;

        let is_error = result.get("status").and_then(Value::as_str) == Some("error")
            || result.get("error").is_some();
        if is_error {
            return Err(ConnectorError::Rpc {
                command: method.to_string(),
                error: result
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                message: result
                    .get("error_message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
        Ok(result)
    }

    pub(crate) async fn typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ConnectorError> {
        let result = self.request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| ConnectorError::MalformedResponse(format!("'{method}': {e}")))
    }

    pub async fn account_info(
        &self,
        account: &Address,
        ledger: LedgerIndex,
    ) -> Result<AccountInfo, ConnectorError> {
        self.typed(
            "account_info",
            json!({ "account": account, "ledger_index": ledger }),
        )
        .await
    }

    pub async fn account_lines(
        &self,
        account: &Address,
        ledger: LedgerIndex,
    ) -> Result<AccountLines, ConnectorError> {
        self.typed(
            "account_lines",
            json!({ "account": account, "ledger_index": ledger }),
        )
        .await
    }

    pub async fn gateway_balances(
        &self,
        issuer: &Address,
        hot_wallets: &[Address],
        ledger: LedgerIndex,
    ) -> Result<GatewayBalances, ConnectorError> {
        self.typed(
            "gateway_balances",
            json!({
                "account": issuer,
                "hotwallet": hot_wallets,
                "ledger_index": ledger,
                "strict": true,
            }),
        )
        .await
    }

    pub async fn fee(&self) -> Result<FeeInfo, ConnectorError> {
        self.typed("fee", json!({})).await
    }

    async fn wait_for_validation(
        &self,
        hash: &TxHash,
        last_ledger_sequence: u32,
        preliminary: &EngineResult,
    ) -> Result<SubmitOutcome, ConnectorError> {
        let interval = Duration::from_millis(self.config.submission.poll_interval_ms);
        loop {
            sleep(interval).await;

            match self
                .typed::<TxResult>("tx", json!({ "transaction": hash.as_str() }))
                .await
            {
                Ok(tx) if tx.validated => {
                    let meta = tx.meta.ok_or_else(|| {
                        ConnectorError::MalformedResponse(format!(
                            "validated transaction {hash} has no meta"
                        ))
                    })?;
                    return Ok(SubmitOutcome {
                        hash: hash.clone(),
                        result: EngineResult::new(meta.transaction_result),
                        ledger_index: tx.ledger_index,
                        validated: true,
                    });
                }
                Ok(_) => tracing::trace!(%hash, "Transaction seen but not yet validated"),
                Err(e) if e.rpc_error() == Some("txnNotFound") => {
                    tracing::trace!(%hash, "Transaction not found yet")
                }
                Err(e) => return Err(e),
            }

            let validated = self.closed_ledger(LedgerSpecifier::Validated).await?;
            if validated.ledger_index > last_ledger_sequence {
                tracing::warn!(
                    %hash,
                    %preliminary,
                    validated_ledger = validated.ledger_index,
                    last_ledger_sequence,
                    "Transaction expired before validation"
                );
                return Err(ConnectorError::Expired {
                    hash: hash.to_string(),
                    last_ledger_sequence,
                });
            }
        }
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn autofill(
        &self,
        transaction: &Transaction,
    ) -> Result<PreparedTransaction, ConnectorError> {
        let (info, fee) = tokio::try_join!(
            self.account_info(transaction.account(), LedgerIndex::Current),
            self.fee()
        )?;

        let open_ledger_fee: u64 = fee.drops.open_ledger_fee.parse().map_err(|_| {
            ConnectorError::MalformedResponse(format!(
                "open_ledger_fee '{}' is not a number",
                fee.drops.open_ledger_fee
            ))
        })?;
        let fee_drops = open_ledger_fee.min(self.config.submission.max_fee_drops);
        let last_ledger_sequence = fee
            .ledger_current_index
            .saturating_add(self.config.submission.ledger_offset);

        tracing::debug!(
            account = %transaction.account(),
            sequence = info.account_data.sequence,
            fee_drops,
            last_ledger_sequence,
            "Autofilled {}",
            transaction.kind()
        );
        Ok(PreparedTransaction::new(
            transaction.clone(),
            info.account_data.sequence,
            fee_drops,
            last_ledger_sequence,
        ))
    }

    async fn submit_and_wait(
        &self,
        signed: &SignedTransaction,
    ) -> Result<SubmitOutcome, ConnectorError> {
        let submitted: SubmitResult = self
            .typed("submit", json!({ "tx_blob": signed.tx_blob }))
            .await?;
        let preliminary = EngineResult::new(submitted.engine_result);
        tracing::debug!(
            hash = %signed.hash,
            %preliminary,
            message = submitted.engine_result_message.as_deref().unwrap_or(""),
            "Submitted transaction"
        );

        if preliminary.is_final_before_validation() {
            return Ok(SubmitOutcome {
                hash: signed.hash.clone(),
                result: preliminary,
                ledger_index: None,
                validated: false,
            });
        }

        self.wait_for_validation(&signed.hash, signed.last_ledger_sequence, &preliminary)
            .await
    }
}

#[async_trait]
impl LedgerReader for RpcClient {
    async fn closed_ledger(&self, ledger: LedgerSpecifier) -> Result<LedgerHeader, ConnectorError> {
        let result: LedgerResult = self
            .typed(
                "ledger",
                json!({
                    "ledger_index": LedgerIndex::from(ledger),
                    "transactions": true,
                    "expand": false,
                }),
            )
            .await?;
        Ok(LedgerHeader {
            ledger_index: result.ledger_index,
            ledger_hash: result.ledger_hash,
            txn_count: result.ledger.transactions.map_or(0, |txs| txs.len()),
            close_time: result.ledger.close_time,
        })
    }
}
