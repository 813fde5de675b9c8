//! # Signers
//!
//! [`LocalSigner`] derives the Ed25519 key from the wallet seed, encodes the
//! autofilled transaction in its canonical binary form and signs it in
//! process. Nothing is sent over the network.
//!
//! [`NodeSigner`] hands the transaction to a node's `sign` method in offline
//! mode instead. The seed travels to that node, so it is only built when
//! `signing-url` is set explicitly and should point at a node you control
//! (for example a local rippled with signing enabled).

use crate::{
    client::TransactionSigner,
    codec::{self, fields, Field},
    config::ConnectorConfig,
    error::{ConnectorError, TransactionError},
    keys::{sha512_half, Keypair},
    rpc::RpcClient,
    transaction::{PreparedTransaction, SignedTransaction},
    types::TxHash,
    wallet::Wallet,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

fn ensure_signer(prepared: &PreparedTransaction, wallet: &Wallet) -> Result<(), TransactionError> {
    if prepared.transaction.account() != wallet.address() {
        return Err(TransactionError::SignerMismatch {
            account: prepared.transaction.account().to_string(),
            signer: wallet.address().to_string(),
        });
    }
    Ok(())
}

/// Signs transactions in process with the wallet's Ed25519 key.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSigner;

impl LocalSigner {
    pub fn new() -> Self {
        Self
    }

    /// Produces the signed blob and its hash without any I/O.
    pub fn sign_blocking(
        &self,
        prepared: &PreparedTransaction,
        wallet: &Wallet,
    ) -> Result<SignedTransaction, TransactionError> {
        ensure_signer(prepared, wallet)?;
        let keypair = Keypair::from_seed(wallet.seed())?;
        let derived = keypair.address();
        if &derived != wallet.address() {
            return Err(TransactionError::SignerMismatch {
                account: wallet.address().to_string(),
                signer: derived.to_string(),
            });
        }

        let mut body = prepared.signing_fields(keypair.public_key())?;
        let signing_blob = codec::serialize(&codec::SIGNING_PREFIX, body.clone());
        let signature = keypair.sign(&signing_blob);
        body.push(Field::blob(fields::TXN_SIGNATURE, &signature));
        let tx_blob = codec::serialize(&[], body);
        let hash = sha512_half(&[&codec::TX_ID_PREFIX[..], &tx_blob[..]]);

        tracing::debug!(account = %wallet.address(), "Signed transaction locally");
        Ok(SignedTransaction {
            tx_blob: hex::encode_upper(&tx_blob),
            hash: TxHash::new(hex::encode_upper(hash)),
            last_ledger_sequence: prepared.last_ledger_sequence,
        })
    }
}

#[async_trait]
impl TransactionSigner for LocalSigner {
    async fn sign(
        &self,
        prepared: &PreparedTransaction,
        wallet: &Wallet,
    ) -> Result<SignedTransaction, ConnectorError> {
        Ok(self.sign_blocking(prepared, wallet)?)
    }
}

#[derive(Debug, Deserialize)]
struct SignResult {
    tx_blob: String,
    tx_json: SignedTxJson,
}

#[derive(Debug, Deserialize)]
struct SignedTxJson {
    hash: String,
}

/// Signs transactions through a node's `sign` method.
#[derive(Debug, Clone)]
pub struct NodeSigner {
    rpc: RpcClient,
}

impl NodeSigner {
    /// Creates a signer for the configured `signing-url`.
    ///
    /// Fails when `signing-url` is unset; `rpc-url` is never used for signing.
    pub fn new(config: Arc<ConnectorConfig>) -> Result<Self, ConnectorError> {
        let url = config
            .network
            .signing_url()
            .ok_or_else(|| ConnectorError::Config("signing-url is not set".into()))?
            .to_string();
        Ok(Self {
            rpc: RpcClient::with_url(url, config)?,
        })
    }
}

#[async_trait]
impl TransactionSigner for NodeSigner {
    async fn sign(
        &self,
        prepared: &PreparedTransaction,
        wallet: &Wallet,
    ) -> Result<SignedTransaction, ConnectorError> {
        ensure_signer(prepared, wallet)?;

        let signed: SignResult = self
            .rpc
            .typed(
                "sign",
                json!({
                    "tx_json": prepared.to_tx_json()?,
                    "secret": wallet.seed(),
                    "offline": true,
                }),
            )
            .await?;

        Ok(SignedTransaction {
            tx_blob: signed.tx_blob,
            hash: TxHash::new(signed.tx_json.hash),
            last_ledger_sequence: prepared.last_ledger_sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        transaction::TrustSet,
        types::{Address, CurrencyCode, IssuedAmount},
    };

    const COLD: &str = "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY";

    fn trust_set_for(wallet: &Wallet) -> PreparedTransaction {
        let limit = IssuedAmount::limit(
            CurrencyCode::parse("TST").unwrap(),
            Address::parse(COLD).unwrap(),
            "10000000000",
        )
        .unwrap();
        let tx = TrustSet::builder(wallet.address().clone(), limit)
            .build()
            .unwrap();
        PreparedTransaction::new(tx.into(), 7, 12, 120)
    }

    #[test]
    fn signed_blob_is_the_signing_fields_plus_signature() {
        let wallet = Wallet::generate();
        let prepared = trust_set_for(&wallet);
        let signed = LocalSigner::new().sign_blocking(&prepared, &wallet).unwrap();

        let keypair = Keypair::from_seed(wallet.seed()).unwrap();
        let mut body = prepared.signing_fields(keypair.public_key()).unwrap();
        let signing_blob = codec::serialize(&codec::SIGNING_PREFIX, body.clone());
        body.push(Field::blob(fields::TXN_SIGNATURE, &keypair.sign(&signing_blob)));
        let expected = codec::serialize(&[], body);

        assert_eq!(signed.tx_blob, hex::encode_upper(&expected));
        assert_eq!(
            signed.hash.as_str(),
            hex::encode_upper(sha512_half(&[&b"TXN\0"[..], &expected[..]]))
        );
        assert_eq!(signed.last_ledger_sequence, 120);
    }

    #[test]
    fn signing_is_deterministic() {
        let wallet = Wallet::generate();
        let prepared = trust_set_for(&wallet);
        let signer = LocalSigner::new();
        let first = signer.sign_blocking(&prepared, &wallet).unwrap();
        let second = signer.sign_blocking(&prepared, &wallet).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn seed_must_derive_the_wallet_address() {
        let wallet = Wallet::generate();
        let other = Wallet::generate();
        let mismatched = Wallet::new(wallet.address().clone(), other.seed());
        let prepared = trust_set_for(&wallet);

        assert!(matches!(
            LocalSigner::new().sign_blocking(&prepared, &mismatched),
            Err(TransactionError::SignerMismatch { .. })
        ));
        assert!(matches!(
            LocalSigner::new().sign_blocking(&prepared, &other),
            Err(TransactionError::SignerMismatch { .. })
        ));
    }
}
