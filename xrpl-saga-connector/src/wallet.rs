//! Wallets and the faucet that provisions them.

use crate::{
    client::WalletProvider,
    error::{ConnectorError, TransactionError},
    keys::Keypair,
    types::Address,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{fmt, time::Duration};
use zeroize::Zeroizing;

/// An account address together with the seed its signing key derives from.
///
/// The seed is wiped from memory when the wallet is dropped and never shows up
/// in `Debug` output.
#[derive(Clone)]
pub struct Wallet {
    address: Address,
    seed: Zeroizing<String>,
}

impl Wallet {
    pub fn new(address: Address, seed: impl Into<String>) -> Self {
        Self {
            address,
            seed: Zeroizing::new(seed.into()),
        }
    }

    /// Creates a wallet with a fresh random Ed25519 key.
    pub fn generate() -> Self {
        let (keypair, seed) = Keypair::generate();
        Self {
            address: keypair.address(),
            seed,
        }
    }

    /// Restores a wallet from an `sEd...` seed, deriving its address.
    pub fn from_seed(seed: &str) -> Result<Self, TransactionError> {
        let keypair = Keypair::from_seed(seed)?;
        Ok(Self {
            address: keypair.address(),
            seed: Zeroizing::new(seed.to_string()),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub(crate) fn seed(&self) -> &str {
        &self.seed
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("seed", &"<redacted>")
            .finish()
    }
}

/// A wallet freshly funded by a faucet.
#[derive(Debug, Clone)]
pub struct FundedWallet {
    pub wallet: Wallet,
    /// Balance reported by the faucet, in XRP.
    pub balance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FaucetResponse {
    account: FaucetAccount,
    #[serde(default)]
    balance: Option<f64>,
    #[serde(default)]
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaucetAccount {
    #[serde(default)]
    classic_address: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

/// Provisions funded wallets from a test network faucet.
///
/// The key is generated locally and only the address is sent to the faucet,
/// so the seed never leaves the process.
#[derive(Debug, Clone)]
pub struct FaucetClient {
    http: reqwest::Client,
    base_url: String,
}

impl FaucetClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConnectorError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WalletProvider for FaucetClient {
    async fn fund_wallet(&self) -> Result<FundedWallet, ConnectorError> {
        let wallet = Wallet::generate();
        let url = format!("{}/accounts", self.base_url);
        tracing::debug!(address = %wallet.address(), "Requesting funding from {}", url);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "destination": wallet.address() }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Faucet(format!("{status}: {body}")));
        }

        let body: FaucetResponse = response
            .json()
            .await
            .map_err(|e| ConnectorError::Faucet(format!("unexpected response: {e}")))?;

        let funded = body
            .account
            .classic_address
            .or(body.account.address)
            .ok_or_else(|| ConnectorError::Faucet("response has no account address".into()))?;
        if funded != wallet.address().as_str() {
            return Err(ConnectorError::Faucet(format!(
                "funded {funded} instead of {}",
                wallet.address()
            )));
        }

        tracing::info!(address = %wallet.address(), "Faucet funded a new wallet");
        Ok(FundedWallet {
            wallet,
            balance: body.balance.or(body.amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_the_seed() {
        let wallet = Wallet::new(
            Address::parse("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY").unwrap(),
            "sEdSecretSeedValue",
        );
        let rendered = format!("{wallet:?}");
        assert!(rendered.contains("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY"));
        assert!(!rendered.contains("sEdSecretSeedValue"));
    }

    #[test]
    fn generated_wallet_restores_from_its_seed() {
        let wallet = Wallet::generate();
        let restored = Wallet::from_seed(wallet.seed()).unwrap();
        assert_eq!(restored.address(), wallet.address());
        assert!(!format!("{wallet:?}").contains(wallet.seed()));
    }

    #[test]
    fn from_seed_rejects_garbage() {
        assert!(matches!(
            Wallet::from_seed("sHotSeed"),
            Err(TransactionError::InvalidSeed(_))
        ));
    }
}
