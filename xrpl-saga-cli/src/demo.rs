use crate::issuance::{issuance_steps, IssueParams};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use xrpl_saga_connector::{
    client::{TransactionSigner, WalletProvider},
    config::ConnectorConfig,
    rpc::{AccountInfo, LedgerIndex, RpcClient},
    signer::{LocalSigner, NodeSigner},
    types::Address,
    wallet::FaucetClient,
    workers::subscribe_ledgers,
    WorkflowCoordinator, WorkflowError,
};

/// How often to look for a freshly funded account before giving up.
const FUNDING_ATTEMPTS: u32 = 10;

fn faucet(config: &ConnectorConfig) -> Result<FaucetClient> {
    Ok(FaucetClient::new(
        &config.network.faucet_url,
        Duration::from_secs(config.network.request_timeout_secs),
    )?)
}

fn print_json<T: Serialize>(label: &str, value: &T) -> Result<()> {
    println!("{label}:\n{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reads `account_info` at the validated ledger, waiting while the faucet
/// payment is still in flight.
async fn validated_account_info(rpc: &RpcClient, address: &Address) -> Result<AccountInfo> {
    let interval = Duration::from_millis(rpc.config().submission.poll_interval_ms);
    let mut attempt = 1;
    loop {
        match rpc.account_info(address, LedgerIndex::Validated).await {
            Err(e) if e.rpc_error() == Some("actNotFound") && attempt < FUNDING_ATTEMPTS => {
                tracing::debug!(%address, attempt, "Account not validated yet");
                attempt += 1;
                tokio::time::sleep(interval).await;
            }
            result => {
                return result
                    .with_context(|| format!("Failed to read account info for {address}"))
            }
        }
    }
}

/// Funds a wallet, prints its validated account info and the next `ledgers`
/// ledger closes, then unsubscribes.
pub async fn account(config: Arc<ConnectorConfig>, ledgers: usize) -> Result<()> {
    let rpc = Arc::new(RpcClient::new(config.clone())?);
    tracing::info!("Connected to {}", config.network.rpc_url);

    let funded = faucet(&config)?
        .fund_wallet()
        .await
        .context("Failed to fund a test wallet")?;
    println!("Funded wallet {}", funded.wallet.address());

    let info = validated_account_info(&rpc, funded.wallet.address()).await?;
    print_json("Account info", &info)?;

    let (worker, mut listener) = subscribe_ledgers(config.clone(), rpc.clone());
    let worker_handle = tokio::spawn(worker.run());

    for _ in 0..ledgers {
        match listener.next_ledger().await {
            Some(event) => println!("{event}"),
            None => break,
        }
    }

    listener.unsubscribe();
    worker_handle.await.context("Ledger worker panicked")?;
    tracing::info!("Disconnected from {}", config.network.rpc_url);
    Ok(())
}

/// Signs locally unless a dedicated `signing-url` is configured.
fn signer_for(config: &Arc<ConnectorConfig>) -> Result<Arc<dyn TransactionSigner>> {
    match config.network.signing_url() {
        Some(url) => {
            tracing::warn!(%url, "Signing through a node; wallet seeds are sent to it");
            Ok(Arc::new(NodeSigner::new(config.clone())?))
        }
        None => Ok(Arc::new(LocalSigner::new())),
    }
}

/// Funds a cold and a hot wallet, runs the issuance workflow and prints the
/// resulting trust lines and obligations.
pub async fn issue(config: Arc<ConnectorConfig>, params: IssueParams) -> Result<()> {
    let rpc = Arc::new(RpcClient::new(config.clone())?);
    let signer = signer_for(&config)?;
    tracing::info!("Connected to {}", config.network.rpc_url);

    let faucet = faucet(&config)?;
    let (cold, hot) = tokio::try_join!(faucet.fund_wallet(), faucet.fund_wallet())
        .context("Failed to fund the cold and hot wallets")?;
    let (cold, hot) = (cold.wallet, hot.wallet);
    println!("Cold (issuer) wallet: {}", cold.address());
    println!("Hot (operational) wallet: {}", hot.address());

    // Both accounts must exist before the first autofill.
    validated_account_info(&rpc, cold.address()).await?;
    validated_account_info(&rpc, hot.address()).await?;

    let steps = issuance_steps(&cold, &hot, &params).context("Invalid issuance parameters")?;
    let coordinator = WorkflowCoordinator::new(rpc.clone(), signer);

    match coordinator.run(&steps).await {
        Ok(result) => {
            for submission in &result {
                println!(
                    "Step {} {} {}: {}",
                    submission.step,
                    submission.kind,
                    submission.code,
                    config.network.explorer_link(&submission.hash)
                );
            }
        }
        Err(error) => {
            report_abort(&config, &error);
            return Err(error).context("Token issuance aborted");
        }
    }

    let lines = rpc
        .account_lines(hot.address(), LedgerIndex::Validated)
        .await
        .context("Failed to read hot wallet trust lines")?;
    print_json("Hot wallet trust lines", &lines)?;

    let balances = rpc
        .gateway_balances(cold.address(), &[hot.address().clone()], LedgerIndex::Validated)
        .await
        .context("Failed to read issuer balances")?;
    print_json("Issuer balances", &balances)?;
    Ok(())
}

fn report_abort(config: &ConnectorConfig, error: &WorkflowError) {
    for submission in error.completed() {
        println!(
            "Step {} {} confirmed before abort: {}",
            submission.step,
            submission.kind,
            config.network.explorer_link(&submission.hash)
        );
    }
    tracing::error!(state = %error.state(), "Workflow aborted");
}
