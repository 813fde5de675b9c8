use crate::issuance::IssueParams;
use clap::{Args, Parser, Subcommand};

/// Demonstrations of an XRP Ledger client.
#[derive(Parser, Debug)]
#[command(name = "xrpl-saga", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration TOML file.
    /// If not provided, default values (the public test network) are used.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fund a test wallet, show its account info and follow ledger closes.
    Account(AccountCmd),
    /// Issue a token from a freshly funded cold wallet to a hot wallet.
    Issue(IssueCmd),
}

/// Arguments for the `account` subcommand.
#[derive(Args, Debug)]
pub struct AccountCmd {
    /// Number of ledger-close events to print before unsubscribing.
    #[arg(long, default_value_t = 3)]
    pub ledgers: usize,
}

/// Arguments for the `issue` subcommand.
#[derive(Args, Debug)]
pub struct IssueCmd {
    /// Currency code of the issued token.
    #[arg(long, default_value = "TST")]
    pub currency: String,
    /// Amount the cold wallet sends to the hot wallet.
    #[arg(long, default_value = "10000")]
    pub amount: String,
    /// Trust line limit the hot wallet grants the issuer.
    #[arg(long, default_value = "10000000000")]
    pub limit: String,
    #[arg(long, default_value_t = 1)]
    pub destination_tag: u32,
    /// Domain recorded on both accounts.
    #[arg(long, default_value = "xrpltest.com")]
    pub domain: String,
}

impl From<IssueCmd> for IssueParams {
    fn from(cmd: IssueCmd) -> Self {
        Self {
            currency: cmd.currency,
            amount: cmd.amount,
            limit: cmd.limit,
            destination_tag: cmd.destination_tag,
            domain: cmd.domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_defaults_match_the_demo() {
        let cli = Cli::try_parse_from(["xrpl-saga", "issue"]).unwrap();
        let Commands::Issue(cmd) = cli.command else {
            panic!("expected the issue command");
        };
        assert_eq!(IssueParams::from(cmd), IssueParams::default());
    }

    #[test]
    fn config_flag_is_accepted_after_the_subcommand() {
        let args = ["xrpl-saga", "account", "--ledgers", "5", "--config", "demo.toml"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config.as_deref(), Some("demo.toml"));
        assert!(matches!(cli.command, Commands::Account(AccountCmd { ledgers: 5 })));
    }
}
