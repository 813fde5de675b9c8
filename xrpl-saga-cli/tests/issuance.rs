use serde_json::json;
use xrpl_saga_cli::issuance::{issuance_steps, IssueParams};
use xrpl_saga_connector::{
    transaction::TransactionKind, types::Address, wallet::Wallet, TransactionError,
};

const COLD: &str = "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY";
const HOT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

fn wallets() -> (Wallet, Wallet) {
    (
        Wallet::new(Address::parse(COLD).unwrap(), "sColdSeed"),
        Wallet::new(Address::parse(HOT).unwrap(), "sHotSeed"),
    )
}

#[test]
fn steps_run_cold_hot_trust_then_payment() -> anyhow::Result<()> {
    let (cold, hot) = wallets();
    let steps = issuance_steps(&cold, &hot, &IssueParams::default())?;

    let plan: Vec<_> = steps
        .iter()
        .map(|step| (step.transaction().kind(), step.wallet().address().as_str()))
        .collect();
    assert_eq!(
        plan,
        vec![
            (TransactionKind::AccountSet, COLD),
            (TransactionKind::AccountSet, HOT),
            (TransactionKind::TrustSet, HOT),
            (TransactionKind::Payment, COLD),
        ]
    );
    Ok(())
}

#[test]
fn account_settings_match_the_demo() -> anyhow::Result<()> {
    let (cold, hot) = wallets();
    let steps = issuance_steps(&cold, &hot, &IssueParams::default())?;
    let domain = "7872706C746573742E636F6D";
    let flags = 0x0011_0000;

    assert_eq!(
        serde_json::to_value(steps[0].transaction())?,
        json!({
            "TransactionType": "AccountSet",
            "Account": COLD,
            "SetFlag": 8,
            "Domain": domain,
            "TransferRate": 0,
            "TickSize": 5,
            "Flags": flags,
        })
    );
    assert_eq!(
        serde_json::to_value(steps[1].transaction())?,
        json!({
            "TransactionType": "AccountSet",
            "Account": HOT,
            "SetFlag": 2,
            "Domain": domain,
            "Flags": flags,
        })
    );
    Ok(())
}

#[test]
fn trust_line_and_payment_use_the_issuer_currency() -> anyhow::Result<()> {
    let (cold, hot) = wallets();
    let steps = issuance_steps(&cold, &hot, &IssueParams::default())?;

    let trust = serde_json::to_value(steps[2].transaction())?;
    assert_eq!(
        trust["LimitAmount"],
        json!({ "currency": "TST", "issuer": COLD, "value": "10000000000" })
    );

    let payment = serde_json::to_value(steps[3].transaction())?;
    assert_eq!(payment["Destination"], HOT);
    assert_eq!(payment["DestinationTag"], 1);
    assert_eq!(
        payment["Amount"],
        json!({ "currency": "TST", "issuer": COLD, "value": "10000" })
    );
    Ok(())
}

#[test]
fn invalid_parameters_are_rejected_before_submission() {
    let (cold, hot) = wallets();

    let xrp = IssueParams {
        currency: "XRP".into(),
        ..IssueParams::default()
    };
    assert!(matches!(
        issuance_steps(&cold, &hot, &xrp),
        Err(TransactionError::InvalidCurrency(_))
    ));

    let zero = IssueParams {
        amount: "0".into(),
        ..IssueParams::default()
    };
    assert!(matches!(
        issuance_steps(&cold, &hot, &zero),
        Err(TransactionError::InvalidAmount(_))
    ));
}

#[test]
fn zero_trust_limit_is_allowed() -> anyhow::Result<()> {
    let (cold, hot) = wallets();
    let params = IssueParams {
        limit: "0".into(),
        ..IssueParams::default()
    };
    let steps = issuance_steps(&cold, &hot, &params)?;

    let trust = serde_json::to_value(steps[2].transaction())?;
    assert_eq!(trust["LimitAmount"]["value"], "0");
    Ok(())
}
