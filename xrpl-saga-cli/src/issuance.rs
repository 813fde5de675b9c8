//! The four-step token issuance workflow.

use xrpl_saga_connector::{
    transaction::{AccountSet, AccountSetFlag, AccountSetTxFlags, Payment, TrustSet},
    types::{Amount, CurrencyCode, Domain, IssuedAmount},
    wallet::Wallet,
    Step, TransactionError,
};

const TICK_SIZE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueParams {
    pub currency: String,
    /// Amount issued to the hot wallet.
    pub amount: String,
    /// Trust line limit.
    pub limit: String,
    pub destination_tag: u32,
    pub domain: String,
}

impl Default for IssueParams {
    fn default() -> Self {
        Self {
            currency: "TST".to_string(),
            amount: "10000".to_string(),
            limit: "10000000000".to_string(),
            destination_tag: 1,
            domain: "xrpltest.com".to_string(),
        }
    }
}

/// Builds AccountSet(cold), AccountSet(hot), TrustSet(hot → cold) and
/// Payment(cold → hot), each paired with the wallet that must sign it.
pub fn issuance_steps<'w>(
    cold: &'w Wallet,
    hot: &'w Wallet,
    params: &IssueParams,
) -> Result<Vec<Step<'w>>, TransactionError> {
    let currency = CurrencyCode::parse(&params.currency)?;
    let domain = Domain::from_ascii(&params.domain)?;
    let flags = AccountSetTxFlags::DISALLOW_XRP | AccountSetTxFlags::REQUIRE_DEST_TAG;

    let cold_settings = AccountSet::builder(cold.address().clone())
        .transfer_rate(0)
        .tick_size(TICK_SIZE)
        .domain(domain.clone())
        .set_flag(AccountSetFlag::DefaultRipple)
        .flags(flags)
        .build()?;

    let hot_settings = AccountSet::builder(hot.address().clone())
        .domain(domain)
        .set_flag(AccountSetFlag::RequireAuth)
        .flags(flags)
        .build()?;

    let limit = IssuedAmount::limit(currency.clone(), cold.address().clone(), &params.limit)?;
    let trust_line = TrustSet::builder(hot.address().clone(), limit).build()?;

    let amount = IssuedAmount::new(currency, cold.address().clone(), &params.amount)?;
    let issue = Payment::builder(
        cold.address().clone(),
        hot.address().clone(),
        Amount::Issued(amount),
    )
    .destination_tag(params.destination_tag)
    .build()?;

    Ok(vec![
        Step::new(cold_settings, cold)?,
        Step::new(hot_settings, hot)?,
        Step::new(trust_line, hot)?,
        Step::new(issue, cold)?,
    ])
}
