//! Typed ledger transactions.
//!
//! Each transaction kind carries only the fields valid for it and is checked
//! when built, so a value of [`Transaction`] is always complete enough to be
//! autofilled and signed. Serialization produces the JSON field names the node
//! expects (`TransactionType`, `Account`, `LimitAmount`, ...).

use crate::{
    codec::{fields, Field},
    error::{ConnectorError, TransactionError},
    types::{Address, Amount, Domain, Drops, IssuedAmount, TxHash},
};
use serde::{Serialize, Serializer};
use std::{fmt, ops::BitOr};

/// `asf*` account settings toggled by `SetFlag` / `ClearFlag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountSetFlag {
    RequireDest = 1,
    RequireAuth = 2,
    DisallowXrp = 3,
    DisableMaster = 4,
    AccountTxnId = 5,
    NoFreeze = 6,
    GlobalFreeze = 7,
    DefaultRipple = 8,
    DepositAuth = 9,
}

impl Serialize for AccountSetFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(*self as u32)
    }
}

macro_rules! tx_flags {
    ($(#[$meta:meta])* $name:ident { $($flag:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            $(pub const $flag: Self = Self($value);)*

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn bits(self) -> u32 {
                self.0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

tx_flags!(
    /// `tf*` flags accepted by `AccountSet`.
    AccountSetTxFlags {
        REQUIRE_DEST_TAG = 0x0001_0000,
        OPTIONAL_DEST_TAG = 0x0002_0000,
        REQUIRE_AUTH = 0x0004_0000,
        OPTIONAL_AUTH = 0x0008_0000,
        DISALLOW_XRP = 0x0010_0000,
        ALLOW_XRP = 0x0020_0000,
    }
);

tx_flags!(
    /// `tf*` flags accepted by `TrustSet`.
    TrustSetFlags {
        SET_AUTH = 0x0001_0000,
        SET_NO_RIPPLE = 0x0002_0000,
        CLEAR_NO_RIPPLE = 0x0004_0000,
        SET_FREEZE = 0x0010_0000,
        CLEAR_FREEZE = 0x0020_0000,
    }
);

tx_flags!(
    /// `tf*` flags accepted by `Payment`.
    PaymentFlags {
        NO_RIPPLE_DIRECT = 0x0001_0000,
        PARTIAL_PAYMENT = 0x0002_0000,
        LIMIT_QUALITY = 0x0004_0000,
    }
);

fn check_exclusive<F: Copy + PartialEq>(
    flags: F,
    pairs: &[(F, F, &'static str)],
    contains: impl Fn(F, F) -> bool,
) -> Result<(), TransactionError> {
    for (a, b, name) in pairs {
        if contains(flags, *a) && contains(flags, *b) {
            return Err(TransactionError::ConflictingFlags(*name));
        }
    }
    Ok(())
}

/// Modifies the properties of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountSet {
    account: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    set_flag: Option<AccountSetFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clear_flag: Option<AccountSetFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transfer_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick_size: Option<u8>,
    #[serde(skip_serializing_if = "AccountSetTxFlags::is_empty")]
    flags: AccountSetTxFlags,
}

impl AccountSet {
    pub fn builder(account: Address) -> AccountSetBuilder {
        AccountSetBuilder {
            inner: AccountSet {
                account,
                set_flag: None,
                clear_flag: None,
                domain: None,
                transfer_rate: None,
                tick_size: None,
                flags: AccountSetTxFlags::empty(),
            },
        }
    }

    pub fn set_flag(&self) -> Option<AccountSetFlag> {
        self.set_flag
    }

    pub fn flags(&self) -> AccountSetTxFlags {
        self.flags
    }
}

#[derive(Debug, Clone)]
pub struct AccountSetBuilder {
    inner: AccountSet,
}

impl AccountSetBuilder {
    pub fn set_flag(mut self, flag: AccountSetFlag) -> Self {
        self.inner.set_flag = Some(flag);
        self
    }

    pub fn clear_flag(mut self, flag: AccountSetFlag) -> Self {
        self.inner.clear_flag = Some(flag);
        self
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.inner.domain = Some(domain);
        self
    }

    /// `0` removes the transfer fee.
    pub fn transfer_rate(mut self, rate: u32) -> Self {
        self.inner.transfer_rate = Some(rate);
        self
    }

    /// `0` removes the tick size.
    pub fn tick_size(mut self, size: u8) -> Self {
        self.inner.tick_size = Some(size);
        self
    }

    pub fn flags(mut self, flags: AccountSetTxFlags) -> Self {
        self.inner.flags = flags;
        self
    }

    pub fn build(self) -> Result<AccountSet, TransactionError> {
        let tx = self.inner;
        if let (Some(set), Some(clear)) = (tx.set_flag, tx.clear_flag) {
            if set == clear {
                return Err(TransactionError::ConflictingFlags("SetFlag equals ClearFlag"));
            }
        }
        if let Some(rate) = tx.transfer_rate {
            if rate != 0 && !(1_000_000_000..=2_000_000_000).contains(&rate) {
                return Err(TransactionError::InvalidTransferRate(rate));
            }
        }
        if let Some(size) = tx.tick_size {
            if size != 0 && !(3..=15).contains(&size) {
                return Err(TransactionError::InvalidTickSize(size));
            }
        }
        check_exclusive(
            tx.flags,
            &[
                (
                    AccountSetTxFlags::REQUIRE_DEST_TAG,
                    AccountSetTxFlags::OPTIONAL_DEST_TAG,
                    "RequireDestTag and OptionalDestTag",
                ),
                (
                    AccountSetTxFlags::REQUIRE_AUTH,
                    AccountSetTxFlags::OPTIONAL_AUTH,
                    "RequireAuth and OptionalAuth",
                ),
                (
                    AccountSetTxFlags::DISALLOW_XRP,
                    AccountSetTxFlags::ALLOW_XRP,
                    "DisallowXRP and AllowXRP",
                ),
            ],
            AccountSetTxFlags::contains,
        )?;
        Ok(tx)
    }
}

/// Creates or modifies a trust line to an issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrustSet {
    account: Address,
    limit_amount: IssuedAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality_in: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality_out: Option<u32>,
    #[serde(skip_serializing_if = "TrustSetFlags::is_empty")]
    flags: TrustSetFlags,
}

impl TrustSet {
    pub fn builder(account: Address, limit_amount: IssuedAmount) -> TrustSetBuilder {
        TrustSetBuilder {
            inner: TrustSet {
                account,
                limit_amount,
                quality_in: None,
                quality_out: None,
                flags: TrustSetFlags::empty(),
            },
        }
    }

    pub fn limit_amount(&self) -> &IssuedAmount {
        &self.limit_amount
    }
}

#[derive(Debug, Clone)]
pub struct TrustSetBuilder {
    inner: TrustSet,
}

impl TrustSetBuilder {
    pub fn quality_in(mut self, quality: u32) -> Self {
        self.inner.quality_in = Some(quality);
        self
    }

    pub fn quality_out(mut self, quality: u32) -> Self {
        self.inner.quality_out = Some(quality);
        self
    }

    pub fn flags(mut self, flags: TrustSetFlags) -> Self {
        self.inner.flags = flags;
        self
    }

    pub fn build(self) -> Result<TrustSet, TransactionError> {
        let tx = self.inner;
        if tx.limit_amount.issuer() == &tx.account {
            return Err(TransactionError::SelfReference {
                field: "LimitAmount issuer",
                account: tx.account.to_string(),
            });
        }
        check_exclusive(
            tx.flags,
            &[
                (
                    TrustSetFlags::SET_NO_RIPPLE,
                    TrustSetFlags::CLEAR_NO_RIPPLE,
                    "SetNoRipple and ClearNoRipple",
                ),
                (
                    TrustSetFlags::SET_FREEZE,
                    TrustSetFlags::CLEAR_FREEZE,
                    "SetFreeze and ClearFreeze",
                ),
            ],
            TrustSetFlags::contains,
        )?;
        Ok(tx)
    }
}

/// Transfers value from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    account: Address,
    destination: Address,
    amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_tag: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    send_max: Option<Amount>,
    #[serde(skip_serializing_if = "PaymentFlags::is_empty")]
    flags: PaymentFlags,
}

impl Payment {
    pub fn builder(account: Address, destination: Address, amount: Amount) -> PaymentBuilder {
        PaymentBuilder {
            inner: Payment {
                account,
                destination,
                amount,
                destination_tag: None,
                send_max: None,
                flags: PaymentFlags::empty(),
            },
        }
    }

    pub fn destination(&self) -> &Address {
        &self.destination
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }
}

#[derive(Debug, Clone)]
pub struct PaymentBuilder {
    inner: Payment,
}

impl PaymentBuilder {
    pub fn destination_tag(mut self, tag: u32) -> Self {
        self.inner.destination_tag = Some(tag);
        self
    }

    pub fn send_max(mut self, amount: Amount) -> Self {
        self.inner.send_max = Some(amount);
        self
    }

    pub fn flags(mut self, flags: PaymentFlags) -> Self {
        self.inner.flags = flags;
        self
    }

    pub fn build(self) -> Result<Payment, TransactionError> {
        let tx = self.inner;
        if tx.destination == tx.account {
            return Err(TransactionError::SelfReference {
                field: "Destination",
                account: tx.account.to_string(),
            });
        }
        Ok(tx)
    }
}

/// The kinds of transaction this crate can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    AccountSet,
    TrustSet,
    Payment,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionKind::AccountSet => "AccountSet",
            TransactionKind::TrustSet => "TrustSet",
            TransactionKind::Payment => "Payment",
        })
    }
}

/// A validated transaction template, before autofill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "TransactionType")]
pub enum Transaction {
    AccountSet(AccountSet),
    TrustSet(TrustSet),
    Payment(Payment),
}

impl Transaction {
    /// The account that sends, and therefore signs, this transaction.
    pub fn account(&self) -> &Address {
        match self {
            Transaction::AccountSet(tx) => &tx.account,
            Transaction::TrustSet(tx) => &tx.account,
            Transaction::Payment(tx) => &tx.account,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::AccountSet(_) => TransactionKind::AccountSet,
            Transaction::TrustSet(_) => TransactionKind::TrustSet,
            Transaction::Payment(_) => TransactionKind::Payment,
        }
    }

    fn type_code(&self) -> u16 {
        match self {
            Transaction::Payment(_) => 0,
            Transaction::AccountSet(_) => 3,
            Transaction::TrustSet(_) => 20,
        }
    }

    /// Binary fields of the template, without the autofilled ones.
    fn binary_fields(&self) -> Result<Vec<Field>, TransactionError> {
        let mut out = vec![
            Field::uint16(fields::TRANSACTION_TYPE, self.type_code()),
            Field::account(fields::ACCOUNT, self.account())?,
        ];
        match self {
            Transaction::AccountSet(tx) => {
                if let Some(flag) = tx.set_flag {
                    out.push(Field::uint32(fields::SET_FLAG, flag as u32));
                }
                if let Some(flag) = tx.clear_flag {
                    out.push(Field::uint32(fields::CLEAR_FLAG, flag as u32));
                }
                if let Some(domain) = &tx.domain {
                    let bytes = hex::decode(domain.as_hex())
                        .map_err(|e| TransactionError::InvalidDomain(e.to_string()))?;
                    out.push(Field::blob(fields::DOMAIN, &bytes));
                }
                if let Some(rate) = tx.transfer_rate {
                    out.push(Field::uint32(fields::TRANSFER_RATE, rate));
                }
                if let Some(size) = tx.tick_size {
                    out.push(Field::uint8(fields::TICK_SIZE, size));
                }
                if !tx.flags.is_empty() {
                    out.push(Field::uint32(fields::FLAGS, tx.flags.bits()));
                }
            }
            Transaction::TrustSet(tx) => {
                out.push(Field::issued(fields::LIMIT_AMOUNT, &tx.limit_amount)?);
                if let Some(quality) = tx.quality_in {
                    out.push(Field::uint32(fields::QUALITY_IN, quality));
                }
                if let Some(quality) = tx.quality_out {
                    out.push(Field::uint32(fields::QUALITY_OUT, quality));
                }
                if !tx.flags.is_empty() {
                    out.push(Field::uint32(fields::FLAGS, tx.flags.bits()));
                }
            }
            Transaction::Payment(tx) => {
                out.push(Field::account(fields::DESTINATION, &tx.destination)?);
                out.push(Field::amount(fields::AMOUNT, &tx.amount)?);
                if let Some(tag) = tx.destination_tag {
                    out.push(Field::uint32(fields::DESTINATION_TAG, tag));
                }
                if let Some(send_max) = &tx.send_max {
                    out.push(Field::amount(fields::SEND_MAX, send_max)?);
                }
                if !tx.flags.is_empty() {
                    out.push(Field::uint32(fields::FLAGS, tx.flags.bits()));
                }
            }
        }
        Ok(out)
    }
}

impl From<AccountSet> for Transaction {
    fn from(tx: AccountSet) -> Self {
        Transaction::AccountSet(tx)
    }
}

impl From<TrustSet> for Transaction {
    fn from(tx: TrustSet) -> Self {
        Transaction::TrustSet(tx)
    }
}

impl From<Payment> for Transaction {
    fn from(tx: Payment) -> Self {
        Transaction::Payment(tx)
    }
}

/// A transaction with the protocol fields filled in by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub transaction: Transaction,
    pub sequence: u32,
    pub fee: Drops,
    pub last_ledger_sequence: u32,
}

impl PreparedTransaction {
    pub fn new(
        transaction: Transaction,
        sequence: u32,
        fee_drops: u64,
        last_ledger_sequence: u32,
    ) -> Self {
        Self {
            transaction,
            sequence,
            fee: Drops::fee(fee_drops),
            last_ledger_sequence,
        }
    }

    /// Renders the complete `tx_json` object accepted by the node.
    pub fn to_tx_json(&self) -> Result<serde_json::Value, ConnectorError> {
        let mut value = serde_json::to_value(&self.transaction)?;
        let object = value.as_object_mut().ok_or_else(|| {
            ConnectorError::MalformedResponse("transaction did not serialize to an object".into())
        })?;
        object.insert("Sequence".into(), self.sequence.into());
        object.insert("Fee".into(), self.fee.to_string().into());
        object.insert("LastLedgerSequence".into(), self.last_ledger_sequence.into());
        Ok(value)
    }

    /// Binary fields covered by the signature of the key `public_key`.
    pub(crate) fn signing_fields(&self, public_key: &[u8]) -> Result<Vec<Field>, TransactionError> {
        let mut out = self.transaction.binary_fields()?;
        out.push(Field::uint32(fields::SEQUENCE, self.sequence));
        out.push(Field::drops(fields::FEE, self.fee));
        out.push(Field::uint32(fields::LAST_LEDGER_SEQUENCE, self.last_ledger_sequence));
        out.push(Field::blob(fields::SIGNING_PUB_KEY, public_key));
        Ok(out)
    }
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_blob: String,
    pub hash: TxHash,
    /// Copied from the prepared transaction so the submitter knows when to give up.
    pub last_ledger_sequence: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec, types::CurrencyCode};
    use serde_json::json;

    const COLD: &str = "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY";
    const HOT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn tst(value: &str) -> IssuedAmount {
        IssuedAmount::new(CurrencyCode::parse("TST").unwrap(), addr(COLD), value).unwrap()
    }

    #[test]
    fn cold_account_set_serializes_like_the_ledger_expects() {
        let tx: Transaction = AccountSet::builder(addr(COLD))
            .transfer_rate(0)
            .tick_size(5)
            .domain(Domain::from_ascii("xrpltest.com").unwrap())
            .set_flag(AccountSetFlag::DefaultRipple)
            .flags(AccountSetTxFlags::DISALLOW_XRP | AccountSetTxFlags::REQUIRE_DEST_TAG)
            .build()
            .unwrap()
            .into();

        assert_eq!(
            serde_json::to_value(&tx).unwrap(),
            json!({
                "TransactionType": "AccountSet",
                "Account": COLD,
                "TransferRate": 0,
                "TickSize": 5,
                "Domain": "7872706C746573742E636F6D",
                "SetFlag": 8,
                "Flags": 0x0011_0000u32,
            })
        );
        assert_eq!(tx.kind(), TransactionKind::AccountSet);
        assert_eq!(tx.account().as_str(), COLD);
    }

    #[test]
    fn account_set_rejects_out_of_range_values() {
        assert_eq!(
            AccountSet::builder(addr(COLD)).tick_size(2).build(),
            Err(TransactionError::InvalidTickSize(2))
        );
        assert_eq!(
            AccountSet::builder(addr(COLD)).transfer_rate(999_999_999).build(),
            Err(TransactionError::InvalidTransferRate(999_999_999))
        );
        assert!(AccountSet::builder(addr(COLD))
            .set_flag(AccountSetFlag::RequireAuth)
            .clear_flag(AccountSetFlag::RequireAuth)
            .build()
            .is_err());
        assert!(AccountSet::builder(addr(COLD))
            .flags(AccountSetTxFlags::DISALLOW_XRP | AccountSetTxFlags::ALLOW_XRP)
            .build()
            .is_err());
    }

    #[test]
    fn trust_set_serializes_limit_amount() {
        let tx: Transaction = TrustSet::builder(addr(HOT), tst("10000000000"))
            .build()
            .unwrap()
            .into();
        assert_eq!(
            serde_json::to_value(&tx).unwrap(),
            json!({
                "TransactionType": "TrustSet",
                "Account": HOT,
                "LimitAmount": { "currency": "TST", "issuer": COLD, "value": "10000000000" },
            })
        );
    }

    #[test]
    fn trust_set_rejects_self_issued_limit_and_conflicts() {
        assert!(matches!(
            TrustSet::builder(addr(COLD), tst("1")).build(),
            Err(TransactionError::SelfReference { .. })
        ));
        assert!(TrustSet::builder(addr(HOT), tst("1"))
            .flags(TrustSetFlags::SET_FREEZE | TrustSetFlags::CLEAR_FREEZE)
            .build()
            .is_err());
    }

    #[test]
    fn payment_serializes_destination_tag() {
        let tx: Transaction = Payment::builder(addr(COLD), addr(HOT), Amount::Issued(tst("10000")))
            .destination_tag(1)
            .build()
            .unwrap()
            .into();
        assert_eq!(
            serde_json::to_value(&tx).unwrap(),
            json!({
                "TransactionType": "Payment",
                "Account": COLD,
                "Destination": HOT,
                "Amount": { "currency": "TST", "issuer": COLD, "value": "10000" },
                "DestinationTag": 1,
            })
        );
    }

    #[test]
    fn payment_to_self_is_rejected() {
        let amount = Amount::Xrp(Drops::new(10).unwrap());
        assert!(Payment::builder(addr(COLD), addr(COLD), amount).build().is_err());
    }

    #[test]
    fn prepared_transaction_adds_protocol_fields() {
        let tx: Transaction = TrustSet::builder(addr(HOT), tst("5")).build().unwrap().into();
        let prepared = PreparedTransaction::new(tx, 7, 12, 120);
        let json = prepared.to_tx_json().unwrap();
        assert_eq!(json["Sequence"], json!(7));
        assert_eq!(json["Fee"], json!("12"));
        assert_eq!(json["LastLedgerSequence"], json!(120));
        assert_eq!(json["TransactionType"], json!("TrustSet"));
    }

    fn encoded(prepared: &PreparedTransaction) -> String {
        let body = prepared.signing_fields(&[0xED; 33]).unwrap();
        hex::encode_upper(codec::serialize(&[], body))
    }

    #[test]
    fn signing_fields_carry_the_autofilled_values() {
        let tx: Transaction = TrustSet::builder(addr(HOT), tst("5")).build().unwrap().into();
        let blob = encoded(&PreparedTransaction::new(tx, 7, 12, 120));
        assert!(blob.starts_with("120014"));
        assert!(blob.contains("2400000007"));
        assert!(blob.contains("201B00000078"));
        assert!(blob.contains("68400000000000000C"));
        assert!(blob.contains(&format!("7321{}", "ED".repeat(33))));
    }

    #[test]
    fn zero_trust_limit_is_encodable() {
        let tst = CurrencyCode::parse("TST").unwrap();
        let limit = IssuedAmount::limit(tst, addr(COLD), "0").unwrap();
        let tx: Transaction = TrustSet::builder(addr(HOT), limit).build().unwrap().into();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["LimitAmount"]["value"], json!("0"));

        let blob = encoded(&PreparedTransaction::new(tx, 1, 10, 20));
        assert!(blob.contains("638000000000000000"));
    }

    #[test]
    fn account_set_fields_use_their_binary_types() {
        let tx: Transaction = AccountSet::builder(addr(COLD))
            .tick_size(5)
            .set_flag(AccountSetFlag::DefaultRipple)
            .build()
            .unwrap()
            .into();
        let blob = encoded(&PreparedTransaction::new(tx, 1, 10, 20));
        assert!(blob.starts_with("120003"));
        assert!(blob.contains("202100000008"));
        assert!(blob.ends_with("00101005"));
    }
}
