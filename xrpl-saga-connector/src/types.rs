//! Validated primitive values shared by transactions and RPC responses.

use crate::{codec, error::TransactionError};
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// The base58 alphabet used by ledger addresses.
const ADDRESS_ALPHABET: &str = "rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

/// Upper bound on the XRP supply, in drops.
const MAX_DROPS: u64 = 100_000_000_000_000_000;

/// A classic account address (`r...`).
///
/// Only the shape is checked here: prefix, length and alphabet. The checksum
/// is verified when the address is encoded into a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(value: &str) -> Result<Self, TransactionError> {
        let valid = value.starts_with('r')
            && (25..=35).contains(&value.len())
            && value.chars().all(|c| ADDRESS_ALPHABET.contains(c));
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(TransactionError::InvalidAddress(value.to_string()))
        }
    }

    /// Wraps an address freshly encoded from an account ID.
    pub(crate) fn from_encoded(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TransactionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-XRP currency code: either three ASCII characters or 40 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(value: &str) -> Result<Self, TransactionError> {
        let standard = value.len() == 3
            && value != "XRP"
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "?!@#$%^&*<>(){}[]|".contains(c));
        let nonstandard = value.len() == 40
            && value.chars().all(|c| c.is_ascii_hexdigit())
            && !value.chars().all(|c| c == '0');
        if standard {
            Ok(Self(value.to_string()))
        } else if nonstandard {
            Ok(Self(value.to_ascii_uppercase()))
        } else {
            Err(TransactionError::InvalidCurrency(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of XRP in drops. Serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Drops(u64);

impl Drops {
    pub fn new(drops: u64) -> Result<Self, TransactionError> {
        if drops == 0 || drops > MAX_DROPS {
            return Err(TransactionError::InvalidAmount(drops.to_string()));
        }
        Ok(Self(drops))
    }

    /// A fee value; unlike amounts, not required to be positive.
    pub(crate) fn fee(drops: u64) -> Self {
        Self(drops)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Serialize for Drops {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl fmt::Display for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount of an issued (non-XRP) currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IssuedAmount {
    currency: CurrencyCode,
    issuer: Address,
    value: String,
}

impl IssuedAmount {
    /// An amount to deliver; the value must be strictly positive.
    pub fn new(
        currency: CurrencyCode,
        issuer: Address,
        value: impl Into<String>,
    ) -> Result<Self, TransactionError> {
        Self::checked(currency, issuer, value.into(), false)
    }

    /// A trust line limit. Zero is allowed and removes the line's limit.
    pub fn limit(
        currency: CurrencyCode,
        issuer: Address,
        value: impl Into<String>,
    ) -> Result<Self, TransactionError> {
        Self::checked(currency, issuer, value.into(), true)
    }

    fn checked(
        currency: CurrencyCode,
        issuer: Address,
        value: String,
        allow_zero: bool,
    ) -> Result<Self, TransactionError> {
        let accepted = match codec::issued_value_bits(&value) {
            Some(bits) => allow_zero || bits != codec::ZERO_ISSUED_VALUE,
            None => false,
        };
        if !accepted {
            return Err(TransactionError::InvalidAmount(value));
        }
        Ok(Self {
            currency,
            issuer,
            value,
        })
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn issuer(&self) -> &Address {
        &self.issuer
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Either XRP or an issued currency amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Amount {
    Xrp(Drops),
    Issued(IssuedAmount),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Xrp(drops) => write!(f, "{drops} drops"),
            Amount::Issued(amount) => {
                write!(f, "{} {}.{}", amount.value, amount.currency, amount.issuer)
            }
        }
    }
}

/// An account domain, stored as the uppercase hex the ledger expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Domain(String);

impl Domain {
    const MAX_BYTES: usize = 256;

    pub fn from_ascii(domain: &str) -> Result<Self, TransactionError> {
        if domain.is_empty() || !domain.is_ascii() {
            return Err(TransactionError::InvalidDomain(domain.to_string()));
        }
        Self::from_bytes(domain.as_bytes())
    }

    pub fn from_hex(encoded: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(encoded)
            .map_err(|e| TransactionError::InvalidDomain(format!("{encoded}: {e}")))?;
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        if bytes.len() > Self::MAX_BYTES {
            return Err(TransactionError::InvalidDomain(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                Self::MAX_BYTES
            )));
        }
        Ok(Self(hex::encode_upper(bytes)))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

/// A transaction identifying hash, uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
