//! Canonical binary encoding of transaction fields.
//!
//! Covers exactly the field types used by the transactions in
//! [`transaction`](crate::transaction): UInt8/16/32, Amount, Blob and
//! AccountID. Fields are written in canonical order (type code, then field
//! code), each behind its field-ID header.

use crate::{
    error::TransactionError,
    keys::{self, ACCOUNT_ID_LEN},
    types::{Address, Amount, CurrencyCode, Drops, IssuedAmount},
};

/// Prefix of the data an account signs.
pub(crate) const SIGNING_PREFIX: [u8; 4] = *b"STX\0";
/// Prefix hashed with a signed blob to form the transaction ID.
pub(crate) const TX_ID_PREFIX: [u8; 4] = *b"TXN\0";

const NOT_XRP_BIT: u64 = 0x8000_0000_0000_0000;
/// Encoded form of an issued value of zero.
pub(crate) const ZERO_ISSUED_VALUE: u64 = NOT_XRP_BIT;
const POSITIVE_BIT: u64 = 0x4000_0000_0000_0000;
const MIN_MANTISSA: u64 = 1_000_000_000_000_000;
const MAX_MANTISSA_DIGITS: usize = 16;
const MIN_EXPONENT: i32 = -96;
const MAX_EXPONENT: i32 = 80;
const EXPONENT_BIAS: i32 = 97;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct FieldId {
    type_code: u8,
    field_code: u8,
}

impl FieldId {
    const fn new(type_code: u8, field_code: u8) -> Self {
        Self {
            type_code,
            field_code,
        }
    }

    fn header(self) -> Vec<u8> {
        let (t, f) = (self.type_code, self.field_code);
        match (t < 16, f < 16) {
            (true, true) => vec![(t << 4) | f],
            (true, false) => vec![t << 4, f],
            (false, true) => vec![f, t],
            (false, false) => vec![0, t, f],
        }
    }
}

pub(crate) mod fields {
    use super::FieldId;

    pub(crate) const TRANSACTION_TYPE: FieldId = FieldId::new(1, 2);
    pub(crate) const FLAGS: FieldId = FieldId::new(2, 2);
    pub(crate) const SEQUENCE: FieldId = FieldId::new(2, 4);
    pub(crate) const TRANSFER_RATE: FieldId = FieldId::new(2, 11);
    pub(crate) const DESTINATION_TAG: FieldId = FieldId::new(2, 14);
    pub(crate) const QUALITY_IN: FieldId = FieldId::new(2, 20);
    pub(crate) const QUALITY_OUT: FieldId = FieldId::new(2, 21);
    pub(crate) const LAST_LEDGER_SEQUENCE: FieldId = FieldId::new(2, 27);
    pub(crate) const SET_FLAG: FieldId = FieldId::new(2, 33);
    pub(crate) const CLEAR_FLAG: FieldId = FieldId::new(2, 34);
    pub(crate) const AMOUNT: FieldId = FieldId::new(6, 1);
    pub(crate) const LIMIT_AMOUNT: FieldId = FieldId::new(6, 3);
    pub(crate) const FEE: FieldId = FieldId::new(6, 8);
    pub(crate) const SEND_MAX: FieldId = FieldId::new(6, 9);
    pub(crate) const SIGNING_PUB_KEY: FieldId = FieldId::new(7, 3);
    pub(crate) const TXN_SIGNATURE: FieldId = FieldId::new(7, 4);
    pub(crate) const DOMAIN: FieldId = FieldId::new(7, 7);
    pub(crate) const ACCOUNT: FieldId = FieldId::new(8, 1);
    pub(crate) const DESTINATION: FieldId = FieldId::new(8, 3);
    pub(crate) const TICK_SIZE: FieldId = FieldId::new(16, 16);
}

/// One encoded field, ready to be placed in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Field {
    id: FieldId,
    bytes: Vec<u8>,
}

impl Field {
    pub(crate) fn uint8(id: FieldId, value: u8) -> Self {
        Self { id, bytes: vec![value] }
    }

    pub(crate) fn uint16(id: FieldId, value: u16) -> Self {
        Self {
            id,
            bytes: value.to_be_bytes().to_vec(),
        }
    }

    pub(crate) fn uint32(id: FieldId, value: u32) -> Self {
        Self {
            id,
            bytes: value.to_be_bytes().to_vec(),
        }
    }

    pub(crate) fn drops(id: FieldId, drops: Drops) -> Self {
        Self {
            id,
            bytes: (POSITIVE_BIT | drops.get()).to_be_bytes().to_vec(),
        }
    }

    pub(crate) fn amount(id: FieldId, amount: &Amount) -> Result<Self, TransactionError> {
        match amount {
            Amount::Xrp(drops) => Ok(Self::drops(id, *drops)),
            Amount::Issued(issued) => Self::issued(id, issued),
        }
    }

    pub(crate) fn issued(id: FieldId, amount: &IssuedAmount) -> Result<Self, TransactionError> {
        let bits = issued_value_bits(amount.value())
            .ok_or_else(|| TransactionError::InvalidAmount(amount.value().to_string()))?;
        let mut bytes = Vec::with_capacity(8 + 20 + ACCOUNT_ID_LEN);
        bytes.extend_from_slice(&bits.to_be_bytes());
        bytes.extend_from_slice(&currency_bytes(amount.currency())?);
        bytes.extend_from_slice(&keys::account_id(amount.issuer())?);
        Ok(Self { id, bytes })
    }

    pub(crate) fn blob(id: FieldId, data: &[u8]) -> Self {
        let mut bytes = length_prefix(data.len());
        bytes.extend_from_slice(data);
        Self { id, bytes }
    }

    pub(crate) fn account(id: FieldId, address: &Address) -> Result<Self, TransactionError> {
        Ok(Self::blob(id, &keys::account_id(address)?))
    }
}

/// Writes `prefix` followed by the fields in canonical order.
pub(crate) fn serialize(prefix: &[u8], mut fields: Vec<Field>) -> Vec<u8> {
    fields.sort_by_key(|field| field.id);
    let mut out = prefix.to_vec();
    for field in fields {
        out.extend_from_slice(&field.id.header());
        out.extend_from_slice(&field.bytes);
    }
    out
}

fn length_prefix(len: usize) -> Vec<u8> {
    if len <= 192 {
        vec![len as u8]
    } else if len <= 12_480 {
        let rest = len - 193;
        vec![193 + (rest >> 8) as u8, (rest & 0xff) as u8]
    } else {
        let rest = len - 12_481;
        vec![
            241 + (rest >> 16) as u8,
            ((rest >> 8) & 0xff) as u8,
            (rest & 0xff) as u8,
        ]
    }
}

fn currency_bytes(code: &CurrencyCode) -> Result<[u8; 20], TransactionError> {
    let code = code.as_str();
    let mut out = [0u8; 20];
    if code.len() == 3 {
        out[12..15].copy_from_slice(code.as_bytes());
    } else {
        hex::decode_to_slice(code, &mut out)
            .map_err(|_| TransactionError::InvalidCurrency(code.to_string()))?;
    }
    Ok(out)
}

/// Encodes a non-negative decimal string as the 64-bit issued-value field.
///
/// Returns `None` for negative, malformed or out-of-range values and for
/// values with more than 16 significant digits.
pub(crate) fn issued_value_bits(value: &str) -> Option<u64> {
    let (number, exponent) = match value.split_once(|c| c == 'e' || c == 'E') {
        Some((number, exponent)) => (number, exponent.parse::<i32>().ok()?),
        None => (value, 0),
    };
    let number = number.strip_prefix('+').unwrap_or(number);
    let (int, frac) = number.split_once('.').unwrap_or((number, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    if !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits: String = int.chars().chain(frac.chars()).collect();
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(ZERO_ISSUED_VALUE);
    }
    let significant = digits.trim_end_matches('0');
    if significant.len() > MAX_MANTISSA_DIGITS {
        return None;
    }

    let mut exponent = exponent
        .saturating_sub(i32::try_from(frac.len()).ok()?)
        .saturating_add(i32::try_from(digits.len() - significant.len()).ok()?);
    let mut mantissa: u64 = significant.parse().ok()?;
    while mantissa < MIN_MANTISSA {
        mantissa *= 10;
        exponent = exponent.saturating_sub(1);
    }
    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return None;
    }
    let biased = u64::try_from(exponent + EXPONENT_BIAS).ok()?;
    Some(NOT_XRP_BIT | POSITIVE_BIT | (biased << 54) | mantissa)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(id: FieldId) -> String {
        hex::encode_upper(id.header())
    }

    #[test]
    fn field_headers() {
        assert_eq!(header(fields::TRANSACTION_TYPE), "12");
        assert_eq!(header(fields::SEQUENCE), "24");
        assert_eq!(header(fields::LAST_LEDGER_SEQUENCE), "201B");
        assert_eq!(header(fields::SET_FLAG), "2021");
        assert_eq!(header(fields::FEE), "68");
        assert_eq!(header(fields::SIGNING_PUB_KEY), "73");
        assert_eq!(header(fields::TXN_SIGNATURE), "74");
        assert_eq!(header(fields::ACCOUNT), "81");
        assert_eq!(header(fields::TICK_SIZE), "001010");
    }

    #[test]
    fn issued_values() {
        assert_eq!(issued_value_bits("1"), Some(0xD483_8D7E_A4C6_8000));
        assert_eq!(issued_value_bits("1e10"), issued_value_bits("10000000000"));
        assert_eq!(issued_value_bits("0.5"), issued_value_bits("5e-1"));
        assert_eq!(issued_value_bits("0"), Some(ZERO_ISSUED_VALUE));
        assert_eq!(issued_value_bits("0.000"), Some(ZERO_ISSUED_VALUE));
        assert_eq!(issued_value_bits("-1"), None);
        assert_eq!(issued_value_bits("1e200"), None);
        assert_eq!(issued_value_bits("12345678901234567"), None);
        assert_eq!(issued_value_bits("."), None);
        assert_eq!(issued_value_bits("ten"), None);
    }

    #[test]
    fn xrp_fee_encoding() {
        let field = Field::drops(fields::FEE, Drops::new(12).unwrap());
        assert_eq!(hex::encode_upper(serialize(&[], vec![field])), "68400000000000000C");
    }

    #[test]
    fn blob_length_prefixes() {
        assert_eq!(length_prefix(0), vec![0]);
        assert_eq!(length_prefix(192), vec![192]);
        assert_eq!(length_prefix(193), vec![193, 0]);
        assert_eq!(length_prefix(256), vec![193, 63]);
        assert_eq!(length_prefix(12_481), vec![241, 0, 0]);
    }

    #[test]
    fn fields_are_written_in_canonical_order() {
        let out = serialize(
            &[],
            vec![
                Field::uint8(fields::TICK_SIZE, 5),
                Field::uint32(fields::SEQUENCE, 1),
                Field::uint16(fields::TRANSACTION_TYPE, 3),
            ],
        );
        assert_eq!(hex::encode_upper(out), "120003240000000100101005");
    }

    #[test]
    fn standard_currency_layout() {
        let bytes = currency_bytes(&CurrencyCode::parse("TST").unwrap()).unwrap();
        assert_eq!(&bytes[12..15], b"TST");
        assert!(bytes[..12].iter().chain(&bytes[15..]).all(|b| *b == 0));
    }
}
