//! Classification of ledger result codes.
//!
//! A node reports the outcome of a transaction as a string such as
//! `tesSUCCESS` or `tecNO_DST_INSUFF_XRP`. The prefix names the family of the
//! code; [`EngineResult`] parses the string once and exposes the family and a
//! coarse [`ResultClass`] so that callers never compare strings themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only code that denotes success.
pub const SUCCESS_CODE: &str = "tesSUCCESS";

/// Retryable codes outside the `ter` family.
const RETRYABLE_CODES: &[&str] = &[
    "tefPAST_SEQ",
    "tefMAX_LEDGER",
    "telINSUF_FEE_P",
    "telCAN_NOT_QUEUE",
    "telCAN_NOT_QUEUE_BALANCE",
    "telCAN_NOT_QUEUE_BLOCKS",
    "telCAN_NOT_QUEUE_BLOCKED",
    "telCAN_NOT_QUEUE_FEE",
    "telCAN_NOT_QUEUE_FULL",
];

/// The family a result code belongs to, taken from its three-letter prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultFamily {
    /// `tes`: applied successfully.
    Success,
    /// `tec`: included in a ledger and the fee claimed, but the intent failed.
    Claimed,
    /// `tef`: failed, cannot succeed in any future ledger as signed.
    Failure,
    /// `tel`: rejected by the local server only.
    Local,
    /// `tem`: malformed.
    Malformed,
    /// `ter`: could succeed later.
    Retry,
    /// Not a recognised prefix.
    Unknown,
}

/// Coarse classification of a result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultClass {
    Success,
    Retryable,
    Failure,
}

/// A result code as reported by the ledger, classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EngineResult {
    code: String,
    family: ResultFamily,
    class: ResultClass,
}

impl EngineResult {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let family = family_of(&code);
        let class = class_of(&code, family);
        Self {
            code,
            family,
            class,
        }
    }

    pub fn success() -> Self {
        Self::new(SUCCESS_CODE)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn family(&self) -> ResultFamily {
        self.family
    }

    pub fn class(&self) -> ResultClass {
        self.class
    }

    /// True only for the exact, case-sensitive code `tesSUCCESS`.
    pub fn is_success(&self) -> bool {
        self.class == ResultClass::Success
    }

    /// True when the transaction can never be included in a ledger as signed,
    /// so there is no point waiting for validation.
    pub fn is_final_before_validation(&self) -> bool {
        matches!(self.family, ResultFamily::Malformed | ResultFamily::Failure)
    }
}

fn family_of(code: &str) -> ResultFamily {
    match code.get(..3) {
        Some("tes") => ResultFamily::Success,
        Some("tec") => ResultFamily::Claimed,
        Some("tef") => ResultFamily::Failure,
        Some("tel") => ResultFamily::Local,
        Some("tem") => ResultFamily::Malformed,
        Some("ter") => ResultFamily::Retry,
        _ => ResultFamily::Unknown,
    }
}

fn class_of(code: &str, family: ResultFamily) -> ResultClass {
    if code == SUCCESS_CODE {
        ResultClass::Success
    } else if family == ResultFamily::Retry || RETRYABLE_CODES.contains(&code) {
        ResultClass::Retryable
    } else {
        ResultClass::Failure
    }
}

impl From<String> for EngineResult {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for EngineResult {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<EngineResult> for String {
    fn from(result: EngineResult) -> Self {
        result.code
    }
}

impl fmt::Display for EngineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_success_code_is_success() {
        assert!(EngineResult::new("tesSUCCESS").is_success());

        for code in ["TESSUCCESS", "tessuccess", "tesSUCCESS ", " tesSUCCESS", "tes", ""] {
            let result = EngineResult::new(code);
            assert!(!result.is_success(), "{code:?} must not be a success");
            assert_ne!(result.class(), ResultClass::Success);
        }
    }

    #[test]
    fn families_follow_prefix() {
        assert_eq!(EngineResult::new("tecNO_DST_INSUFF_XRP").family(), ResultFamily::Claimed);
        assert_eq!(EngineResult::new("tefPAST_SEQ").family(), ResultFamily::Failure);
        assert_eq!(EngineResult::new("telINSUF_FEE_P").family(), ResultFamily::Local);
        assert_eq!(EngineResult::new("temBAD_AMOUNT").family(), ResultFamily::Malformed);
        assert_eq!(EngineResult::new("terQUEUED").family(), ResultFamily::Retry);
        assert_eq!(EngineResult::new("weird").family(), ResultFamily::Unknown);
        assert_eq!(EngineResult::new("t").family(), ResultFamily::Unknown);
    }

    #[test]
    fn retryable_codes_are_classified() {
        for code in [
            "terQUEUED",
            "terPRE_SEQ",
            "tefPAST_SEQ",
            "telINSUF_FEE_P",
            "telCAN_NOT_QUEUE_FULL",
        ] {
            assert_eq!(EngineResult::new(code).class(), ResultClass::Retryable, "{code}");
        }
        for code in ["tecNO_DST_INSUFF_XRP", "temMALFORMED", "tefBAD_AUTH", "garbage"] {
            assert_eq!(EngineResult::new(code).class(), ResultClass::Failure, "{code}");
        }
    }

    #[test]
    fn malformed_and_tef_codes_are_final_before_validation() {
        assert!(EngineResult::new("temBAD_FEE").is_final_before_validation());
        assert!(EngineResult::new("tefPAST_SEQ").is_final_before_validation());
        assert!(!EngineResult::new("tecNO_LINE").is_final_before_validation());
        assert!(!EngineResult::new("terQUEUED").is_final_before_validation());
        assert!(!EngineResult::success().is_final_before_validation());
    }

    #[test]
    fn deserializes_from_plain_string() {
        let result: EngineResult = serde_json::from_str("\"tecNO_LINE\"").unwrap();
        assert_eq!(result.code(), "tecNO_LINE");
        assert_eq!(serde_json::to_string(&result).unwrap(), "\"tecNO_LINE\"");
    }
}
