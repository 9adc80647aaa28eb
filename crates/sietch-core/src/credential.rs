//! # Credential & Time Reference
//!
//! The credential is a signed 128-bit integer. Ten trillion plus a
//! millisecond timestamp already crowds the safe-integer range of IEEE-754
//! doubles, so the credential never travels as a JSON number: it is parsed
//! from a string and always serialized back as a decimal string.
//!
//! The time reference arrives as a JSON number and is only accepted when it
//! converts to an integer without rounding. `serde_json` keeps the literal
//! text of every number (`arbitrary_precision`), so integer literals beyond
//! the 64-bit range are read exactly instead of through a double.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest integer a double represents exactly (2^53 − 1).
const MAX_SAFE_FLOAT_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Large-integer credential submitted with a worm.
///
/// Serializes as a decimal string (`"10000000000099"`), never as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Credential(i128);

impl Credential {
    /// Wrap a raw integer.
    pub const fn new(value: i128) -> Self {
        Self(value)
    }

    /// Return the integer value.
    pub fn value(&self) -> i128 {
        self.0
    }
}

impl FromStr for Credential {
    type Err = ValidationError;

    /// Parse an optional leading `-` followed by one or more ASCII digits.
    ///
    /// Signs other than `-`, whitespace, separators and exponents are
    /// rejected rather than normalized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_decimal_integer(s) {
            return Err(ValidationError::MalformedCredential(s.to_string()));
        }
        s.parse::<i128>()
            .map(Self)
            .map_err(|_| ValidationError::MalformedCredential(s.to_string()))
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Credential {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Caller-supplied time reference, already converted to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeReference(i128);

impl TimeReference {
    /// Wrap a raw integer.
    pub const fn new(value: i128) -> Self {
        Self(value)
    }

    /// Return the integer value.
    pub fn value(&self) -> i128 {
        self.0
    }

    /// Convert a JSON number to an integer time reference.
    ///
    /// Integer literals convert exactly, up to the 128-bit range. Literals
    /// with a fraction or exponent convert only when finite, without a
    /// fractional part, and no larger in magnitude than 2^53 − 1, beyond
    /// which a double no longer identifies a single integer.
    pub fn from_json_number(n: &serde_json::Number) -> Result<Self, ValidationError> {
        if let Some(i) = n.as_i64() {
            return Ok(Self(i128::from(i)));
        }
        if let Some(u) = n.as_u64() {
            return Ok(Self(i128::from(u)));
        }
        let text = n.to_string();
        if is_decimal_integer(&text) {
            return text
                .parse::<i128>()
                .map(Self)
                .map_err(|_| ValidationError::TimeReferenceOutOfRange(text));
        }
        match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_FLOAT_INTEGER => {
                Ok(Self(f as i128))
            }
            _ => Err(ValidationError::TimeReferenceNotIntegral(n.to_string())),
        }
    }
}

/// Optional leading `-`, then one or more ASCII digits.
fn is_decimal_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl std::fmt::Display for TimeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
