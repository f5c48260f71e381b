//! Token amounts.
//!
//! Amounts are arbitrary-precision non-negative integers (the program stores
//! balances as 256-bit words). Floating point is never involved: user input is
//! parsed digit by digit and rendered back as a plain decimal string.

use num::{BigUint, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TokenError;

/// A raw token amount in the program's smallest unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(BigUint);

impl TokenAmount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Parse a plain decimal integer. Zero is accepted.
    ///
    /// Surrounding whitespace is ignored; signs, fractions, exponents and
    /// digit separators are rejected.
    pub fn from_decimal(s: &str) -> Result<Self, TokenError> {
        let digits = s.trim();
        if digits.is_empty() {
            return Err(TokenError::InvalidAmount("amount is required".into()));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenError::InvalidAmount(format!(
                "not a whole number: {digits}"
            )));
        }
        BigUint::parse_bytes(digits.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| TokenError::InvalidAmount(format!("not a whole number: {digits}")))
    }

    /// Parse user input that must describe a strictly positive amount.
    pub fn parse_positive(s: &str) -> Result<Self, TokenError> {
        let amount = Self::from_decimal(s)?;
        if amount.is_zero() {
            return Err(TokenError::InvalidAmount("amount must be positive".into()));
        }
        Ok(amount)
    }
}

impl From<u128> for TokenAmount {
    fn from(raw: u128) -> Self {
        Self(BigUint::from(raw))
    }
}

impl From<u64> for TokenAmount {
    fn from(raw: u64) -> Self {
        Self(BigUint::from(raw))
    }
}

impl From<BigUint> for TokenAmount {
    fn from(raw: BigUint) -> Self {
        Self(raw)
    }
}

impl FromStr for TokenAmount {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts decimal strings (the wire form for 256-bit words) and plain
/// unsigned integers.
struct AmountVisitor;

impl de::Visitor<'_> for AmountVisitor {
    type Value = TokenAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(TokenAmount::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(TokenAmount::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(TokenAmount::from)
            .map_err(|_| E::custom(format!("negative amount: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        TokenAmount::from_decimal(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_beyond_u128() {
        let huge = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        let amount = TokenAmount::parse_positive(huge).unwrap();
        assert_eq!(amount.to_string(), huge);
    }

    #[test]
    fn zero_is_not_positive() {
        assert_eq!(TokenAmount::from_decimal("0").unwrap(), TokenAmount::zero());
        assert!(matches!(
            TokenAmount::parse_positive("0"),
            Err(TokenError::InvalidAmount(_))
        ));
        assert!(TokenAmount::parse_positive("000").is_err());
    }

    #[test]
    fn rejects_non_integer_input() {
        for input in ["", "  ", "-5", "+5", "1.5", "1e3", "1_000", "abc", "0x10"] {
            assert!(
                TokenAmount::parse_positive(input).is_err(),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(
            TokenAmount::parse_positive(" 1000 ").unwrap(),
            TokenAmount::from(1000u64)
        );
    }

    #[test]
    fn deserializes_strings_and_numbers() {
        let from_str: TokenAmount = serde_json::from_str("\"42\"").unwrap();
        let from_num: TokenAmount = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, from_num);
        assert!(serde_json::from_str::<TokenAmount>("-1").is_err());
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"42\"");
    }
}
