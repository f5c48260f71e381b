//! 32-byte account and program identities.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TokenError;

/// Number of raw bytes in every account or program identity.
pub const ADDRESS_LEN: usize = 32;

/// An account identity: 32 opaque bytes.
///
/// The canonical textual form is `0x` followed by 64 lowercase hex digits.
/// Parsing of the other surface syntax (SS58) lives in `vft-crypto`, which
/// produces values of this type; two inputs that decode to the same bytes
/// compare equal here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

/// Identity of the deployed token program. Same representation as an account.
pub type ProgramId = Address;

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    /// The canonical `0x`-prefixed lowercase hex form (66 characters).
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse `0x` followed by exactly 64 hex digits (either case).
    pub fn from_hex(s: &str) -> Result<Self, TokenError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| TokenError::InvalidAddress(format!("missing 0x prefix: {s}")))?;
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(TokenError::InvalidAddress(format!(
                "expected {} hex digits, got {}",
                ADDRESS_LEN * 2,
                digits.len()
            )));
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| TokenError::InvalidAddress(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
