//! The remote execution channel: how calls reach the token program.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use vft_types::{Operation, Receipt, TokenAmount};

use crate::error::ChannelError;

/// Read-only methods of the program's token service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryMethod {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf,
}

impl QueryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Symbol => "Symbol",
            Self::Decimals => "Decimals",
            Self::TotalSupply => "TotalSupply",
            Self::BalanceOf => "BalanceOf",
        }
    }
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submits state-changing calls and performs reads against the program.
///
/// Protocol framing, signing and fee payment belong to the implementation.
/// A rejected or cancelled call surfaces as [`ChannelError::Rejected`],
/// carrying the remote's message when there is one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteChannel: Send + Sync + 'static {
    /// Submit a mutating call and wait for it to be accepted.
    async fn submit(&self, operation: Operation, args: Vec<Value>) -> Result<Receipt, ChannelError>;

    /// Perform a read.
    async fn query(&self, method: QueryMethod, args: Vec<Value>) -> Result<Value, ChannelError>;
}

fn decode<T: DeserializeOwned>(method: QueryMethod, value: Value) -> Result<T, ChannelError> {
    serde_json::from_value(value).map_err(|e| ChannelError::Decode(format!("{method}: {e}")))
}

pub(crate) fn decode_amount(method: QueryMethod, value: Value) -> Result<TokenAmount, ChannelError> {
    decode(method, value)
}

pub(crate) fn decode_string(method: QueryMethod, value: Value) -> Result<String, ChannelError> {
    decode(method, value)
}

pub(crate) fn decode_decimals(method: QueryMethod, value: Value) -> Result<u8, ChannelError> {
    decode(method, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amounts_decode_from_strings_and_numbers() {
        assert_eq!(
            decode_amount(QueryMethod::TotalSupply, json!("1000")).unwrap(),
            TokenAmount::from(1000u64)
        );
        assert_eq!(
            decode_amount(QueryMethod::BalanceOf, json!(7)).unwrap(),
            TokenAmount::from(7u64)
        );
    }

    #[test]
    fn malformed_values_are_decode_errors() {
        let err = decode_decimals(QueryMethod::Decimals, json!("eighteen")).unwrap_err();
        assert!(matches!(err, ChannelError::Decode(msg) if msg.starts_with("Decimals")));
        assert!(decode_string(QueryMethod::Name, json!(12)).is_err());
    }
}
