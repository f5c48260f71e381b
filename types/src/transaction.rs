//! State-changing operations and their requests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::amount::TokenAmount;

/// The three mutating calls exposed by the token program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Mint,
    Burn,
    Transfer,
}

impl Operation {
    /// Method name on the program's token service.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Mint => "Mint",
            Self::Burn => "Burn",
            Self::Transfer => "Transfer",
        }
    }

    /// Failure reason used when the remote gives no message.
    pub fn fallback_failure(&self) -> &'static str {
        match self {
            Self::Mint => "mint failed",
            Self::Burn => "burn failed",
            Self::Transfer => "transfer failed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => f.write_str("mint"),
            Self::Burn => f.write_str("burn"),
            Self::Transfer => f.write_str("transfer"),
        }
    }
}

/// A validated request, built per submission and consumed by dispatch.
///
/// `recipient` is the target account: the receiver of a transfer, or the
/// account minted to / burned from. `None` means the active account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub operation: Operation,
    pub recipient: Option<Address>,
    pub amount: TokenAmount,
}

impl TransactionRequest {
    /// The account the operation acts on, given the sender.
    pub fn target(&self, sender: &Address) -> Address {
        self.recipient.unwrap_or(*sender)
    }
}

/// Confirmation returned by the remote channel for an accepted submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub block_hash: Option<String>,
}
