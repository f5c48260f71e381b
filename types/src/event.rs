//! Events emitted by the token program.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::amount::TokenAmount;

/// Tag of a [`TokenEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Minted,
    Burned,
    Transferred,
    Approved,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Minted => "minted",
            Self::Burned => "burned",
            Self::Transferred => "transferred",
            Self::Approved => "approved",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedEvent {
    pub owner: Address,
    pub amount: TokenAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnedEvent {
    pub owner: Address,
    pub amount: TokenAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub amount: TokenAmount,
}

/// A decoded program event. Transient; never persisted.
///
/// Wire form: `{"kind": "Transferred", "data": {"from": "0x..", "to": "0x..", "amount": "5"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum TokenEvent {
    Minted(MintedEvent),
    Burned(BurnedEvent),
    Transferred(TransferEvent),
    Approved(ApprovalEvent),
}

impl TokenEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Minted(_) => EventKind::Minted,
            Self::Burned(_) => EventKind::Burned,
            Self::Transferred(_) => EventKind::Transferred,
            Self::Approved(_) => EventKind::Approved,
        }
    }

    /// Accounts whose balance the event changes.
    pub fn affected_accounts(&self) -> Vec<Address> {
        match self {
            Self::Minted(e) => vec![e.owner],
            Self::Burned(e) => vec![e.owner],
            Self::Transferred(e) => vec![e.from, e.to],
            Self::Approved(_) => Vec::new(),
        }
    }
}
