//! The active wallet account, as seen by this crate.

use vft_crypto::normalize_address;
use vft_types::{Address, TokenError};

/// A connected account: its display address and decoded identity bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Address as shown to the user (usually SS58).
    pub address: String,
    pub decoded: Address,
}

impl Account {
    /// Build an account from a user-facing address in either syntax.
    pub fn from_input(input: &str) -> Result<Self, TokenError> {
        let decoded = normalize_address(input)?;
        Ok(Self {
            address: input.trim().to_string(),
            decoded,
        })
    }
}

/// Read-only view of the wallet connection. Owned elsewhere; this crate only
/// reads it when a request is constructed.
#[cfg_attr(test, mockall::automock)]
pub trait AccountProvider: Send + Sync + 'static {
    /// The currently selected account, or `None` when no wallet is connected.
    fn active_account(&self) -> Option<Account>;
}

/// A fixed account, e.g. one passed on the command line.
#[derive(Clone, Debug, Default)]
pub struct StaticAccount(Option<Account>);

impl StaticAccount {
    pub fn new(account: Option<Account>) -> Self {
        Self(account)
    }

    pub fn disconnected() -> Self {
        Self(None)
    }
}

impl AccountProvider for StaticAccount {
    fn active_account(&self) -> Option<Account> {
        self.0.clone()
    }
}
