//! Nullable wallet connection — an account that tests can switch.

use std::sync::Mutex;
use vft_client::{Account, AccountProvider};

/// An account provider whose active account is set by the test.
#[derive(Default)]
pub struct NullAccounts {
    active: Mutex<Option<Account>>,
}

impl NullAccounts {
    /// A provider with `address` (hex or SS58) connected.
    ///
    /// Panics on an invalid address; fixtures are expected to be valid.
    pub fn connected(address: &str) -> Self {
        let account = Account::from_input(address)
            .unwrap_or_else(|e| panic!("invalid fixture address {address}: {e}"));
        Self {
            active: Mutex::new(Some(account)),
        }
    }

    /// A provider with no wallet connected.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Switch the active account; `None` disconnects.
    pub fn set(&self, account: Option<Account>) {
        *self.active.lock().unwrap() = account;
    }
}

impl AccountProvider for NullAccounts {
    fn active_account(&self) -> Option<Account> {
        self.active.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_accounts() {
        let accounts = NullAccounts::connected("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY");
        assert!(accounts.active_account().is_some());
        accounts.set(None);
        assert!(accounts.active_account().is_none());
    }
}
