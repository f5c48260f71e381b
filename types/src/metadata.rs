//! Token metadata as reported by the program.

use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;

/// Name, symbol, decimals and total supply. Each field stays `None` until its
/// first successful fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub total_supply: Option<TokenAmount>,
}

impl TokenMetadata {
    /// Whether every field has been loaded.
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.symbol.is_some()
            && self.decimals.is_some()
            && self.total_supply.is_some()
    }
}
