//! Validation and canonicalization of user-entered addresses.
//!
//! Accepted syntaxes:
//! - `0x` + 64 hex digits (66 characters, either case)
//! - SS58 with any network prefix and a valid checksum
//!
//! Everything funnels through [`AddressInput::classify`] and
//! [`AddressInput::decode`]; equality and self-transfer checks compare the
//! decoded bytes, never the raw strings.

use vft_types::{Address, TokenError, ADDRESS_LEN};

use crate::ss58::decode_ss58;

/// Total length of a hex address including the `0x` prefix.
const HEX_ADDRESS_LEN: usize = 2 + ADDRESS_LEN * 2;

/// The surface syntax of a trimmed, non-empty address input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressInput<'a> {
    Hex(&'a str),
    Ss58(&'a str),
}

impl<'a> AddressInput<'a> {
    /// Trim the input and decide its syntax. Returns `None` for blank input.
    pub fn classify(input: &'a str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.starts_with("0x") {
            Some(Self::Hex(trimmed))
        } else {
            Some(Self::Ss58(trimmed))
        }
    }

    /// Decode to raw account bytes.
    pub fn decode(&self) -> Result<Address, TokenError> {
        match *self {
            Self::Hex(s) => {
                if s.len() != HEX_ADDRESS_LEN {
                    return Err(TokenError::InvalidAddress(format!(
                        "hex address must be {HEX_ADDRESS_LEN} characters, got {}",
                        s.len()
                    )));
                }
                Address::from_hex(s)
            }
            Self::Ss58(s) => decode_ss58(s)
                .map(|(_, address)| address)
                .ok_or_else(|| TokenError::InvalidAddress(format!("not a valid SS58 address: {s}"))),
        }
    }
}

/// Whether `input` is a well-formed address in either syntax.
///
/// Never fails: malformed input is an expected state while the user types.
pub fn is_valid_address(input: &str) -> bool {
    normalize_address(input).is_ok()
}

/// Decode `input` (hex or SS58) into raw account bytes.
pub fn normalize_address(input: &str) -> Result<Address, TokenError> {
    AddressInput::classify(input)
        .ok_or_else(|| TokenError::InvalidAddress("address is required".into()))?
        .decode()
}

/// The canonical `0x`-prefixed lowercase hex form of `input` (66 characters).
pub fn to_canonical_hex(input: &str) -> Result<String, TokenError> {
    normalize_address(input).map(|address| address.to_hex())
}

/// Whether two inputs name the same account, whatever their syntax or case.
/// Invalid inputs never match anything.
pub fn same_account(a: &str, b: &str) -> bool {
    match (normalize_address(a), normalize_address(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
