//! Address codec for the VFT client.
//!
//! - **Hex**: `0x` + 64 hex digits, the canonical form used for all comparisons
//! - **SS58**: base58 with a network prefix and a Blake2b-512 checksum
//! - A single classifier ([`AddressInput`]) decides which syntax an input uses,
//!   so every call site validates and compares addresses the same way

pub mod address;
pub mod base58;
pub mod hash;
pub mod ss58;

pub use address::{
    is_valid_address, normalize_address, same_account, to_canonical_hex, AddressInput,
};
pub use hash::{blake2b_512, blake2b_512_multi};
pub use ss58::{decode_ss58, encode_ss58, DEFAULT_SS58_PREFIX, MAX_SS58_PREFIX};
