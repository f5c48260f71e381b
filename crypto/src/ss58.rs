//! SS58 account encoding.
//!
//! Address format: base58(prefix ‖ account ‖ checksum)
//!
//! - prefix: one byte for network ids 0..=63, two bytes for 64..=16383
//! - account: the 32 raw account bytes
//! - checksum: first 2 bytes of Blake2b-512(`"SS58PRE"` ‖ prefix ‖ account)

use vft_types::{Address, ADDRESS_LEN};

use crate::base58;
use crate::hash::blake2b_512_multi;

/// Generic Substrate network prefix.
pub const DEFAULT_SS58_PREFIX: u16 = 42;
/// Largest network id representable in the two-byte prefix form.
pub const MAX_SS58_PREFIX: u16 = 16_383;

/// Domain separator hashed in front of every checksum.
const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
/// Checksum bytes appended to 32-byte account payloads.
const CHECKSUM_LEN: usize = 2;

/// Encode the network prefix. Values above [`MAX_SS58_PREFIX`] are masked.
fn encode_prefix(prefix: u16) -> Vec<u8> {
    let ident = prefix & MAX_SS58_PREFIX;
    if ident < 64 {
        vec![ident as u8]
    } else {
        let first = ((ident & 0b0000_0000_1111_1100) as u8) >> 2;
        let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
        vec![first | 0b0100_0000, second]
    }
}

/// Decode the network prefix at the front of `data`, returning the prefix and
/// the number of bytes it occupies.
fn decode_prefix(data: &[u8]) -> Option<(u16, usize)> {
    match *data.first()? {
        first @ 0..=63 => Some((first as u16, 1)),
        first @ 64..=127 => {
            let second = *data.get(1)?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            Some(((lower as u16) | ((upper as u16) << 8), 2))
        }
        _ => None,
    }
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = blake2b_512_multi(&[CHECKSUM_PREAMBLE, payload]);
    [hash[0], hash[1]]
}

/// Encode an account under the given network prefix.
pub fn encode_ss58(address: &Address, prefix: u16) -> String {
    let mut payload = encode_prefix(prefix);
    payload.extend_from_slice(address.as_bytes());
    let checksum = checksum(&payload);
    payload.extend_from_slice(&checksum);
    base58::encode(&payload)
}

/// Decode an SS58 string into its network prefix and account.
///
/// Returns `None` if the string is not base58, carries a reserved prefix, has
/// the wrong payload length for a 32-byte account, or fails its checksum.
pub fn decode_ss58(s: &str) -> Option<(u16, Address)> {
    let data = base58::decode(s)?;
    let (prefix, prefix_len) = decode_prefix(&data)?;
    if data.len() != prefix_len + ADDRESS_LEN + CHECKSUM_LEN {
        return None;
    }

    let (payload, expected) = data.split_at(prefix_len + ADDRESS_LEN);
    if checksum(payload) != expected {
        return None;
    }

    let mut account = [0u8; ADDRESS_LEN];
    account.copy_from_slice(&payload[prefix_len..]);
    Some((prefix, Address::new(account)))
}
