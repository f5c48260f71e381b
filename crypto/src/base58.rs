//! Base58 encoding with the Bitcoin alphabet, as used by SS58 addresses.
//!
//! Leading zero bytes map one-to-one to leading `1` characters; the rest is a
//! big-endian base conversion.

/// Base58 alphabet (no `0`, `O`, `I`, `l`).
const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Reverse lookup table: ASCII byte → digit value (0xFF = invalid).
const DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 58 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encode bytes as base58.
pub fn encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // Base-58 digits, least significant first.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut result = String::with_capacity(zeros + digits.len());
    result.extend(std::iter::repeat('1').take(zeros));
    result.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    result
}

/// Decode a base58 string. Returns `None` on any character outside the
/// alphabet.
pub fn decode(s: &str) -> Option<Vec<u8>> {
    let zeros = s.bytes().take_while(|&c| c == b'1').count();

    // Base-256 bytes, least significant first.
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.bytes().skip(zeros) {
        if c >= 128 {
            return None;
        }
        let val = DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        let mut carry = val as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut result = vec![0u8; zeros];
    result.extend(bytes.iter().rev());
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(encode(b"Hello World!"), "2NEpo7TZRRrLZSi2U");
        assert_eq!(encode(&[0, 0, 0x28, 0x7f, 0xb4, 0xcd]), "11233QC4");
        assert_eq!(decode("11233QC4").unwrap(), vec![0, 0, 0x28, 0x7f, 0xb4, 0xcd]);
    }

    #[test]
    fn empty_and_zero_inputs() {
        assert_eq!(encode(&[]), "");
        assert_eq!(encode(&[0]), "1");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode("111").unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        for bad in ["0abc", "Oabc", "Iabc", "labc", "ab c", "ab\u{e9}"] {
            assert!(decode(bad).is_none(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let data = [0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0x42, 0x00];
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }
}
