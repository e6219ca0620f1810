//! Keccak-256 MAC over `mac_key || cipher_text`.

use crate::hash::{Hash, hash_bytes};

pub fn compute_mac(mac_key: &[u8], cipher_text: &[u8]) -> Hash {
    hash_bytes(&[mac_key, cipher_text])
}

/// Recomputes the MAC and compares it with `expected`.
///
/// The comparison always walks all 32 bytes; it must not return early on
/// the first differing byte.
pub fn verify_mac(mac_key: &[u8], cipher_text: &[u8], expected: &Hash) -> bool {
    let computed = compute_mac(mac_key, cipher_text);
    constant_time_eq(computed.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_matches_reference_vector() {
        let mac = compute_mac(&[0xaa; 16], &[0xbb; 32]);
        assert_eq!(
            mac.to_hex(),
            "0x12ca1ca998e01dbef984fe9b2882e828fe2dd9289e8bc53ec27e3b1ff1aa78fb"
        );
    }

    #[test]
    fn verify_accepts_matching_tag() {
        let tag = compute_mac(&[1; 16], b"cipher");
        assert!(verify_mac(&[1; 16], b"cipher", &tag));
    }

    #[test]
    fn verify_rejects_any_flipped_bit() {
        let tag = compute_mac(&[1; 16], b"cipher");
        for byte in 0..32 {
            let mut bytes = *tag.as_bytes();
            bytes[byte] ^= 0x80;
            assert!(!verify_mac(&[1; 16], b"cipher", &Hash::new(bytes)));
        }
    }

    #[test]
    fn mac_key_and_cipher_text_both_matter() {
        let tag = compute_mac(&[1; 16], b"cipher");
        assert!(!verify_mac(&[2; 16], b"cipher", &tag));
        assert!(!verify_mac(&[1; 16], b"cipheR", &tag));
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
    }
}
