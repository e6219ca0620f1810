//! Key file format v1.
//!
//! scrypt (N = 2^18, r = 8, p = 1) / AES-128-CTR / Keccak-256 MAC. Binary
//! fields are lowercase hex without a prefix.

use super::{CryptoInfo, Envelope};
use crate::{
    crypto::{IV_LEN, SALT_LEN},
    error::{KeystoreError, KeystoreResult},
    hash::{Hash, strip_hex_prefix},
};

/// Current file format version.
pub const VERSION_V1: i64 = 1;

/// The decoded crypto section of a v1 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedParts {
    pub cipher_text: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub salt: Vec<u8>,
    pub mac: Hash,
}

/// Builds a v1 envelope.
pub fn pack(address: &Hash, parts: &SealedParts) -> Envelope {
    Envelope {
        version: VERSION_V1,
        address: address.to_hex(),
        crypto: CryptoInfo {
            cipher_text: hex::encode(&parts.cipher_text),
            cipher_iv: hex::encode(parts.iv),
            salt: hex::encode(&parts.salt),
            mac: hex::encode(parts.mac.as_bytes()),
        },
    }
}

/// Decodes the hex fields of a v1 envelope.
///
/// # Errors
///
/// Returns [`KeystoreError::Format`] on invalid hex, a MAC that is not 32
/// bytes or an IV that is not 16 bytes.
pub fn unpack(envelope: &Envelope) -> KeystoreResult<SealedParts> {
    if envelope.version != VERSION_V1 {
        return Err(KeystoreError::Version(envelope.version));
    }
    let crypto = &envelope.crypto;

    // older files wrote the tag with a 0x prefix
    let mac = decode_field("mac", &crypto.mac)?;
    let mac = Hash::from_slice(&mac).map_err(|_| {
        KeystoreError::Format(format!("mac must be 32 bytes, got {}", mac.len()))
    })?;

    let iv = decode_field("cipherIV", &crypto.cipher_iv)?;
    let iv: [u8; IV_LEN] = iv.try_into().map_err(|v: Vec<u8>| {
        KeystoreError::Format(format!("cipherIV must be {IV_LEN} bytes, got {}", v.len()))
    })?;

    let cipher_text = decode_field("cipherText", &crypto.cipher_text)?;
    let salt = decode_field("salt", &crypto.salt)?;

    if salt.len() != SALT_LEN {
        tracing::debug!(len = salt.len(), "salt has non-standard length");
    }

    Ok(SealedParts {
        cipher_text,
        iv,
        salt,
        mac,
    })
}

fn decode_field(name: &str, value: &str) -> KeystoreResult<Vec<u8>> {
    hex::decode(strip_hex_prefix(value))
        .map_err(|e| KeystoreError::Format(format!("{name}: invalid hex: {e}")))
}
