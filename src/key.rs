//! secp256k1 key pairs and their 32-byte addresses.

use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::crypto::secure_random;
use crate::error::{KeystoreError, KeystoreResult};
use crate::hash::{Hash, hash_bytes, strip_hex_prefix};

/// Length of a serialized private key scalar.
pub const PRIVATE_KEY_LEN: usize = 32;

/// A private key together with the address derived from it.
#[derive(Clone)]
pub struct Key {
    address: Hash,
    private_key: SecretKey,
}

impl Key {
    /// Generates a fresh key from OS randomness.
    pub fn generate() -> KeystoreResult<Self> {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        loop {
            secure_random(bytes.as_mut_slice())?;
            // zero and values >= the curve order are rejected; just draw again
            if let Ok(secret) = SecretKey::from_slice(bytes.as_slice()) {
                return Ok(Self::from_secret_key(secret));
            }
        }
    }

    pub fn from_secret_key(private_key: SecretKey) -> Self {
        let address = address_of(&private_key.public_key());
        Self {
            address,
            private_key,
        }
    }

    /// Rebuilds a key from its 32-byte big-endian scalar.
    pub fn from_private_key_bytes(bytes: &[u8]) -> KeystoreResult<Self> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeystoreError::KeyMaterial(format!(
                "expected {PRIVATE_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| {
            KeystoreError::KeyMaterial("scalar is zero or not below the curve order".to_string())
        })?;
        Ok(Self::from_secret_key(secret))
    }

    /// Parses a hex scalar, with or without `0x`.
    pub fn from_private_key_hex(s: &str) -> KeystoreResult<Self> {
        let bytes = Zeroizing::new(hex::decode(strip_hex_prefix(s.trim()))?);
        Self::from_private_key_bytes(&bytes)
    }

    pub fn address(&self) -> &Hash {
        &self.address
    }

    pub fn private_key(&self) -> &SecretKey {
        &self.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// The scalar as 32 big-endian bytes, left-padded with zeros.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(self.private_key.to_bytes().into())
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.private_key_bytes().as_slice()))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && *self.private_key_bytes() == *other.private_key_bytes()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Keccak-256 of the uncompressed public key, without the SEC1 tag byte.
pub fn address_of(public_key: &PublicKey) -> Hash {
    let point = public_key.to_encoded_point(false);
    hash_bytes(&[&point.as_bytes()[1..]])
}
