//! 32-byte identifiers and the Keccak-256 domain hash.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::{KeystoreError, KeystoreResult};

/// Length of a hash in bytes.
pub const HASH_LEN: usize = 32;

/// Fixed-size hash value, also used as an account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    pub const EMPTY: Hash = Hash([0u8; HASH_LEN]);

    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a hash from exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> KeystoreResult<Self> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            KeystoreError::Format(format!(
                "hash must be {HASH_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Builds a hash from the big-endian bytes of an unsigned integer,
    /// left-padding with zeros.
    pub fn from_be_bytes_padded(bytes: &[u8]) -> KeystoreResult<Self> {
        if bytes.len() > HASH_LEN {
            return Err(KeystoreError::Format(format!(
                "integer does not fit in {HASH_LEN} bytes ({} given)",
                bytes.len()
            )));
        }
        let mut out = [0u8; HASH_LEN];
        out[HASH_LEN - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Parses a hex string with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> KeystoreResult<Self> {
        let bytes = hex::decode(strip_hex_prefix(s))?;
        Self::from_slice(&bytes)
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = KeystoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Keccak-256 over the concatenation of `parts`.
pub fn hash_bytes(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}
