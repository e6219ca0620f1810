//! On-disk key file format.
//!
//! A key file is a tab-indented JSON document:
//!
//! ```text
//! {
//!     "version": 1,
//!     "address": "0x<64 hex>",
//!     "crypto": {
//!         "cipherText": "<hex>",
//!         "cipherIV": "<hex, 16 bytes>",
//!         "salt": "<hex, 32 bytes>",
//!         "mac": "<hex, 32 bytes>"
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{KeystoreError, KeystoreResult};
use crate::hash::Hash;

pub mod v1;

pub use v1::SealedParts;

/// Latest format version
pub const CURRENT_VERSION: i64 = v1::VERSION_V1;

/// A parsed key file. Binary fields are still hex strings at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: i64,
    pub address: String,
    pub crypto: CryptoInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoInfo {
    pub cipher_text: String,
    #[serde(rename = "cipherIV")]
    pub cipher_iv: String,
    pub salt: String,
    pub mac: String,
}

impl Envelope {
    /// Fails with [`KeystoreError::Version`] unless the file is `expected`.
    pub fn check_version(&self, expected: i64) -> KeystoreResult<()> {
        if self.version != expected {
            return Err(KeystoreError::Version(self.version));
        }
        Ok(())
    }

    /// Hex-decodes the crypto section.
    ///
    /// Dispatches on the version; call [`Envelope::check_version`] first.
    pub fn unpack(&self) -> KeystoreResult<SealedParts> {
        match self.version {
            v1::VERSION_V1 => v1::unpack(self),
            other => Err(KeystoreError::Version(other)),
        }
    }

    /// The address recorded in the file. Needs no passphrase.
    pub fn address(&self) -> KeystoreResult<Hash> {
        Hash::from_hex(&self.address)
    }
}

/// Serializes an envelope as tab-indented JSON.
pub fn encode(envelope: &Envelope) -> KeystoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    envelope.serialize(&mut ser)?;
    Ok(buf)
}

/// Parses a key file.
///
/// # Errors
///
/// Returns [`KeystoreError::Format`] if the input is not JSON or lacks one of
/// the required fields.
pub fn decode(data: &[u8]) -> KeystoreResult<Envelope> {
    Ok(serde_json::from_slice(data)?)
}

/// Reads the address of a key file without unlocking it.
pub fn peek_address(data: &[u8]) -> KeystoreResult<Hash> {
    decode(data)?.address()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            version: CURRENT_VERSION,
            address: Hash::new([0x11; 32]).to_hex(),
            crypto: CryptoInfo {
                cipher_text: hex::encode([0x22; 32]),
                cipher_iv: hex::encode([0x33; 16]),
                salt: hex::encode([0x44; 32]),
                mac: hex::encode([0x55; 32]),
            },
        }
    }

    #[test]
    fn encode_uses_tabs_and_camel_case_keys() {
        let text = String::from_utf8(encode(&sample()).unwrap()).unwrap();

        assert!(text.starts_with("{\n\t\"version\": 1,\n\t\"address\": \"0x1111"));
        assert!(text.contains("\n\t\t\"cipherText\": \""));
        assert!(text.contains("\n\t\t\"cipherIV\": \""));
        assert!(text.contains("\n\t\t\"salt\": \""));
        assert!(text.contains("\n\t\t\"mac\": \""));
        assert!(!text.contains("  "));
    }

    #[test]
    fn decode_inverts_encode() {
        let env = sample();
        assert_eq!(decode(&encode(&env).unwrap()).unwrap(), env);
    }

    #[test]
    fn decode_malformed_fails() {
        assert!(matches!(decode(b"not json"), Err(KeystoreError::Format(_))));
        assert!(matches!(
            decode(br#"{"version": 1, "address": "0x00"}"#),
            Err(KeystoreError::Format(_))
        ));
        assert!(matches!(
            decode(br#"{"version": "one", "address": "", "crypto": {}}"#),
            Err(KeystoreError::Format(_))
        ));
    }

    #[test]
    fn version_gate() {
        let mut env = sample();
        assert!(env.check_version(CURRENT_VERSION).is_ok());

        env.version = 7;
        assert_eq!(
            env.check_version(CURRENT_VERSION),
            Err(KeystoreError::Version(7))
        );
        assert_eq!(env.unpack().unwrap_err(), KeystoreError::Version(7));
    }

    #[test]
    fn negative_version_decodes_for_the_gate() {
        let text = String::from_utf8(encode(&sample()).unwrap())
            .unwrap()
            .replace("\"version\": 1", "\"version\": -1");
        let env = decode(text.as_bytes()).unwrap();
        assert_eq!(
            env.check_version(CURRENT_VERSION),
            Err(KeystoreError::Version(-1))
        );
    }

    #[test]
    fn peek_reads_address_only() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(peek_address(&bytes).unwrap(), Hash::new([0x11; 32]));
    }
}
