use thiserror::Error;

/// Errors produced while sealing or unsealing a key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeystoreError {
    /// Malformed envelope structure or invalid hex in one of its fields.
    #[error("invalid key file: {0}")]
    Format(String),

    #[error("version not supported: {0}")]
    Version(i64),

    /// MAC mismatch: a wrong passphrase or a modified ciphertext.
    #[error("could not decrypt key with given passphrase")]
    Decryption,

    #[error("OS random generator unavailable: {0}")]
    Randomness(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("cipher initialization failed: {0}")]
    CipherInit(String),

    /// Decrypted bytes are not a usable private key.
    #[error("invalid private key material: {0}")]
    KeyMaterial(String),
}

pub type KeystoreResult<T> = Result<T, KeystoreError>;

impl From<serde_json::Error> for KeystoreError {
    fn from(e: serde_json::Error) -> Self {
        KeystoreError::Format(e.to_string())
    }
}

impl From<hex::FromHexError> for KeystoreError {
    fn from(e: hex::FromHexError) -> Self {
        KeystoreError::Format(format!("invalid hex: {e}"))
    }
}
