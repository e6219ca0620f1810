use super::{IV_LEN, SALT_LEN};
use crate::error::{KeystoreError, KeystoreResult};
use getrandom::fill;

/// Fill buffer with cryptographically secure random bytes
pub fn secure_random(buf: &mut [u8]) -> KeystoreResult<()> {
    fill(buf).map_err(|e| KeystoreError::Randomness(e.to_string()))
}

/// Generate salt
pub fn generate_salt() -> KeystoreResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate IV
pub fn generate_iv() -> KeystoreResult<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    secure_random(&mut iv)?;
    Ok(iv)
}
