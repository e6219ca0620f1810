use tracing::debug;
use zeroize::Zeroizing;

use super::{DERIVED_KEY_LEN, ENCRYPT_KEY_LEN};
use crate::error::{KeystoreError, KeystoreResult};

/// scrypt cost parameters.
///
/// These are part of the file format: a key file sealed with one set of
/// parameters can only be opened with the same set, and the envelope does
/// not record them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl ScryptParams {
    /// N = 2^18, r = 8, p = 1.
    pub const STANDARD: ScryptParams = ScryptParams {
        log_n: 18,
        r: 8,
        p: 1,
    };

    pub fn new(log_n: u8, r: u32, p: u32) -> KeystoreResult<Self> {
        let params = Self { log_n, r, p };
        params.validate()?;
        Ok(params)
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    /// The CPU/memory cost N.
    pub fn n(&self) -> u64 {
        1u64 << self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn validate(&self) -> KeystoreResult<()> {
        if self.log_n == 0 || self.log_n >= 64 {
            return Err(KeystoreError::Derivation(format!(
                "scrypt log_n out of range: {}",
                self.log_n
            )));
        }
        if self.r == 0 {
            return Err(KeystoreError::Derivation(
                "scrypt r must be >= 1".to_string(),
            ));
        }
        if self.p == 0 {
            return Err(KeystoreError::Derivation(
                "scrypt p must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The 32-byte scrypt output. The first half keys the cipher, the second
/// half keys the MAC. Wiped on drop.
pub struct DerivedKey(Zeroizing<[u8; DERIVED_KEY_LEN]>);

impl DerivedKey {
    pub fn encrypt_key(&self) -> &[u8] {
        &self.0[..ENCRYPT_KEY_LEN]
    }

    pub fn mac_key(&self) -> &[u8] {
        &self.0[ENCRYPT_KEY_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: ScryptParams,
) -> KeystoreResult<DerivedKey> {
    params.validate()?;

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, DERIVED_KEY_LEN)
        .map_err(|e| KeystoreError::Derivation(format!("invalid scrypt params: {e}")))?;

    debug!(
        log_n = params.log_n,
        r = params.r,
        p = params.p,
        "deriving key with scrypt"
    );

    let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    scrypt::scrypt(passphrase, salt, &scrypt_params, &mut key[..])
        .map_err(|e| KeystoreError::Derivation(e.to_string()))?;

    Ok(DerivedKey(key))
}
