//! AES-128-CTR. The same call encrypts and decrypts.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;

use crate::error::{KeystoreError, KeystoreResult};

type Aes128Ctr = Ctr128BE<Aes128>;

/// XORs `data` with the AES-128-CTR keystream for `key` / `iv`.
///
/// Given plaintext it returns ciphertext, given ciphertext it returns
/// plaintext. The output has the same length as `data`.
pub fn aes_ctr_xor(key: &[u8], data: &[u8], iv: &[u8]) -> KeystoreResult<Vec<u8>> {
    let mut stream = Aes128Ctr::new_from_slices(key, iv).map_err(|_| {
        KeystoreError::CipherInit(format!(
            "AES-128-CTR needs a 16-byte key and IV, got {} and {}",
            key.len(),
            iv.len()
        ))
    })?;

    let mut out = data.to_vec();
    stream.apply_keystream(&mut out);
    Ok(out)
}
