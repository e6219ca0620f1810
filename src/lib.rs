pub mod crypto;
mod error;
pub mod format;
mod hash;
mod key;
mod storage;

pub use crate::crypto::ScryptParams;
pub use crate::error::{KeystoreError, KeystoreResult};
pub use crate::format::{CURRENT_VERSION, Envelope, peek_address};
pub use crate::hash::{HASH_LEN, Hash, hash_bytes};
pub use crate::key::{Key, PRIVATE_KEY_LEN, address_of};
pub use crate::storage::Storage;

use crate::crypto::IV_LEN;
use crate::format::SealedParts;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Scheme constants used to seal and open key files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeystoreConfig {
    scrypt: ScryptParams,
    version: i64,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            scrypt: ScryptParams::STANDARD,
            version: CURRENT_VERSION,
        }
    }
}

impl KeystoreConfig {
    /// Files sealed with anything but [`ScryptParams::STANDARD`] can only be
    /// opened with the same parameters.
    pub fn with_scrypt(scrypt: ScryptParams) -> Self {
        Self {
            scrypt,
            ..Self::default()
        }
    }

    pub fn scrypt(&self) -> ScryptParams {
        self.scrypt
    }

    pub fn version(&self) -> i64 {
        self.version
    }
}

/// Seals private keys under a passphrase and opens them again.
///
/// Holds only its configuration, so one instance can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassphraseKeyStore {
    config: KeystoreConfig,
}

impl PassphraseKeyStore {
    pub fn new(config: KeystoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeystoreConfig {
        &self.config
    }

    /// Encrypts `key` under `passphrase` and returns the key file contents.
    ///
    /// A fresh salt and IV are drawn for every call.
    pub fn encrypt_key(&self, key: &Key, passphrase: &[u8]) -> KeystoreResult<Vec<u8>> {
        let salt = crypto::generate_salt()?;
        let iv = crypto::generate_iv()?;
        self.seal(key, passphrase, &salt, iv)
    }

    fn seal(
        &self,
        key: &Key,
        passphrase: &[u8],
        salt: &[u8],
        iv: [u8; IV_LEN],
    ) -> KeystoreResult<Vec<u8>> {
        let derived = crypto::derive_key(passphrase, salt, self.config.scrypt)?;

        let plain_text = key.private_key_bytes();
        let cipher_text = crypto::aes_ctr_xor(derived.encrypt_key(), plain_text.as_slice(), &iv)?;
        let mac = crypto::compute_mac(derived.mac_key(), &cipher_text);

        let parts = SealedParts {
            cipher_text,
            iv,
            salt: salt.to_vec(),
            mac,
        };
        let mut envelope = format::v1::pack(key.address(), &parts);
        envelope.version = self.config.version;

        debug!(address = %key.address(), "sealed key");
        format::encode(&envelope)
    }

    /// Opens a key file produced by [`PassphraseKeyStore::encrypt_key`].
    ///
    /// # Errors
    ///
    /// - [`KeystoreError::Format`] for malformed JSON or hex
    /// - [`KeystoreError::Version`] for a version other than the configured one;
    ///   checked before anything else is decoded
    /// - [`KeystoreError::Decryption`] when the MAC does not match, i.e. a wrong
    ///   passphrase or a modified file
    pub fn decrypt_key(&self, data: &[u8], passphrase: &[u8]) -> KeystoreResult<Key> {
        let envelope = format::decode(data)?;
        if let Err(e) = envelope.check_version(self.config.version) {
            warn!(version = envelope.version, "rejecting key file with unsupported version");
            return Err(e);
        }

        let parts = envelope.unpack()?;
        let derived = crypto::derive_key(passphrase, &parts.salt, self.config.scrypt)?;

        if !crypto::verify_mac(derived.mac_key(), &parts.cipher_text, &parts.mac) {
            warn!("key file MAC mismatch");
            return Err(KeystoreError::Decryption);
        }

        let plain_text = Zeroizing::new(crypto::aes_ctr_xor(
            derived.encrypt_key(),
            &parts.cipher_text,
            &parts.iv,
        )?);
        let key = Key::from_private_key_bytes(&plain_text)?;

        match envelope.address() {
            Ok(recorded) if recorded == *key.address() => {}
            _ => warn!(
                recorded = %envelope.address,
                derived = %key.address(),
                "key file address does not match its private key"
            ),
        }

        debug!(address = %key.address(), "opened key");
        Ok(key)
    }

    /// Re-seals a key file under a new passphrase with a fresh salt and IV.
    pub fn change_passphrase(
        &self,
        data: &[u8],
        old_passphrase: &[u8],
        new_passphrase: &[u8],
    ) -> KeystoreResult<Vec<u8>> {
        let key = self.decrypt_key(data, old_passphrase)?;
        self.encrypt_key(&key, new_passphrase)
    }
}

/// [`PassphraseKeyStore::encrypt_key`] with the standard configuration.
pub fn encrypt_key(key: &Key, passphrase: &[u8]) -> KeystoreResult<Vec<u8>> {
    PassphraseKeyStore::default().encrypt_key(key, passphrase)
}

/// [`PassphraseKeyStore::decrypt_key`] with the standard configuration.
pub fn decrypt_key(data: &[u8], passphrase: &[u8]) -> KeystoreResult<Key> {
    PassphraseKeyStore::default().decrypt_key(data, passphrase)
}

pub fn default_key_dir() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("", "", "keyseal").context("could not determine platform directories")?;

    Ok(project_dirs.data_dir().join("keys"))
}

/// Storage for the key file of `address` inside `dir`.
pub fn key_file_storage(dir: PathBuf, address: &Hash) -> Storage {
    let name = format!("{}.json", hex::encode(address.as_bytes()));
    Storage::new(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/correct_horse.json");
    const FIXTURE_LIGHT: &str = include_str!("../tests/fixtures/correct_horse_light.json");

    fn light() -> PassphraseKeyStore {
        PassphraseKeyStore::new(KeystoreConfig::with_scrypt(
            ScryptParams::new(10, 8, 1).unwrap(),
        ))
    }

    fn fixture_key() -> Key {
        let scalar: Vec<u8> = (0x01..=0x20).collect();
        Key::from_private_key_bytes(&scalar).unwrap()
    }

    fn fixture_salt() -> Vec<u8> {
        (0x20..0x40).collect()
    }

    fn fixture_iv() -> [u8; IV_LEN] {
        let mut iv = [0u8; IV_LEN];
        for (i, b) in iv.iter_mut().enumerate() {
            *b = 0x40 + i as u8;
        }
        iv
    }

    #[test]
    fn seal_reproduces_fixture() {
        let sealed = light()
            .seal(&fixture_key(), b"correct horse", &fixture_salt(), fixture_iv())
            .unwrap();
        assert_eq!(String::from_utf8(sealed).unwrap(), FIXTURE_LIGHT);
    }

    #[test]
    fn seal_reproduces_fixture_with_standard_params() {
        let sealed = PassphraseKeyStore::default()
            .seal(&fixture_key(), b"correct horse", &fixture_salt(), fixture_iv())
            .unwrap();
        assert_eq!(String::from_utf8(sealed).unwrap(), FIXTURE);
    }

    #[test]
    fn fixture_opens_with_correct_passphrase_only() {
        let ks = PassphraseKeyStore::default();

        let key = ks.decrypt_key(FIXTURE.as_bytes(), b"correct horse").unwrap();
        assert_eq!(key, fixture_key());
        assert_eq!(
            key.address().to_hex(),
            "0x776aa29402e64b15661e0b8e6370ef2f4db3611d657b90667de398a2cc2a370c"
        );

        assert_eq!(
            ks.decrypt_key(FIXTURE.as_bytes(), b"wrong horse").unwrap_err(),
            KeystoreError::Decryption
        );
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let ks = light();
        let key = Key::generate().unwrap();

        let sealed = ks.encrypt_key(&key, b"pw").unwrap();
        let opened = ks.decrypt_key(&sealed, b"pw").unwrap();

        assert_eq!(opened, key);
    }

    #[test]
    fn each_encryption_uses_fresh_salt_and_iv() {
        let ks = light();
        let key = fixture_key();

        let a = format::decode(&ks.encrypt_key(&key, b"pw").unwrap()).unwrap();
        let b = format::decode(&ks.encrypt_key(&key, b"pw").unwrap()).unwrap();

        assert_ne!(a.crypto.salt, b.crypto.salt);
        assert_ne!(a.crypto.cipher_iv, b.crypto.cipher_iv);
        assert_ne!(a.crypto.cipher_text, b.crypto.cipher_text);
        assert_eq!(a.address, b.address);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let ks = light();
        let sealed = ks.encrypt_key(&fixture_key(), b"correct").unwrap();
        assert_eq!(
            ks.decrypt_key(&sealed, b"wrong").unwrap_err(),
            KeystoreError::Decryption
        );
    }

    #[test]
    fn empty_passphrase_round_trips() {
        let ks = light();
        let sealed = ks.encrypt_key(&fixture_key(), b"").unwrap();
        assert_eq!(ks.decrypt_key(&sealed, b"").unwrap(), fixture_key());
        assert!(ks.decrypt_key(&sealed, b" ").is_err());
    }

    #[test]
    fn unsupported_version_is_rejected_before_hex_decoding() {
        let mut env = format::decode(FIXTURE_LIGHT.as_bytes()).unwrap();
        env.version = 3;
        env.crypto.mac = "not hex at all".to_string();
        env.crypto.salt = "nor this".to_string();

        let data = format::encode(&env).unwrap();
        assert_eq!(
            light().decrypt_key(&data, b"correct horse").unwrap_err(),
            KeystoreError::Version(3)
        );
    }

    #[test]
    fn malformed_hex_is_a_format_error() {
        let env = format::decode(FIXTURE_LIGHT.as_bytes()).unwrap();

        for field in 0..4 {
            let mut bad = env.clone();
            match field {
                0 => bad.crypto.cipher_text.replace_range(0..2, "zz"),
                1 => bad.crypto.cipher_iv.replace_range(0..2, "zz"),
                2 => bad.crypto.salt.replace_range(0..2, "zz"),
                _ => bad.crypto.mac.replace_range(0..2, "zz"),
            }
            let data = format::encode(&bad).unwrap();
            assert!(matches!(
                light().decrypt_key(&data, b"correct horse"),
                Err(KeystoreError::Format(_))
            ));
        }
    }

    #[test]
    fn change_passphrase_reseals() {
        let ks = light();
        let sealed = FIXTURE_LIGHT.as_bytes();

        let resealed = ks
            .change_passphrase(sealed, b"correct horse", b"battery staple")
            .unwrap();

        assert_eq!(ks.decrypt_key(&resealed, b"battery staple").unwrap(), fixture_key());
        assert!(ks.decrypt_key(&resealed, b"correct horse").is_err());
        assert!(ks.change_passphrase(sealed, b"wrong", b"x").is_err());
    }

    #[test]
    fn key_file_storage_names_file_after_address() {
        let storage = key_file_storage(PathBuf::from("/keys"), fixture_key().address());
        assert_eq!(
            storage.path(),
            &PathBuf::from(
                "/keys/776aa29402e64b15661e0b8e6370ef2f4db3611d657b90667de398a2cc2a370c.json"
            )
        );
    }
}
