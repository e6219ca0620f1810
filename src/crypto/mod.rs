//! Cryptographic primitives for the key store.
//!
//! Provides key derivation, the stream cipher, the MAC and random
//! salt/IV generation.

pub mod kdf;
pub mod mac;
pub mod random;
pub mod stream;

pub use kdf::{DerivedKey, ScryptParams, derive_key};
pub use mac::{compute_mac, verify_mac};
pub use random::{generate_iv, generate_salt, secure_random};
pub use stream::aes_ctr_xor;

/// Length of the salt (32 bytes).
pub const SALT_LEN: usize = 32;
/// Length of the IV (one AES block).
pub const IV_LEN: usize = 16;
/// Length of the derived key (32 bytes / 256 bits).
pub const DERIVED_KEY_LEN: usize = 32;
/// Length of the AES-128 key taken from the front of the derived key.
pub const ENCRYPT_KEY_LEN: usize = 16;
/// Length of the MAC key taken from the back of the derived key.
pub const MAC_KEY_LEN: usize = DERIVED_KEY_LEN - ENCRYPT_KEY_LEN;
