//! sprefs-crypto: value encryption for the sprefs secure key-value store
//!
//! Architecture: Encrypt-then-MAC with AES-256-CBC and HMAC-SHA256
//!
//! Pipeline (write): plaintext → AES-256-CBC (random IV) → HMAC-SHA256(IV || ct) → base64 record
//!
//! Key hierarchy:
//! ```text
//! Passphrase + salt
//!   └── Argon2id → 64 bytes of key material
//!         ├── cipher key = okm[0..32]   (AES-256-CBC)
//!         └── mac key    = okm[32..64]  (HMAC-SHA256 over IV || ciphertext)
//! ```
//!
//! Storage keys are not encrypted, only hashed: SHA-256 of the logical key,
//! base64-encoded, so the same logical key always lands in the same slot.

pub mod cipher;
pub mod encoding;
pub mod error;
pub mod kdf;
pub mod names;
pub mod salt;

pub use cipher::{decrypt, decrypt_str, encrypt, encrypt_str, CipherRecord};
pub use encoding::{decode, encode};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_key_pair, KdfParams, SecretKeyPair};
pub use names::obfuscate_key;
pub use salt::{device_salt, resolve_device_id, FALLBACK_DEVICE_ID};

/// Size of each derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// AES block size, which is also the IV size for CBC
pub const BLOCK_SIZE: usize = 16;

/// Size of a CBC initialization vector
pub const IV_SIZE: usize = BLOCK_SIZE;

/// Size of an HMAC-SHA256 tag
pub const MAC_SIZE: usize = 32;

/// Shortest salt the KDF accepts
pub const MIN_SALT_LEN: usize = 8;
