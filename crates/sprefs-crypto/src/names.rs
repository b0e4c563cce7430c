//! Storage key obfuscation
//!
//! Keys must map to the same storage slot on every run, so they are hashed
//! rather than encrypted: SHA-256 of the UTF-8 key, standard base64. No secret
//! is involved; the point is only that the stored key name does not reveal the
//! logical one.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

/// Length of every obfuscated key (base64 of a 32-byte digest)
pub const OBFUSCATED_KEY_LEN: usize = 44;

/// Map a logical preference key to its storage key.
pub fn obfuscate_key(logical_key: &str) -> String {
    let digest = Sha256::digest(logical_key.as_bytes());
    STANDARD.encode(digest)
}
