//! Key derivation: Argon2id passphrase + salt → cipher key and MAC key

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use sprefs_core::config::CryptoConfig;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::{KEY_SIZE, MIN_SALT_LEN};

/// The two 256-bit keys a secure store works with.
///
/// Derived once per store, never persisted, zeroized on drop.
#[derive(Clone)]
pub struct SecretKeyPair {
    cipher_key: [u8; KEY_SIZE],
    mac_key: [u8; KEY_SIZE],
}

impl SecretKeyPair {
    pub fn from_bytes(cipher_key: [u8; KEY_SIZE], mac_key: [u8; KEY_SIZE]) -> Self {
        Self {
            cipher_key,
            mac_key,
        }
    }

    /// AES-256 key (confidentiality)
    pub fn cipher_key(&self) -> &[u8; KEY_SIZE] {
        &self.cipher_key
    }

    /// HMAC-SHA256 key (integrity)
    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_key
    }
}

impl Drop for SecretKeyPair {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
        self.mac_key.zeroize();
    }
}

impl std::fmt::Debug for SecretKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeyPair")
            .field("cipher_key", &"[REDACTED]")
            .field("mac_key", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters for KDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl From<&CryptoConfig> for KdfParams {
    fn from(cfg: &CryptoConfig) -> Self {
        Self {
            mem_cost_kib: cfg.argon2_mem_cost_kib,
            time_cost: cfg.argon2_time_cost,
            parallelism: cfg.argon2_parallelism,
        }
    }
}

/// Derive the cipher/MAC key pair from a passphrase and salt using Argon2id.
///
/// A single Argon2id pass produces 64 bytes: the first 32 become the AES key,
/// the last 32 the HMAC key. Identical inputs always give identical keys, so
/// the salt must be stable for the lifetime of the store.
pub fn derive_key_pair(
    passphrase: &SecretString,
    salt: &[u8],
    params: &KdfParams,
) -> CryptoResult<SecretKeyPair> {
    let secret = passphrase.expose_secret();
    if secret.is_empty() {
        return Err(CryptoError::KeyDerivation("passphrase is empty".into()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: {} bytes (minimum {MIN_SALT_LEN})",
            salt.len()
        )));
    }

    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(2 * KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut okm = [0u8; 2 * KEY_SIZE];
    argon2
        .hash_password_into(secret.as_bytes(), salt, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("Argon2id KDF failed: {e}")))?;

    let mut cipher_key = [0u8; KEY_SIZE];
    let mut mac_key = [0u8; KEY_SIZE];
    cipher_key.copy_from_slice(&okm[..KEY_SIZE]);
    mac_key.copy_from_slice(&okm[KEY_SIZE..]);
    okm.zeroize();

    tracing::debug!(
        mem_cost_kib = params.mem_cost_kib,
        time_cost = params.time_cost,
        "derived store key pair"
    );

    Ok(SecretKeyPair::from_bytes(cipher_key, mac_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn fast_params() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        let passphrase = SecretString::from("test-passphrase-123");
        let salt = [1u8; 16];

        let k1 = derive_key_pair(&passphrase, &salt, &fast_params()).unwrap();
        let k2 = derive_key_pair(&passphrase, &salt, &fast_params()).unwrap();

        assert_eq!(k1.cipher_key(), k2.cipher_key(), "KDF must be deterministic");
        assert_eq!(k1.mac_key(), k2.mac_key(), "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_keys_are_independent_halves() {
        let keys =
            derive_key_pair(&SecretString::from("split-me"), &[7u8; 8], &fast_params()).unwrap();
        assert_ne!(keys.cipher_key(), keys.mac_key());
    }

    #[test]
    fn test_kdf_different_passphrases() {
        let salt = [1u8; 16];

        let k1 = derive_key_pair(&SecretString::from("passphrase-a"), &salt, &fast_params()).unwrap();
        let k2 = derive_key_pair(&SecretString::from("passphrase-b"), &salt, &fast_params()).unwrap();

        assert_ne!(
            k1.cipher_key(),
            k2.cipher_key(),
            "different passphrases must produce different keys"
        );
    }

    #[test]
    fn test_kdf_different_salts() {
        let passphrase = SecretString::from("same-passphrase");

        let k1 = derive_key_pair(&passphrase, &[1u8; 16], &fast_params()).unwrap();
        let k2 = derive_key_pair(&passphrase, &[2u8; 16], &fast_params()).unwrap();

        assert_ne!(
            k1.mac_key(),
            k2.mac_key(),
            "different salts must produce different keys"
        );
    }

    #[test]
    fn test_kdf_rejects_empty_passphrase() {
        let result = derive_key_pair(&SecretString::from(""), &[1u8; 16], &fast_params());
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_kdf_rejects_short_salt() {
        let result = derive_key_pair(&SecretString::from("pw"), &[1u8; 7], &fast_params());
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_kdf_rejects_invalid_params() {
        let params = KdfParams {
            mem_cost_kib: 1024,
            time_cost: 0,
            parallelism: 1,
        };
        let result = derive_key_pair(&SecretString::from("pw"), &[1u8; 16], &params);
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_params_from_config() {
        let params = KdfParams::from(&CryptoConfig::default());
        assert_eq!(params, KdfParams::default());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let keys = SecretKeyPair::from_bytes([0xAB; KEY_SIZE], [0xCD; KEY_SIZE]);
        let rendered = format!("{keys:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("171"));
    }
}
