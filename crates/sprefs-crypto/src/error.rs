use sprefs_core::SprefsError;
use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures of the cryptographic primitives.
///
/// Only `KeyDerivation` is meant to reach callers of the secure store; the
/// others are recovered at the store boundary and read back as "no value".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("malformed encoded value: {0}")]
    Format(String),

    /// MAC mismatch. Also what a wrong key looks like.
    #[error("integrity check failed: wrong key or tampered data")]
    Integrity,

    #[error("cipher failure: {0}")]
    Cipher(String),
}

impl From<CryptoError> for SprefsError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyDerivation(msg) => SprefsError::KeyDerivation(msg),
            other => SprefsError::Crypto(other.to_string()),
        }
    }
}
