use thiserror::Error;

pub type SprefsResult<T> = Result<T, SprefsError>;

#[derive(Debug, Error)]
pub enum SprefsError {
    /// Bad passphrase, salt, or KDF parameters. Fatal at store construction.
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
