use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SprefsError, SprefsResult};

/// Top-level configuration (loaded from sprefs.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SprefsConfig {
    pub store: StoreConfig,
    pub crypto: CryptoConfig,
    pub salt: SaltConfig,
    pub log: LogConfig,
}

impl SprefsConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> SprefsResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SprefsError::Config(format!("parsing {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding the encrypted entries
    pub path: PathBuf,
}

/// Argon2id cost parameters.
///
/// These are part of the on-disk contract: a store must be reopened with the
/// parameters it was written with, or every entry reads back as the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub argon2_time_cost: u32,
    /// Parallelism (default: 4)
    pub argon2_parallelism: u32,
}

/// Where the key-derivation salt comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltConfig {
    /// Explicit installation identifier; overrides `machine_id_file`
    pub device_id: Option<String>,
    /// File holding a stable machine identifier (default: /etc/machine-id)
    pub machine_id_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sprefs.json"),
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for SaltConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            machine_id_file: PathBuf::from("/etc/machine-id"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}
