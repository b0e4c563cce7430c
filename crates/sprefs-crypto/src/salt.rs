//! Salt sourcing for the key derivation.
//!
//! The salt has to stay the same for the whole life of a store; a different
//! salt derives different keys and every stored entry becomes unreadable.
//! It is derived from a stable per-installation identifier. When no identifier
//! can be found the fixed [`FALLBACK_DEVICE_ID`] is used instead, which keeps
//! the store working but makes the salt identical across installations.

use sha2::{Digest, Sha256};
use sprefs_core::config::SaltConfig;
use std::path::Path;

/// Identifier used when no device identifier is available.
pub const FALLBACK_DEVICE_ID: &str = "SPREFS-NO-DEVICE-ID";

/// Length of a derived salt
pub const SALT_LEN: usize = 16;

const SALT_DOMAIN: &[u8] = b"sprefs-salt-v1";

/// Derive a 16-byte salt from a device identifier.
///
/// `None` or a blank identifier falls back to [`FALLBACK_DEVICE_ID`].
pub fn device_salt(device_id: Option<&str>) -> [u8; SALT_LEN] {
    let id = match device_id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => {
            tracing::warn!("no device identifier available, using the fixed fallback salt");
            FALLBACK_DEVICE_ID
        }
    };

    let mut hasher = Sha256::new();
    hasher.update(SALT_DOMAIN);
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    salt
}

/// Find a stable identifier for this installation.
///
/// Order: explicit `device_id` from config, then the machine-id file, then the
/// hostname. Returns `None` when all of them are missing or blank.
pub fn resolve_device_id(cfg: &SaltConfig) -> Option<String> {
    if let Some(id) = non_blank(cfg.device_id.as_deref()) {
        return Some(id);
    }
    if let Some(id) = read_machine_id(&cfg.machine_id_file) {
        return Some(id);
    }
    match hostname::get() {
        Ok(name) => non_blank(name.to_str()),
        Err(e) => {
            tracing::debug!(error = %e, "hostname lookup failed");
            None
        }
    }
}

fn read_machine_id(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => non_blank(Some(&content)),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "machine id unavailable");
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
