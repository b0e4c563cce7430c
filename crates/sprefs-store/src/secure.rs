//! The encrypting facade over a [`StorageProvider`].
//!
//! Reads never fail: a missing entry, a malformed record, a MAC mismatch or a
//! value of the wrong type all come back as the caller's default. The cause is
//! logged against the obfuscated key, never with plaintext.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use secrecy::SecretString;
use sprefs_core::SprefsResult;
use sprefs_crypto::{
    decode, decrypt_str, derive_key_pair, encode, encrypt_str, obfuscate_key, CryptoResult,
    KdfParams, SecretKeyPair,
};

use crate::provider::{Batch, ChangeListener, StorageProvider, Value};
use crate::value::PrefValue;

/// Typed, encrypted key-value store on top of a provider.
pub struct SecurePreferences<P> {
    provider: P,
    keys: SecretKeyPair,
}

impl<P: StorageProvider> SecurePreferences<P> {
    /// Derive the store keys from `passphrase` and `salt` and wrap `provider`.
    ///
    /// Fails only on bad key-derivation input: an empty passphrase, a salt
    /// shorter than 8 bytes, or invalid Argon2id parameters.
    pub fn new(
        provider: P,
        passphrase: &SecretString,
        salt: &[u8],
        params: &KdfParams,
    ) -> SprefsResult<Self> {
        let keys = derive_key_pair(passphrase, salt, params)?;
        Ok(Self::with_keys(provider, keys))
    }

    /// Wrap `provider` with an already derived key pair.
    pub fn with_keys(provider: P, keys: SecretKeyPair) -> Self {
        Self { provider, keys }
    }

    /// The underlying provider, holding only obfuscated keys and encoded values.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Read a typed value, or `default` if it is missing or unreadable.
    pub fn get<T: PrefValue>(&self, key: &str, default: T) -> T {
        self.get_opt(key).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str, default: Option<&str>) -> Option<String> {
        self.get_opt::<String>(key)
            .or_else(|| default.map(str::to_string))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key, default)
    }

    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.get(key, default)
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.get(key, default)
    }

    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.get(key, default)
    }

    /// Read a string set.
    ///
    /// A missing entry returns `defaults`. Elements that fail to decrypt come
    /// back as the empty string rather than being dropped, so a damaged set
    /// is visible to the caller instead of silently shrinking.
    pub fn get_string_set(&self, key: &str, defaults: BTreeSet<String>) -> BTreeSet<String> {
        let storage_key = obfuscate_key(key);
        match self.provider.get(&storage_key) {
            Some(Value::Set(encoded)) => encoded
                .iter()
                .map(|element| self.decrypt_or_empty(&storage_key, element))
                .collect(),
            Some(Value::Text(_)) => {
                tracing::debug!(key = %storage_key, "entry holds a single value, not a set");
                defaults
            }
            None => defaults,
        }
    }

    /// Every entry, decrypted, keyed by its obfuscated storage key.
    ///
    /// Logical key names cannot be recovered from the hash. Undecryptable
    /// values are reported as the empty string.
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        self.provider
            .get_all()
            .into_iter()
            .map(|(storage_key, stored)| {
                let decrypted = match &stored {
                    Value::Text(encoded) => {
                        Value::Text(self.decrypt_or_empty(&storage_key, encoded))
                    }
                    Value::Set(encoded) => Value::Set(
                        encoded
                            .iter()
                            .map(|element| self.decrypt_or_empty(&storage_key, element))
                            .collect(),
                    ),
                };
                (storage_key, decrypted)
            })
            .collect()
    }

    /// Whether `key` has an entry. Does not check that it decrypts.
    pub fn contains(&self, key: &str) -> bool {
        self.provider.contains(&obfuscate_key(key))
    }

    /// Start a batch of writes.
    pub fn edit(&self) -> Editor<'_, P> {
        Editor {
            prefs: self,
            batch: Batch::new(),
            failed: false,
        }
    }

    /// Forwarded to the provider. Notifications carry obfuscated keys.
    pub fn register_change_listener(&self, listener: Arc<dyn ChangeListener>) {
        self.provider.subscribe(listener);
    }

    pub fn unregister_change_listener(&self, listener: &Arc<dyn ChangeListener>) {
        self.provider.unsubscribe(listener);
    }

    /// Read a typed value; `None` covers missing, unreadable and mistyped alike.
    pub fn get_opt<T: PrefValue>(&self, key: &str) -> Option<T> {
        let storage_key = obfuscate_key(key);
        let stored = self.provider.get(&storage_key)?;
        let Some(encoded) = stored.as_text() else {
            tracing::debug!(key = %storage_key, "entry holds a set, not a single value");
            return None;
        };

        let text = match self.decrypt_value(encoded) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(key = %storage_key, error = %e, "unreadable entry, using default");
                return None;
            }
        };

        match T::from_pref_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key = %storage_key, error = %e, "type mismatch, using default");
                None
            }
        }
    }

    fn decrypt_value(&self, encoded: &str) -> CryptoResult<String> {
        decrypt_str(&decode(encoded)?, &self.keys)
    }

    fn decrypt_or_empty(&self, storage_key: &str, encoded: &str) -> String {
        self.decrypt_value(encoded).unwrap_or_else(|e| {
            tracing::warn!(key = %storage_key, error = %e, "unreadable value, reporting empty string");
            String::new()
        })
    }

    fn encrypt_value(&self, plaintext: &str) -> CryptoResult<String> {
        Ok(encode(&encrypt_str(plaintext, &self.keys)?))
    }
}

/// Staged writes against a [`SecurePreferences`].
///
/// Nothing reaches the provider until [`apply`](Editor::apply) or
/// [`commit`](Editor::commit). A staged [`clear`](Editor::clear) runs before
/// every put, regardless of call order.
#[must_use = "an editor does nothing until apply() or commit() is called"]
pub struct Editor<'a, P> {
    prefs: &'a SecurePreferences<P>,
    batch: Batch,
    /// Set when a value could not be encrypted; commit then reports failure
    failed: bool,
}

impl<P: StorageProvider> Editor<'_, P> {
    pub fn put<T: PrefValue>(self, key: &str, value: T) -> Self {
        self.put_text(obfuscate_key(key), &value.to_pref_string())
    }

    pub fn put_string(self, key: &str, value: &str) -> Self {
        self.put_text(obfuscate_key(key), value)
    }

    pub fn put_bool(self, key: &str, value: bool) -> Self {
        self.put(key, value)
    }

    pub fn put_i32(self, key: &str, value: i32) -> Self {
        self.put(key, value)
    }

    pub fn put_i64(self, key: &str, value: i64) -> Self {
        self.put(key, value)
    }

    pub fn put_f32(self, key: &str, value: f32) -> Self {
        self.put(key, value)
    }

    /// Store a set; each element is encrypted on its own.
    pub fn put_string_set<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let storage_key = obfuscate_key(key);
        let mut encoded = BTreeSet::new();
        for value in values {
            match self.prefs.encrypt_value(value.as_ref()) {
                Ok(element) => {
                    encoded.insert(element);
                }
                Err(e) => {
                    tracing::error!(key = %storage_key, error = %e, "could not encrypt set element");
                    self.failed = true;
                    return self;
                }
            }
        }
        self.batch.put(storage_key, Value::Set(encoded));
        self
    }

    /// Store an encrypted value under `storage_key` exactly as given, without
    /// hashing it. Only [`SecurePreferences::get_all`] can read it back.
    pub fn put_string_raw_key(self, storage_key: &str, value: &str) -> Self {
        self.put_text(storage_key.to_string(), value)
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.batch.remove(obfuscate_key(key));
        self
    }

    /// Remove every entry, including ones this editor did not write.
    pub fn clear(mut self) -> Self {
        self.batch.clear();
        self
    }

    /// Hand the batch to the provider without waiting for it to be durable.
    pub fn apply(self) {
        if self.failed {
            tracing::error!("discarding batch with unencryptable values");
            return;
        }
        self.prefs.provider.apply(self.batch);
    }

    /// Write the batch and wait for it to be durable. Returns `false` on failure.
    pub fn commit(self) -> bool {
        if self.failed {
            tracing::error!("discarding batch with unencryptable values");
            return false;
        }
        match self.prefs.provider.commit(self.batch) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "commit failed");
                false
            }
        }
    }

    fn put_text(mut self, storage_key: String, plaintext: &str) -> Self {
        match self.prefs.encrypt_value(plaintext) {
            Ok(encoded) => self.batch.put(storage_key, Value::Text(encoded)),
            Err(e) => {
                tracing::error!(key = %storage_key, error = %e, "could not encrypt value");
                self.failed = true;
            }
        }
        self
    }
}
