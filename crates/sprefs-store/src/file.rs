//! JSON file provider.
//!
//! The whole store is held in memory and written out as one JSON object
//! (storage key → string or array of strings). Every write goes to a temp
//! file first and is renamed over the real one, so a crash leaves either the
//! old or the new contents on disk, never a mix.
//!
//! `commit` persists before returning; `apply` updates memory immediately and
//! persists on a background thread. Each persisted snapshot carries a
//! generation number so a slow background write can never overwrite a newer
//! snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use sprefs_core::{SprefsError, SprefsResult};

use crate::provider::{
    lock, read, write, Batch, ChangeListener, ListenerRegistry, StorageProvider, Value,
};

/// File-backed [`StorageProvider`].
pub struct JsonFileProvider {
    state: RwLock<FileState>,
    persister: Arc<Persister>,
    listeners: ListenerRegistry,
}

struct FileState {
    entries: BTreeMap<String, Value>,
    /// Bumped on every mutation
    generation: u64,
}

struct Persister {
    path: PathBuf,
    /// Generation of the snapshot currently on disk
    written: Mutex<u64>,
}

impl JsonFileProvider {
    /// Open the store at `path`. A missing file starts an empty store.
    pub fn open(path: &Path) -> SprefsResult<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                SprefsError::Storage(format!("reading store {}: {e}", path.display()))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                SprefsError::Storage(format!("parsing store {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened store");

        Ok(Self {
            state: RwLock::new(FileState {
                entries,
                generation: 0,
            }),
            persister: Arc::new(Persister {
                path: path.to_path_buf(),
                written: Mutex::new(0),
            }),
            listeners: ListenerRegistry::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.persister.path
    }

    /// Write the current in-memory state to disk if anything is pending.
    pub fn flush(&self) -> SprefsResult<()> {
        let state = read(&self.state);
        let json = serde_json::to_string_pretty(&state.entries)?;
        self.persister.persist(state.generation, &json)
    }

    fn is_dirty(&self) -> bool {
        let generation = read(&self.state).generation;
        *lock(&self.persister.written) < generation
    }
}

impl Persister {
    fn persist(&self, generation: u64, json: &str) -> SprefsResult<()> {
        let mut written = lock(&self.written);
        if *written >= generation {
            // a newer (or this very) snapshot is already on disk
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SprefsError::Storage(format!("creating store dir {}: {e}", parent.display()))
                })?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json).map_err(|e| {
            SprefsError::Storage(format!("writing store temp {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            SprefsError::Storage(format!("renaming store {}: {e}", self.path.display()))
        })?;

        *written = generation;
        Ok(())
    }
}

impl StorageProvider for JsonFileProvider {
    fn get(&self, key: &str) -> Option<Value> {
        read(&self.state).entries.get(key).cloned()
    }

    fn get_all(&self) -> BTreeMap<String, Value> {
        read(&self.state).entries.clone()
    }

    fn contains(&self, key: &str) -> bool {
        read(&self.state).entries.contains_key(key)
    }

    fn commit(&self, batch: Batch) -> SprefsResult<()> {
        let changes = {
            let mut state = write(&self.state);
            let mut next = state.entries.clone();
            let changes = batch.apply_to(&mut next);
            let generation = state.generation + 1;

            let json = serde_json::to_string_pretty(&next)?;
            self.persister.persist(generation, &json)?;

            state.entries = next;
            state.generation = generation;
            changes
        };
        self.listeners.notify(&changes);
        Ok(())
    }

    fn apply(&self, batch: Batch) {
        let (generation, json, changes) = {
            let mut state = write(&self.state);
            let changes = batch.apply_to(&mut state.entries);
            state.generation += 1;
            let json = serde_json::to_string_pretty(&state.entries);
            (state.generation, json, changes)
        };
        self.listeners.notify(&changes);

        let json = match json {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "serializing store for background write failed");
                return;
            }
        };

        let persister = Arc::clone(&self.persister);
        std::thread::spawn(move || {
            if let Err(e) = persister.persist(generation, &json) {
                tracing::warn!(error = %e, "background store write failed");
            }
        });
    }

    fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.subscribe(listener);
    }

    fn unsubscribe(&self, listener: &Arc<dyn ChangeListener>) {
        self.listeners.unsubscribe(listener);
    }
}

impl Drop for JsonFileProvider {
    fn drop(&mut self) {
        if self.is_dirty() {
            if let Err(e) = self.flush() {
                tracing::warn!("failed to flush store on drop: {e}");
            }
        }
    }
}
