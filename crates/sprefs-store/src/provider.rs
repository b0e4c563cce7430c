//! Storage provider contract.
//!
//! A provider is a plain string-keyed store: it never sees plaintext keys or
//! values, only the obfuscated keys and encoded records the secure layer hands
//! it. Writes arrive as a [`Batch`] that is applied atomically; the provider
//! owns the change-listener registry and notifies after each batch lands.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sprefs_core::SprefsResult;

/// A stored value: a single string or a set of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Set(BTreeSet<String>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Set(_) => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Value::Set(set) => Some(set),
            Value::Text(_) => None,
        }
    }
}

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: String, value: Value },
    Remove { key: String },
}

/// A set of writes applied together.
///
/// A staged clear always runs first, then the put/remove operations in the
/// order they were staged, so `clear` + `put` leaves exactly the new entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    clear: bool,
    ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value,
        });
    }

    pub fn remove(&mut self, key: impl Into<String>) {
        self.ops.push(BatchOp::Remove { key: key.into() });
    }

    pub fn clear(&mut self) {
        self.clear = true;
    }

    pub fn clears(&self) -> bool {
        self.clear
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        !self.clear && self.ops.is_empty()
    }

    /// Apply the batch to an entry map, returning the resulting changes.
    pub fn apply_to(&self, entries: &mut BTreeMap<String, Value>) -> Vec<StoreChange> {
        let mut changes = Vec::with_capacity(self.ops.len() + 1);
        if self.clear {
            entries.clear();
            changes.push(StoreChange::Cleared);
        }
        for op in &self.ops {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                    changes.push(StoreChange::Updated(key.clone()));
                }
                BatchOp::Remove { key } => {
                    if entries.remove(key).is_some() {
                        changes.push(StoreChange::Removed(key.clone()));
                    }
                }
            }
        }
        changes
    }
}

/// A change notification. Keys are storage keys, i.e. obfuscated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Updated(String),
    Removed(String),
    Cleared,
}

/// Receives change notifications from a provider.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, change: &StoreChange);
}

impl<F> ChangeListener for F
where
    F: Fn(&StoreChange) + Send + Sync,
{
    fn on_change(&self, change: &StoreChange) {
        self(change)
    }
}

/// Subscriber set owned by a provider.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn ChangeListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Subscribing the same `Arc` twice is a no-op.
    pub fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        let mut listeners = lock(&self.listeners);
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove a listener previously passed to [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, listener: &Arc<dyn ChangeListener>) {
        lock(&self.listeners).retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver changes to every listener.
    ///
    /// Listeners are called outside the registry lock, so they may
    /// subscribe or unsubscribe from within the callback.
    pub fn notify(&self, changes: &[StoreChange]) {
        if changes.is_empty() {
            return;
        }
        let snapshot: Vec<Arc<dyn ChangeListener>> = lock(&self.listeners).clone();
        for change in changes {
            for listener in &snapshot {
                listener.on_change(change);
            }
        }
    }
}

/// What the secure layer needs from an underlying key-value store.
pub trait StorageProvider: Send + Sync {
    /// Look up a single entry.
    fn get(&self, key: &str) -> Option<Value>;
    /// Snapshot of every entry.
    fn get_all(&self) -> BTreeMap<String, Value>;
    /// Whether an entry exists.
    fn contains(&self, key: &str) -> bool;
    /// Apply a batch and make it durable before returning.
    fn commit(&self, batch: Batch) -> SprefsResult<()>;
    /// Apply a batch; durability happens in the background and failures are only logged.
    fn apply(&self, batch: Batch);
    /// Register a change listener.
    fn subscribe(&self, listener: Arc<dyn ChangeListener>);
    /// Unregister a change listener.
    fn unsubscribe(&self, listener: &Arc<dyn ChangeListener>);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
