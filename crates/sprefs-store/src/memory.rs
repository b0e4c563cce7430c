//! In-process provider, nothing persisted.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use sprefs_core::SprefsResult;

use crate::provider::{read, write, Batch, ChangeListener, ListenerRegistry, StorageProvider, Value};

/// Thread-safe in-memory [`StorageProvider`].
#[derive(Default)]
pub struct MemoryProvider {
    entries: RwLock<BTreeMap<String, Value>>,
    listeners: ListenerRegistry,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a raw entry, bypassing batches and listeners.
    ///
    /// Meant for tests that need to corrupt stored data.
    pub fn insert_raw(&self, key: impl Into<String>, value: Value) {
        write(&self.entries).insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageProvider for MemoryProvider {
    fn get(&self, key: &str) -> Option<Value> {
        read(&self.entries).get(key).cloned()
    }

    fn get_all(&self) -> BTreeMap<String, Value> {
        read(&self.entries).clone()
    }

    fn contains(&self, key: &str) -> bool {
        read(&self.entries).contains_key(key)
    }

    fn commit(&self, batch: Batch) -> SprefsResult<()> {
        let changes = batch.apply_to(&mut write(&self.entries));
        self.listeners.notify(&changes);
        Ok(())
    }

    fn apply(&self, batch: Batch) {
        if let Err(e) = self.commit(batch) {
            tracing::warn!(error = %e, "in-memory apply failed");
        }
    }

    fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.subscribe(listener);
    }

    fn unsubscribe(&self, listener: &Arc<dyn ChangeListener>) {
        self.listeners.unsubscribe(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StoreChange;
    use std::sync::Mutex;
    use std::thread;

    #[test]
    fn test_commit_get_contains() {
        let provider = MemoryProvider::new();
        let mut batch = Batch::new();
        batch.put("k", Value::Text("v".into()));
        provider.commit(batch).unwrap();

        assert!(provider.contains("k"));
        assert_eq!(provider.get("k"), Some(Value::Text("v".into())));
        assert!(provider.get("missing").is_none());
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_listener_sees_batch_changes() {
        let provider = MemoryProvider::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        provider.subscribe(Arc::new(move |c: &StoreChange| {
            sink.lock().unwrap().push(c.clone());
        }));

        let mut batch = Batch::new();
        batch.put("a", Value::Text("1".into()));
        batch.remove("a");
        provider.apply(batch);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![StoreChange::Updated("a".into()), StoreChange::Removed("a".into())]
        );
    }

    #[test]
    fn test_concurrent_commits() {
        let provider = Arc::new(MemoryProvider::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let p = Arc::clone(&provider);
                thread::spawn(move || {
                    for i in 0..50 {
                        let mut batch = Batch::new();
                        batch.put(format!("{t}-{i}"), Value::Text(i.to_string()));
                        p.commit(batch).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(provider.len(), 400);
    }
}
